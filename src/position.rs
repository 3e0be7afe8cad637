use serde::{Deserialize, Serialize};

/// Default margin in pixels between an anchored watermark and the image edge.
pub const DEFAULT_MARGIN: u32 = 10;

/// One of the nine named positions on the 3x3 placement grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl Anchor {
    pub const ALL: [Anchor; 9] = [
        Anchor::TopLeft,
        Anchor::TopCenter,
        Anchor::TopRight,
        Anchor::CenterLeft,
        Anchor::Center,
        Anchor::CenterRight,
        Anchor::BottomLeft,
        Anchor::BottomCenter,
        Anchor::BottomRight,
    ];

    fn touches_left(&self) -> bool {
        matches!(self, Anchor::TopLeft | Anchor::CenterLeft | Anchor::BottomLeft)
    }

    fn touches_right(&self) -> bool {
        matches!(self, Anchor::TopRight | Anchor::CenterRight | Anchor::BottomRight)
    }

    fn touches_top(&self) -> bool {
        matches!(self, Anchor::TopLeft | Anchor::TopCenter | Anchor::TopRight)
    }

    fn touches_bottom(&self) -> bool {
        matches!(self, Anchor::BottomLeft | Anchor::BottomCenter | Anchor::BottomRight)
    }
}

/// Watermark placement: a named anchor, or a drag-defined custom position
/// stored as fractions of the available placement span.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Position {
    Anchor(Anchor),
    Custom { fx: f64, fy: f64 },
}

impl Default for Position {
    fn default() -> Self {
        Position::Anchor(Anchor::BottomRight)
    }
}

/// Resolve the top-left pixel coordinate for an overlay of `overlay_size`
/// placed on an image of `image_size`.
///
/// Anchored placement applies `margin` on the touching edges only; center
/// axes use the integer-floor midpoint. Custom placement maps the stored
/// fractions against the available span (image dimension minus overlay
/// dimension); fractions outside [0,1] are clamped, not rejected.
///
/// The result is always clamped to `[0, dim - overlay_dim]` per axis, so the
/// overlay never exits image bounds (an overlay larger than the image pins
/// to 0).
pub fn resolve(
    image_size: (u32, u32),
    overlay_size: (u32, u32),
    position: &Position,
    margin: u32,
) -> (u32, u32) {
    let (w, h) = (image_size.0 as i64, image_size.1 as i64);
    let (tw, th) = (overlay_size.0 as i64, overlay_size.1 as i64);
    let span_x = (w - tw).max(0);
    let span_y = (h - th).max(0);

    let (x, y) = match position {
        Position::Anchor(anchor) => {
            let margin = margin as i64;
            let x = if anchor.touches_left() {
                margin
            } else if anchor.touches_right() {
                w - tw - margin
            } else {
                (w - tw) / 2
            };
            let y = if anchor.touches_top() {
                margin
            } else if anchor.touches_bottom() {
                h - th - margin
            } else {
                (h - th) / 2
            };
            (x, y)
        }
        Position::Custom { fx, fy } => {
            let x = (fx.clamp(0.0, 1.0) * span_x as f64) as i64;
            let y = (fy.clamp(0.0, 1.0) * span_y as f64) as i64;
            (x, y)
        }
    };

    (x.clamp(0, span_x) as u32, y.clamp(0, span_y) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_corners_and_edges() {
        let image = (800, 600);
        let overlay = (100, 40);
        let m = 10;

        assert_eq!(
            resolve(image, overlay, &Position::Anchor(Anchor::TopLeft), m),
            (10, 10)
        );
        assert_eq!(
            resolve(image, overlay, &Position::Anchor(Anchor::BottomRight), m),
            (690, 550)
        );
        assert_eq!(
            resolve(image, overlay, &Position::Anchor(Anchor::Center), m),
            (350, 280)
        );
        assert_eq!(
            resolve(image, overlay, &Position::Anchor(Anchor::TopCenter), m),
            (350, 10)
        );
        assert_eq!(
            resolve(image, overlay, &Position::Anchor(Anchor::CenterLeft), m),
            (10, 280)
        );
    }

    #[test]
    fn test_all_anchors_stay_in_bounds() {
        let image = (320, 240);
        let overlay = (300, 220);

        for anchor in Anchor::ALL {
            for margin in [0, 10, 50, 500] {
                let (x, y) = resolve(image, overlay, &Position::Anchor(anchor), margin);
                assert!(
                    x + overlay.0 <= image.0 && y + overlay.1 <= image.1,
                    "{anchor:?} with margin {margin} escaped bounds: ({x}, {y})"
                );
            }
        }
    }

    #[test]
    fn test_custom_span_mapping() {
        let image = (1000, 500);
        let overlay = (200, 100);

        // Span is 800x400; fractions map directly onto it.
        assert_eq!(
            resolve(image, overlay, &Position::Custom { fx: 0.0, fy: 0.0 }, 10),
            (0, 0)
        );
        assert_eq!(
            resolve(image, overlay, &Position::Custom { fx: 1.0, fy: 1.0 }, 10),
            (800, 400)
        );
        assert_eq!(
            resolve(image, overlay, &Position::Custom { fx: 0.5, fy: 0.5 }, 10),
            (400, 200)
        );
    }

    #[test]
    fn test_custom_is_idempotent() {
        let image = (640, 480);
        let overlay = (33, 17);
        let pos = Position::Custom { fx: 0.373, fy: 0.821 };

        let first = resolve(image, overlay, &pos, 10);
        for _ in 0..5 {
            assert_eq!(resolve(image, overlay, &pos, 10), first);
        }
        assert!(first.0 <= image.0 - overlay.0);
        assert!(first.1 <= image.1 - overlay.1);
    }

    #[test]
    fn test_custom_out_of_range_fractions_are_clamped() {
        let image = (100, 100);
        let overlay = (20, 20);

        assert_eq!(
            resolve(image, overlay, &Position::Custom { fx: -0.5, fy: 2.0 }, 10),
            (0, 80)
        );
        assert_eq!(
            resolve(image, overlay, &Position::Custom { fx: 7.0, fy: -1.0 }, 10),
            (80, 0)
        );
    }

    #[test]
    fn test_oversized_overlay_pins_to_origin() {
        let image = (50, 50);
        let overlay = (120, 80);

        for anchor in Anchor::ALL {
            assert_eq!(
                resolve(image, overlay, &Position::Anchor(anchor), 10),
                (0, 0)
            );
        }
        assert_eq!(
            resolve(image, overlay, &Position::Custom { fx: 0.9, fy: 0.9 }, 10),
            (0, 0)
        );
    }
}
