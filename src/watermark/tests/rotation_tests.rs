use crate::watermark::compositor::rotate_expanded;
use image::{Rgba, RgbaImage};

fn checkered_layer(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        if (x + y) % 2 == 0 {
            Rgba([255, 0, 0, 255])
        } else {
            Rgba([0, 0, 255, 128])
        }
    })
}

#[test]
fn test_zero_rotation_is_a_noop() {
    let layer = checkered_layer(40, 20);
    let rotated = rotate_expanded(layer.clone(), 0);
    assert_eq!(rotated.dimensions(), (40, 20));
    assert_eq!(rotated.as_raw(), layer.as_raw(), "pixel content must be untouched");
}

#[test]
fn test_full_turn_is_a_noop() {
    let layer = checkered_layer(33, 17);
    for degrees in [360, 720, -360] {
        let rotated = rotate_expanded(layer.clone(), degrees);
        assert_eq!(rotated.dimensions(), (33, 17));
        assert_eq!(rotated.as_raw(), layer.as_raw());
    }
}

#[test]
fn test_quarter_turn_swaps_extent() {
    let layer = checkered_layer(40, 20);
    let rotated = rotate_expanded(layer, 90);

    // Bounding-box computation goes through floats; allow one pixel of
    // resample rounding per axis.
    let (w, h) = rotated.dimensions();
    assert!(w.abs_diff(20) <= 1, "width {w} should be ~20");
    assert!(h.abs_diff(40) <= 1, "height {h} should be ~40");
}

#[test]
fn test_diagonal_rotation_expands_canvas() {
    let layer = checkered_layer(100, 100);
    let rotated = rotate_expanded(layer, 45);

    let (w, h) = rotated.dimensions();
    // 100 * sqrt(2) = 141.4...; expand-on-rotate must not crop corners.
    assert!(w >= 141 && w <= 143, "width {w}");
    assert!(h >= 141 && h <= 143, "height {h}");
}

#[test]
fn test_shallow_rotation_of_wide_strip() {
    // At shallow angles the rotated bounding box of a wide strip is
    // narrower than the strip itself; this must not underflow or clip.
    let layer = RgbaImage::from_pixel(1000, 50, Rgba([255, 0, 255, 255]));
    let rotated = rotate_expanded(layer, 10);

    let (w, h) = rotated.dimensions();
    // 1000*cos10 + 50*sin10 = 993.5; 1000*sin10 + 50*cos10 = 222.9
    assert!(w.abs_diff(994) <= 1, "width {w}");
    assert!(h.abs_diff(223) <= 1, "height {h}");
    // The strip's center survives the round trip.
    assert_eq!(rotated.get_pixel(w / 2, h / 2), &Rgba([255, 0, 255, 255]));
}

#[test]
fn test_rotation_pads_with_transparency() {
    let layer = RgbaImage::from_pixel(60, 10, Rgba([0, 255, 0, 255]));
    let rotated = rotate_expanded(layer, 45);

    // The canvas corners are outside the rotated strip and must carry no
    // opacity of their own.
    assert_eq!(rotated.get_pixel(0, 0)[3], 0);
    let (w, h) = rotated.dimensions();
    assert_eq!(rotated.get_pixel(w - 1, h - 1)[3], 0);
}
