use image::Rgba;

/// Parse a user-supplied color string into an opaque RGBA value.
///
/// Accepts `#RRGGBB`, the `#RGB` shorthand, and a small set of color names.
/// Anything else (including the empty string) resolves to opaque white, so
/// this never fails. Alpha is always 255 here; opacity is applied separately
/// by the compositor.
pub fn parse(input: &str) -> Rgba<u8> {
    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    let s = input.trim();
    if s.is_empty() {
        return WHITE;
    }

    if let Some(hex) = s.strip_prefix('#') {
        if !hex.is_ascii() {
            return WHITE;
        }
        match hex.len() {
            6 => {
                if let (Ok(r), Ok(g), Ok(b)) = (
                    u8::from_str_radix(&hex[0..2], 16),
                    u8::from_str_radix(&hex[2..4], 16),
                    u8::from_str_radix(&hex[4..6], 16),
                ) {
                    return Rgba([r, g, b, 255]);
                }
            }
            3 => {
                let digits: Vec<Option<u8>> = hex
                    .chars()
                    .map(|c| c.to_digit(16).map(|d| (d * 17) as u8))
                    .collect();
                if let [Some(r), Some(g), Some(b)] = digits[..] {
                    return Rgba([r, g, b, 255]);
                }
            }
            _ => {}
        }
        return WHITE;
    }

    match s.to_ascii_lowercase().as_str() {
        "white" => Rgba([255, 255, 255, 255]),
        "black" => Rgba([0, 0, 0, 255]),
        "red" => Rgba([255, 0, 0, 255]),
        "green" => Rgba([0, 128, 0, 255]),
        "blue" => Rgba([0, 0, 255, 255]),
        "yellow" => Rgba([255, 255, 0, 255]),
        _ => WHITE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_hex() {
        assert_eq!(parse("#ffffff"), Rgba([255, 255, 255, 255]));
        assert_eq!(parse("#FF8000"), Rgba([255, 128, 0, 255]));
        assert_eq!(parse("#000000"), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_parse_short_hex() {
        assert_eq!(parse("#000"), Rgba([0, 0, 0, 255]));
        assert_eq!(parse("#fff"), Rgba([255, 255, 255, 255]));
        assert_eq!(parse("#f80"), Rgba([255, 136, 0, 255]));
    }

    #[test]
    fn test_parse_named() {
        assert_eq!(parse("black"), Rgba([0, 0, 0, 255]));
        assert_eq!(parse("Green"), Rgba([0, 128, 0, 255]));
        assert_eq!(parse("YELLOW"), Rgba([255, 255, 0, 255]));
    }

    #[test]
    fn test_parse_fallback_to_white() {
        assert_eq!(parse(""), Rgba([255, 255, 255, 255]));
        assert_eq!(parse("   "), Rgba([255, 255, 255, 255]));
        assert_eq!(parse("chartreuse"), Rgba([255, 255, 255, 255]));
        assert_eq!(parse("#zzzzzz"), Rgba([255, 255, 255, 255]));
        assert_eq!(parse("#12345"), Rgba([255, 255, 255, 255]));
        assert_eq!(parse("#ÿÿÿ"), Rgba([255, 255, 255, 255]));
    }
}
