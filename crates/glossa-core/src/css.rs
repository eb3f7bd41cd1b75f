//! Inline `style` attribute decoding
//!
//! Only the declarations that map onto [`FormattingStyle`] are read. There is
//! no cascade: each element's own `style` attribute is decoded in isolation.

use glossa_ast::FormattingStyle;

/// Split a style attribute into `(property, value)` pairs
///
/// Property names are lowercased; declarations without a colon or with an
/// empty value are dropped.
pub fn declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim();
            if name.is_empty() || value.is_empty() {
                None
            } else {
                Some((name, value.to_string()))
            }
        })
        .collect()
}

/// Decode a style attribute into formatting
///
/// Declarations that are not present leave their field unset.
pub fn decode_style(style: &str) -> FormattingStyle {
    let mut formatting = FormattingStyle::default();
    for (name, value) in declarations(style) {
        match name.as_str() {
            "font-weight" => formatting.bold |= is_bold_weight(&value),
            "font-style" => {
                let value = value.to_ascii_lowercase();
                formatting.italic |= value == "italic" || value == "oblique";
            }
            "text-decoration" | "text-decoration-line" => {
                formatting.underline |= value.to_ascii_lowercase().contains("underline");
            }
            "font-size" => formatting.font_size = Some(value),
            "font-family" => formatting.font_family = Some(value),
            "color" => formatting.color = Some(value),
            "padding-left" => formatting.padding_left = Some(value),
            "text-align" => formatting.text_align = Some(value),
            _ => {}
        }
    }
    formatting
}

fn is_bold_weight(value: &str) -> bool {
    let value = value.to_ascii_lowercase();
    match value.as_str() {
        "bold" | "bolder" => true,
        numeric => numeric.parse::<u16>().is_ok_and(|w| w >= 600),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declarations_split() {
        assert_eq!(
            declarations("padding-left: 20px; TEXT-ALIGN:center;;bogus"),
            vec![
                ("padding-left".to_string(), "20px".to_string()),
                ("text-align".to_string(), "center".to_string()),
            ]
        );
    }

    #[test]
    fn test_decode_flags() {
        let f = decode_style("font-weight:bold; font-style: italic; text-decoration: underline");
        assert!(f.bold && f.italic && f.underline);

        let f = decode_style("font-weight: 700");
        assert!(f.bold);
        let f = decode_style("font-weight: normal");
        assert!(!f.bold);
    }

    #[test]
    fn test_decode_raw_values() {
        let f = decode_style("padding-left: 40px; text-align: right; color: #333");
        assert_eq!(f.padding_left.as_deref(), Some("40px"));
        assert_eq!(f.text_align.as_deref(), Some("right"));
        assert_eq!(f.color.as_deref(), Some("#333"));
        assert_eq!(f.font_size, None);
        assert_eq!(f.font_family, None);
    }

    #[test]
    fn test_missing_declarations_stay_unset() {
        assert!(decode_style("").is_plain());
        assert!(decode_style("margin: 0").is_plain());
    }
}
