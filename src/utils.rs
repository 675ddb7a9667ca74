//! Utility functions

use crate::constants::CHAT_INVALID_RESPONSE_CHARS;
use chrono::{DateTime, Local, Utc};
use std::path::PathBuf;

// Chat bubble with typing dots — rasterized for the splash screen and drawer header
pub const LOGO_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 240 240"><defs><style>.c1{fill:#c7d2fe}.c2{fill:#6366f1}</style></defs><path class="c2" d="M120 18c-57.4 0-104 39.4-104 88 0 27.5 15.1 52 38.6 68.1L42 222l53.8-27.7c7.8 1.6 15.9 2.4 24.2 2.4 57.4 0 104-39.4 104-88s-46.6-90.7-104-90.7Z"/><circle class="c1" cx="76" cy="108" r="13"/><circle class="c1" cx="120" cy="108" r="13"/><circle class="c1" cx="164" cy="108" r="13"/></svg>"#;

/// Rasterize the logo SVG at the given width, preserving aspect ratio.
pub fn rasterize_logo(width: u32) -> (Vec<u8>, u32, u32) {
    let tree = resvg::usvg::Tree::from_str(LOGO_SVG, &resvg::usvg::Options::default()).unwrap();
    let svg_size = tree.size();
    let scale = width as f32 / svg_size.width();
    let height = (svg_size.height() * scale).ceil() as u32;
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height).unwrap();
    resvg::render(
        &tree,
        resvg::usvg::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );
    (premul_to_straight(&pixmap), width, height)
}

fn premul_to_straight(pixmap: &resvg::tiny_skia::Pixmap) -> Vec<u8> {
    pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let a = p.alpha();
            if a == 0 {
                [0, 0, 0, 0]
            } else {
                let r = (p.red() as u16 * 255 / a as u16) as u8;
                let g = (p.green() as u16 * 255 / a as u16) as u8;
                let b = (p.blue() as u16 * 255 / a as u16) as u8;
                [r, g, b, a]
            }
        })
        .collect()
}

/// Per-user data directory (database, settings, logs)
pub fn get_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("TextAI")
}

/// Strip terminal control garbage from a model response.
/// Keeps only the text after the last occurrence of the marker.
pub fn filter_invalid_chars(input: &str) -> &str {
    match input.rfind(CHAT_INVALID_RESPONSE_CHARS) {
        Some(pos) => &input[pos + CHAT_INVALID_RESPONSE_CHARS.len()..],
        None => input,
    }
}

/// Structural email check: one '@', non-empty local part, dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(l), Some(d), None) => (l, d),
        _ => return false,
    };
    if local.is_empty() || email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut labels = domain.split('.');
    domain.contains('.') && labels.all(|l| !l.is_empty())
}

/// Up to two uppercase initials for the avatar circle ("Maria Silva" -> "MS")
pub fn initials(name: &str) -> String {
    let out: String = name
        .split_whitespace()
        .filter_map(|w| w.chars().next())
        .take(2)
        .collect::<String>()
        .to_uppercase();
    if out.is_empty() {
        "U".to_string()
    } else {
        out
    }
}

/// Format a transcript timestamp in the user's local time
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%d/%m/%Y %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_strips_up_to_last_marker() {
        let input = "junk\u{1b}[?25hfirst[?25h actual response";
        assert_eq!(filter_invalid_chars(input), " actual response");
    }

    #[test]
    fn filter_passes_clean_input_through() {
        assert_eq!(filter_invalid_chars("clean text"), "clean text");
        assert_eq!(filter_invalid_chars(""), "");
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("a.b@sub.domain.org"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@nodot"));
        assert!(!is_valid_email("user@@example.com"));
        assert!(!is_valid_email("user @example.com"));
        assert!(!is_valid_email("user@example..com"));
    }

    #[test]
    fn initials_from_name() {
        assert_eq!(initials("Maria Silva"), "MS");
        assert_eq!(initials("rodolfo"), "R");
        assert_eq!(initials("Ana Beatriz Costa"), "AB");
        assert_eq!(initials(""), "U");
        assert_eq!(initials("   "), "U");
    }
}
