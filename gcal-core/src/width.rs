//! Printed width of terminal text.
//!
//! Wide and fullwidth characters occupy two columns, everything else one.
//! Zero-width and control characters are still counted as a single column so
//! that the grid never under-pads a cell.

use unicode_width::UnicodeWidthChar;

/// Column width of a single character (1 or 2).
pub fn char_width(c: char) -> usize {
    match UnicodeWidthChar::width(c) {
        Some(2) => 2,
        _ => 1,
    }
}

/// Sum of the column widths of every character in `text`.
pub fn display_width(text: &str) -> usize {
    text.chars().map(char_width).sum()
}

/// Left-justify `text` to `width` columns, padding with spaces.
///
/// Text that is already wider is returned unchanged.
pub fn pad_to(text: &str, width: usize) -> String {
    let printed = display_width(text);
    let mut padded = String::with_capacity(text.len() + width.saturating_sub(printed));
    padded.push_str(text);
    padded.extend(std::iter::repeat_n(' ', width.saturating_sub(printed)));
    padded
}

/// Center `text` in `width` columns. Odd padding puts the extra space on the right.
pub fn center_to(text: &str, width: usize) -> String {
    let spare = width.saturating_sub(display_width(text));
    let left = spare / 2;
    let mut centered = " ".repeat(left);
    centered.push_str(text);
    centered.extend(std::iter::repeat_n(' ', spare - left));
    centered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_width_matches_len() {
        let s = "Standup with the team";
        assert_eq!(display_width(s), s.len());
    }

    #[test]
    fn test_fullwidth_counts_double() {
        assert_eq!(display_width("会議"), 4);
        assert_eq!(display_width("ＡＢＣ"), 6);
    }

    #[test]
    fn test_mixed_width() {
        assert_eq!(display_width("09:00 会議"), 10);
    }

    #[test]
    fn test_ambiguous_and_combining_count_single() {
        assert_eq!(char_width('é'), 1);
        assert_eq!(char_width('\u{0301}'), 1);
        assert_eq!(char_width('\n'), 1);
    }

    #[test]
    fn test_pad_to() {
        assert_eq!(pad_to("ab", 5), "ab   ");
        assert_eq!(pad_to("会", 4), "会  ");
        assert_eq!(pad_to("toolong", 3), "toolong");
    }

    #[test]
    fn test_center_to() {
        assert_eq!(center_to("Monday", 10), "  Monday  ");
        assert_eq!(center_to("Tuesday", 10), " Tuesday  ");
        assert_eq!(center_to("会議", 6), " 会議 ");
        assert_eq!(center_to("toolong", 3), "toolong");
    }
}
