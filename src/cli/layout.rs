use unicode_segmentation::UnicodeSegmentation;

/// Center `text` in a field of `width` columns, padding with spaces.
///
/// Text that already fills the field (or a non-positive width) is returned
/// unchanged. When the padding is odd the extra space goes on the right.
/// Width is measured in grapheme clusters.
pub fn center_string(text: &str, width: isize) -> String {
    let len = text.graphemes(true).count();
    let width = match usize::try_from(width) {
        Ok(width) if width > len => width,
        _ => return text.to_string(),
    };

    let padding = width - len;
    let left = padding / 2;
    let right = padding - left;

    let mut centered = String::with_capacity(text.len() + padding);
    centered.extend(std::iter::repeat(' ').take(left));
    centered.push_str(text);
    centered.extend(std::iter::repeat(' ').take(right));
    centered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_narrow_width() {
        assert_eq!(center_string("abc", -1), "abc");
        assert_eq!(center_string("abc", 1), "abc");
        assert_eq!(center_string("abc", 3), "abc");
    }

    #[test]
    fn test_center_pads_evenly() {
        assert_eq!(center_string("abc", 4), "abc ");
        assert_eq!(center_string("abc", 5), " abc ");
        assert_eq!(center_string("", 2), "  ");
    }

    #[test]
    fn test_center_huge_width() {
        // used to be quadratic in width
        assert_eq!(center_string("abc", 1_234_567).len(), 1_234_567);
    }

    #[test]
    fn test_center_counts_graphemes() {
        assert_eq!(center_string("é", 3), " é ");
    }
}
