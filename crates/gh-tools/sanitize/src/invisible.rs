//! Removal of invisible and direction-control characters.

/// Characters that render as nothing (or reorder text) and can smuggle
/// instructions past a human reviewer.
fn is_invisible(c: char) -> bool {
    matches!(
        c,
        '\u{200B}'            // zero-width space
        | '\u{200C}'          // zero-width non-joiner
        | '\u{200E}'          // left-to-right mark
        | '\u{200F}'          // right-to-left mark
        | '\u{00AD}'          // soft hyphen
        | '\u{FEFF}'          // byte-order mark
        | '\u{180E}'          // Mongolian vowel separator
        | '\u{E0001}'         // language tag
        | '\u{E0020}'..='\u{E007F}' // tag characters
        | '\u{202A}'..='\u{202E}'   // BiDi embedding/override controls
        | '\u{2066}'..='\u{2069}'   // BiDi isolates
        | '\u{2060}'..='\u{2064}'   // word joiner and invisible operators
    )
}

/// Drop invisible characters; everything else (emoji, non-Latin scripts)
/// passes through.
pub fn filter_invisible_characters(input: &str) -> String {
    input.chars().filter(|c| !is_invisible(*c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_zero_width_and_bidi() {
        assert_eq!(filter_invisible_characters("a\u{200B}b\u{202E}c"), "abc");
        assert_eq!(filter_invisible_characters("x\u{FEFF}y\u{2066}z"), "xyz");
    }

    #[test]
    fn removes_tag_characters() {
        let tagged = "hi\u{E0001}\u{E0041}\u{E007F}";
        assert_eq!(filter_invisible_characters(tagged), "hi");
    }

    #[test]
    fn keeps_visible_unicode() {
        let input = "caf\u{E9} \u{1F980} \u{65E5}\u{672C}";
        assert_eq!(filter_invisible_characters(input), input);
    }

    #[test]
    fn keeps_ordinary_whitespace() {
        assert_eq!(filter_invisible_characters("a b\tc\nd"), "a b\tc\nd");
    }
}
