//! Code-fence info-string filtering.
//!
//! The info string after an opening fence is rendered invisibly by most
//! markdown viewers, which makes it a prompt-injection vector. Fence
//! contents are left alone; only the info strings are rewritten.

const MAX_INFO_TOKEN_LEN: usize = 48;

/// Rewrite fence info strings, keeping only a single short language-ish
/// token. Mismatched or inline fences are treated as text.
pub fn filter_code_fence_metadata(input: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut fence_len: Option<usize> = None;

    for line in input.split('\n') {
        match fence_len {
            None => {
                if let Some((indent, ticks, rest)) = parse_fence_start(line) {
                    fence_len = Some(ticks);
                    let info = rest.trim();
                    let kept = if is_safe_info_token(info) { info } else { "" };
                    out.push(format!("{indent}{}{kept}", "`".repeat(ticks)));
                } else {
                    out.push(line.to_string());
                }
            }
            Some(open_len) => {
                if is_fence_close(line, open_len) {
                    fence_len = None;
                }
                // Fence bodies and mismatched closings pass through.
                out.push(line.to_string());
            }
        }
    }

    out.join("\n")
}

/// A fence start is leading whitespace, a run of three or more backticks,
/// and a remainder free of further backticks (otherwise the line is an
/// inline code span, not a fence).
fn parse_fence_start(line: &str) -> Option<(&str, usize, &str)> {
    let trimmed = line.trim_start();
    let indent_len = line.len() - trimmed.len();
    let ticks = trimmed.chars().take_while(|c| *c == '`').count();
    if ticks < 3 {
        return None;
    }
    let rest = &trimmed[ticks..];
    if rest.contains('`') {
        return None;
    }
    Some((&line[..indent_len], ticks, rest))
}

/// Closing fences must match the opening length exactly.
fn is_fence_close(line: &str, open_len: usize) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && trimmed.chars().all(|c| c == '`') && trimmed.len() == open_len
}

/// One token of letters/digits plus `+ - _ # .`, at most 48 chars.
fn is_safe_info_token(info: &str) -> bool {
    !info.is_empty()
        && info.len() <= MAX_INFO_TOKEN_LEN
        && info
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '_' | '#' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hostile_info_string_is_dropped() {
        let input = "```steal secrets\nfmt.Println(42)\n```";
        assert_eq!(filter_code_fence_metadata(input), "```\nfmt.Println(42)\n```");
    }

    #[test]
    fn language_token_is_kept() {
        let input = "```rust\nlet x = 1;\n```";
        assert_eq!(filter_code_fence_metadata(input), input);
        let cs = "```c#\ncode\n```";
        assert_eq!(filter_code_fence_metadata(cs), cs);
    }

    #[test]
    fn overlong_token_is_dropped() {
        let long = "x".repeat(49);
        let input = format!("```{long}\ncode\n```");
        assert_eq!(filter_code_fence_metadata(&input), "```\ncode\n```");
    }

    #[test]
    fn fence_body_is_untouched() {
        let input = "```\n```js not a fence, inside\nstill inside ` tick\n```";
        // The body line starting with backticks closes only on exact length.
        let out = filter_code_fence_metadata(input);
        assert!(out.contains("still inside ` tick"));
    }

    #[test]
    fn mismatched_close_is_text() {
        let input = "````\nbody\n```\nstill body\n````";
        // The three-tick line does not close a four-tick fence.
        assert_eq!(filter_code_fence_metadata(input), input);
    }

    #[test]
    fn indented_fence_keeps_indent() {
        let input = "  ```evil stuff\n  code\n  ```";
        assert_eq!(filter_code_fence_metadata(input), "  ```\n  code\n  ```");
    }

    #[test]
    fn inline_backtick_runs_are_not_fences() {
        let input = "```not a fence``` text";
        assert_eq!(filter_code_fence_metadata(input), input);
    }

    #[test]
    fn trailing_newline_preserved() {
        let input = "plain\n";
        assert_eq!(filter_code_fence_metadata(input), input);
    }
}
