pub mod chunker;
pub mod fixtures;
pub mod perf_fixtures;

/// Escape quotes, backslashes and control characters so every markup line
/// prints on one line.
pub fn escape_text(text: &str) -> String {
    text.escape_debug().to_string()
}

/// Render rewriter output as one line per tag boundary, for diffing.
pub fn split_markup_lines(output: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(output);
    let mut lines = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        if ch == '<' && !current.is_empty() {
            lines.push(escape_text(&current));
            current.clear();
        }
        current.push(ch);
        if ch == '>' {
            lines.push(escape_text(&current));
            current.clear();
        }
    }
    if !current.is_empty() {
        lines.push(escape_text(&current));
    }
    lines
}

/// First differing line of two renderings, with two lines of context on
/// either side.
pub fn diff_lines(expected: &[String], actual: &[String]) -> String {
    use std::fmt::Write;
    let len = expected.len().max(actual.len());
    let mut out = String::new();
    if let Some(at) = (0..len).find(|&i| expected.get(i) != actual.get(i)) {
        let _ = writeln!(&mut out, "first mismatch at line {}:", at + 1);
        for idx in at.saturating_sub(2)..(at + 3).min(len) {
            let marker = if idx == at { '>' } else { ' ' };
            let _ = writeln!(&mut out, "{marker} {:>4} - {}", idx + 1, line_at(expected, idx));
            let _ = writeln!(&mut out, "{marker} {:>4} + {}", idx + 1, line_at(actual, idx));
        }
    }
    let _ = writeln!(
        &mut out,
        "{} expected lines, {} actual lines",
        expected.len(),
        actual.len()
    );
    out
}

fn line_at(lines: &[String], idx: usize) -> &str {
    lines.get(idx).map_or("<eof>", String::as_str)
}

pub fn parse_u64(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(hex) = trimmed.strip_prefix("0x") {
        u64::from_str_radix(hex, 16).ok()
    } else {
        trimmed.parse::<u64>().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markup_lines_split_at_tags() {
        assert_eq!(
            split_markup_lines(b"a<p class=x>b\n</p>"),
            vec!["a", "<p class=x>", "b\\n", "</p>"]
        );
    }

    #[test]
    fn diff_points_at_first_mismatch() {
        let expected = vec!["a".to_string(), "b".to_string()];
        let actual = vec!["a".to_string(), "c".to_string()];
        let diff = diff_lines(&expected, &actual);
        assert!(diff.starts_with("first mismatch at line 2"), "{diff}");
        assert!(diff.contains(">    2 - b"), "{diff}");
        assert!(diff.contains(">    2 + c"), "{diff}");
    }

    #[test]
    fn parses_decimal_and_hex_seeds() {
        assert_eq!(parse_u64("42"), Some(42));
        assert_eq!(parse_u64(" 0x2a "), Some(42));
        assert_eq!(parse_u64(""), None);
    }
}
