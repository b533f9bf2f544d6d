//! Small text helpers shared across the compaction passes.

/// Collapse whitespace runs to single spaces and trim.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keep the first `max` whitespace-separated tokens.
pub fn cap_tokens(text: &str, max: usize) -> String {
    text.split_whitespace().take(max).collect::<Vec<_>>().join(" ")
}

/// Decode the basic named entities and decimal character references that
/// appear in serialized snapshots. Unknown entities pass through verbatim.
pub(crate) fn unescape_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        // entity names are short; a distant ';' is unrelated
        let end = rest[1..].find(';').filter(|&e| e <= 8);
        let decoded = end.and_then(|e| {
            let name = &rest[1..1 + e];
            match name {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => name
                    .strip_prefix('#')
                    .and_then(|digits| digits.parse::<u32>().ok())
                    .and_then(char::from_u32),
            }
            .map(|c| (c, e))
        });
        match decoded {
            Some((c, e)) => {
                out.push(c);
                rest = &rest[e + 2..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  a\n\t b  "), "a b");
        assert_eq!(clean_text("   "), "");
        assert_eq!(clean_text("one"), "one");
    }

    #[test]
    fn test_cap_tokens() {
        assert_eq!(cap_tokens("a b c d", 2), "a b");
        assert_eq!(cap_tokens("a b", 5), "a b");
        assert_eq!(cap_tokens("", 5), "");
    }

    #[test]
    fn test_unescape_entities() {
        assert_eq!(unescape_entities("a &amp; b"), "a & b");
        assert_eq!(unescape_entities("&lt;div&gt;"), "<div>");
        assert_eq!(unescape_entities("it&#39;s"), "it's");
        assert_eq!(unescape_entities("no entities"), "no entities");
        assert_eq!(unescape_entities("AT&T; stays"), "AT&T; stays");
        assert_eq!(unescape_entities("dangling &"), "dangling &");
    }
}
