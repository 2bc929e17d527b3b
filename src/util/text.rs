/// Entities decoded by [`clean_html`], in replacement order.
///
/// `&amp;` goes first, so `&amp;lt;` ends up as `<` rather than `&lt;`.
const ENTITIES: [(&str, &str); 4] = [
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
];

/// Strips markup tags and decodes a small fixed set of HTML entities.
///
/// Used on feed-provided titles and descriptions before classification and
/// storage. This is a best-effort cleanup, not an HTML parser and not a
/// security boundary:
///
/// - Every `<...>` run is removed, matching non-greedily up to the first `>`.
///   A tag may not span a newline; a `<` without a closing `>` on the same
///   line is kept as literal text.
/// - Only `&amp;`, `&lt;`, `&gt;` and `&quot;` are decoded. Numeric and other
///   named entities pass through untouched.
/// - Leading and trailing whitespace is trimmed.
///
/// # Examples
///
/// ```
/// use ubuntu_tales::util::clean_html;
///
/// assert_eq!(clean_html(Some("<b>Hi &amp; Bye</b>")), "Hi & Bye");
/// assert_eq!(clean_html(Some("   ")), "");
/// assert_eq!(clean_html(None), "");
/// ```
pub fn clean_html(text: Option<&str>) -> String {
    let text = match text {
        Some(t) if !t.is_empty() => t,
        _ => return String::new(),
    };

    let mut decoded = strip_tags(text);
    for (entity, replacement) in ENTITIES {
        if decoded.contains(entity) {
            decoded = decoded.replace(entity, replacement);
        }
    }

    decoded.trim().to_string()
}

/// Removes `<...>` runs in a single left-to-right pass.
fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];

        // The tag ends at the first '>' unless a newline comes first
        match after_open.find(|c: char| c == '>' || c == '\n') {
            Some(end) if after_open.as_bytes()[end] == b'>' => {
                rest = &after_open[end + 1..];
            }
            _ => {
                out.push('<');
                rest = after_open;
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_strips_tags_and_decodes_entities() {
        assert_eq!(clean_html(Some("<b>Hi &amp; Bye</b>")), "Hi & Bye");
    }

    #[test]
    fn test_empty_and_absent_input() {
        assert_eq!(clean_html(None), "");
        assert_eq!(clean_html(Some("")), "");
        assert_eq!(clean_html(Some(" \n\t ")), "");
    }

    #[test]
    fn test_decodes_only_four_entities() {
        assert_eq!(
            clean_html(Some("&lt;3 &gt; &quot;quoted&quot; &apos;x&apos; &#39;y&#39; &nbsp;")),
            "<3 > \"quoted\" &apos;x&apos; &#39;y&#39; &nbsp;"
        );
    }

    #[test]
    fn test_amp_decoded_before_other_entities() {
        assert_eq!(clean_html(Some("&amp;lt;b&amp;gt;")), "<b>");
    }

    #[test]
    fn test_decoded_brackets_are_not_stripped() {
        // Tags are removed before entity decoding, so escaped markup survives as text
        assert_eq!(clean_html(Some("&lt;i&gt;kept&lt;/i&gt;")), "<i>kept</i>");
    }

    #[test]
    fn test_tag_is_non_greedy() {
        assert_eq!(clean_html(Some("<p>one</p> and <p>two</p>")), "one and two");
    }

    #[test]
    fn test_unclosed_bracket_kept() {
        assert_eq!(clean_html(Some("3 < 5 is true")), "3 < 5 is true");
        assert_eq!(clean_html(Some("a <b")), "a <b");
    }

    #[test]
    fn test_tag_does_not_span_newline() {
        assert_eq!(clean_html(Some("a <br\n> b")), "a <br\n> b");
        assert_eq!(clean_html(Some("<p>line one</p>\n<p>line two</p>")), "line one\nline two");
    }

    #[test]
    fn test_nested_markup_leaves_residue() {
        // Not an HTML parser: the first '>' closes the tag
        assert_eq!(clean_html(Some("<a title=\"x>y\">link</a>")), "y\">link");
    }

    #[test]
    fn test_attributes_and_self_closing_tags() {
        assert_eq!(
            clean_html(Some("  <p class=\"intro\">Hello<br/>world</p>  ")),
            "Helloworld"
        );
    }

    #[test]
    fn test_unicode_preserved() {
        assert_eq!(clean_html(Some("<em>Hadithi</em> ya simba 🦁")), "Hadithi ya simba 🦁");
    }

    proptest! {
        #[test]
        fn prop_text_without_markup_is_only_trimmed(s in "[a-zA-Z0-9 .,!?]{0,64}") {
            prop_assert_eq!(clean_html(Some(&s)), s.trim());
        }

        #[test]
        fn prop_output_is_trimmed(s in "\\PC{0,64}") {
            let cleaned = clean_html(Some(&s));
            prop_assert_eq!(cleaned.trim(), cleaned.as_str());
        }
    }
}
