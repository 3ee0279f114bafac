//! HTML tag removal for displaying notes as text.

use std::collections::HashSet;

/// Removes every HTML tag and decodes entities, keeping text and line order.
#[must_use]
pub fn strip_html(html: &str) -> String {
    let text = ammonia::Builder::new()
        .tags(HashSet::default())
        .clean(html)
        .to_string();

    html_escape::decode_html_entities(&text).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::wrap_html;

    #[test]
    fn test_strips_wrapped_note() {
        let html = wrap_html("milk, eggs\nbread & butter\n");
        let text = strip_html(&html);

        assert!(!text.contains('<'));
        assert!(!text.contains('>'));
        assert_eq!(text, "milk, eggs\nbread & butter\n");
    }

    #[test]
    fn test_keeps_plain_text() {
        assert_eq!(strip_html("no markup here"), "no markup here");
    }

    #[test]
    fn test_drops_inline_markup() {
        assert_eq!(
            strip_html("<div><b>Shopping</b> list</div><div>caf&eacute;</div>"),
            "Shopping listcafé"
        );
    }
}
