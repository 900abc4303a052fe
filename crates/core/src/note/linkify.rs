//! Turns bare URLs in note bodies into anchors.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

static ANCHOR_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^<a(\s|>)").expect("anchor pattern is valid"));

static ANCHOR_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^</a\s*>").expect("anchor pattern is valid"));

static URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(^|[^\w@./-])((?:https?://)?(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+(?:com|edu|org|net|gov|io|us|info|biz)\b(?:[/?#][^\s<]*)?)",
    )
    .expect("url pattern is valid")
});

const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', '\'', '"'];

/// Wraps URLs that are not already inside an `<a>` element with
/// `<a href="..." target="_blank">`. URLs without a scheme get `http://`.
pub fn linkify(html: &str) -> String {
    let mut output = String::with_capacity(html.len());
    let mut anchor_depth = 0usize;
    let mut last = 0;

    for tag in TAG.find_iter(html) {
        push_text(&mut output, &html[last..tag.start()], anchor_depth == 0);
        let tag_text = tag.as_str();
        if ANCHOR_OPEN.is_match(tag_text) {
            anchor_depth += 1;
        } else if ANCHOR_CLOSE.is_match(tag_text) {
            anchor_depth = anchor_depth.saturating_sub(1);
        }
        output.push_str(tag_text);
        last = tag.end();
    }
    push_text(&mut output, &html[last..], anchor_depth == 0);
    output
}

fn push_text(output: &mut String, text: &str, outside_anchor: bool) {
    if outside_anchor {
        output.push_str(&URL.replace_all(text, |caps: &Captures| anchor(&caps[1], &caps[2])));
    } else {
        output.push_str(text);
    }
}

fn anchor(prefix: &str, matched: &str) -> String {
    let url = matched.trim_end_matches(TRAILING_PUNCTUATION);
    let trailing = &matched[url.len()..];
    let href = if url.to_ascii_lowercase().starts_with("http") {
        url.to_string()
    } else {
        format!("http://{url}")
    };
    format!(r#"{prefix}<a href="{href}" target="_blank">{url}</a>{trailing}"#)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linkify_bare_domain() {
        assert_eq!(
            linkify("Get an online degree at send.money.edu university"),
            r#"Get an online degree at <a href="http://send.money.edu" target="_blank">send.money.edu</a> university"#
        );
    }

    #[test]
    fn test_existing_anchors_untouched() {
        let body = r#"<p>They were <a href="http://www.guzzle.com">www.guzzle.com</a> at <b>https://marsh.mallows.com</b> and <a href="http://www.foxnews.com">FOX news</a></p>"#;
        let expected = r#"<p>They were <a href="http://www.guzzle.com">www.guzzle.com</a> at <b><a href="https://marsh.mallows.com" target="_blank">https://marsh.mallows.com</a></b> and <a href="http://www.foxnews.com">FOX news</a></p>"#;
        assert_eq!(linkify(body), expected);
    }

    #[test]
    fn test_trailing_punctuation_stays_outside() {
        assert_eq!(
            linkify("See www.berkeley.edu."),
            r#"See <a href="http://www.berkeley.edu" target="_blank">www.berkeley.edu</a>."#
        );
    }

    #[test]
    fn test_email_addresses_are_left_alone() {
        assert_eq!(linkify("Write to otl@berkeley.edu"), "Write to otl@berkeley.edu");
    }

    #[test]
    fn test_plain_text_without_urls() {
        let body = "He spattered me with tomatoes, Hummus, chick peas";
        assert_eq!(linkify(body), body);
    }
}
