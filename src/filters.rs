use log::warn;
use minijinja::value::Value;
use minijinja::Environment;
use regex::Regex;

use crate::config::Translator;

/// Block-level openers that `wpautop` leaves unwrapped.
const BLOCK_TAG_PATTERN: &str = r"(?i)^<(address|article|aside|blockquote|details|div|dl|fieldset|figure|footer|form|h[1-6]|header|hr|li|main|nav|ol|p|pre|section|table|tbody|td|th|thead|tr|ul)[\s/>]";

/// Registers the template helper surface: the `json` and `wpautop` filters
/// and the `__` / `_x` translation functions.
pub(crate) fn register(env: &mut Environment<'static>, translate: Translator) {
    env.add_filter("json", json_safe);
    env.add_filter("wpautop", autop);

    let single = translate.clone();
    env.add_function("__", move |text: String| single(&text, None));
    env.add_function("_x", move |text: String, context: String| {
        translate(&text, Some(&context))
    });
}

/// Serializes a value to JSON safe for inline-script embedding.
///
/// `<`, `>`, `&`, `'` and the line separators U+2028/U+2029 are escaped as
/// `\uXXXX` sequences so the output cannot terminate a surrounding
/// `<script>` block or attribute.
pub fn json_safe(value: Value) -> Result<String, minijinja::Error> {
    let serialized = serde_json::to_string(&value).map_err(|err| {
        minijinja::Error::new(
            minijinja::ErrorKind::InvalidOperation,
            "value is not JSON serializable",
        )
        .with_source(err)
    })?;

    let mut escaped = String::with_capacity(serialized.len());
    for ch in serialized.chars() {
        match ch {
            '<' => escaped.push_str("\\u003c"),
            '>' => escaped.push_str("\\u003e"),
            '&' => escaped.push_str("\\u0026"),
            '\'' => escaped.push_str("\\u0027"),
            '\u{2028}' => escaped.push_str("\\u2028"),
            '\u{2029}' => escaped.push_str("\\u2029"),
            other => escaped.push(other),
        }
    }
    Ok(escaped)
}

/// Wraps double-newline separated blocks in `<p>` tags and turns remaining
/// single newlines into `<br />`. Blocks already opening with a block-level
/// tag pass through untouched.
pub fn autop(text: String) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    if text.trim().is_empty() {
        return String::new();
    }

    let separator = match Regex::new(r"\n\s*\n") {
        Ok(separator) => separator,
        Err(err) => {
            warn!("Invalid paragraph separator pattern: {err}");
            return text;
        }
    };
    let block_tag = match Regex::new(BLOCK_TAG_PATTERN) {
        Ok(block_tag) => block_tag,
        Err(err) => {
            warn!("Invalid block tag pattern: {err}");
            return text;
        }
    };

    let mut paragraphs = Vec::new();
    for block in separator.split(&text) {
        let block = block.trim();
        if block.is_empty() {
            continue;
        }
        if block_tag.is_match(block) {
            paragraphs.push(block.to_string());
        } else {
            paragraphs.push(format!("<p>{}</p>", block.replace('\n', "<br />\n")));
        }
    }

    paragraphs.join("\n")
}
