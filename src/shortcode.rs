use indexmap::IndexMap;
use log::warn;
use regex::Regex;
use std::sync::Arc;

use crate::engine::ViewEngine;
use crate::view::View;

/// A `[tag attrs]` or `[tag attrs]body[/tag]` occurrence in content text.
const DIRECTIVE_PATTERN: &str = r"\[(\[?)([a-zA-Z][\w-]*)((?:\s[^\]]*)?)\](\]?)";

/// Attribute forms: `key="v"`, `key='v'`, `key=v`, `"v"`, `'v'`, `v`.
const ATTR_PATTERN: &str = concat!(
    r#"([a-zA-Z_][\w-]*)\s*=\s*"([^"]*)""#,
    "|",
    r#"([a-zA-Z_][\w-]*)\s*=\s*'([^']*)'"#,
    "|",
    r#"([a-zA-Z_][\w-]*)\s*=\s*([^\s'"]+)"#,
    "|",
    r#""([^"]*)""#,
    "|",
    r#"'([^']*)'"#,
    "|",
    r#"(\S+)"#,
);

/// Attributes parsed from a shortcode directive body.
#[derive(Debug, Clone, Default)]
pub struct ShortcodeAttrs {
    /// `key=value` attributes, in the order written.
    pub named: IndexMap<String, String>,
    /// Bare or quoted values without a key.
    pub positional: Vec<String>,
}

/// Expands one shortcode occurrence. Receives the engine that owns the
/// expansion pass, the parsed attributes, and the enclosed body when the
/// directive had a matching `[/tag]`.
pub type ShortcodeHandler =
    Arc<dyn Fn(&ViewEngine, &ShortcodeAttrs, Option<&str>) -> String + Send + Sync>;

/// Tag-to-handler table consulted by the expansion pass.
#[derive(Clone, Default)]
pub struct ShortcodeRegistry {
    handlers: IndexMap<String, ShortcodeHandler>,
}

impl ShortcodeRegistry {
    pub fn new() -> Self {
        Self { handlers: IndexMap::new() }
    }

    pub fn register(&mut self, tag: impl Into<String>, handler: ShortcodeHandler) {
        self.handlers.insert(tag.into(), handler);
    }

    pub fn get(&self, tag: &str) -> Option<&ShortcodeHandler> {
        self.handlers.get(tag)
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Built-in handler for the view shortcode.
///
/// The template reference is the `view` attribute, else the first positional
/// attribute, else the enclosed body. All named attributes become render
/// vars alongside the resolved `view` key.
pub(crate) fn view_shortcode(
    engine: &ViewEngine,
    attrs: &ShortcodeAttrs,
    body: Option<&str>,
) -> String {
    let reference = attrs
        .named
        .get("view")
        .cloned()
        .or_else(|| attrs.positional.first().cloned())
        .or_else(|| body.map(|body| body.trim().to_string()))
        .unwrap_or_default();

    let mut vars = serde_json::Map::new();
    for (name, value) in &attrs.named {
        vars.insert(name.clone(), serde_json::Value::String(value.clone()));
    }
    vars.insert("view".to_string(), serde_json::Value::String(reference.clone()));

    View::with(engine, reference).add_vars(vars).render()
}

/// Replaces every registered shortcode in `content` with its handler's
/// output.
///
/// Single pass, left to right; handler output is not re-scanned. Unknown
/// tags pass through verbatim and `[[tag ...]]` escapes to the literal
/// directive text.
pub(crate) fn expand(
    engine: &ViewEngine,
    registry: &ShortcodeRegistry,
    content: &str,
) -> String {
    if registry.is_empty() || !content.contains('[') {
        return content.to_string();
    }

    let directive = match Regex::new(DIRECTIVE_PATTERN) {
        Ok(directive) => directive,
        Err(err) => {
            warn!("Invalid shortcode pattern: {err}");
            return content.to_string();
        }
    };

    let mut output = String::with_capacity(content.len());
    let mut cursor = 0;
    while let Some(captures) = directive.captures(&content[cursor..]) {
        let Some(whole) = captures.get(0) else {
            break;
        };
        let start = cursor + whole.start();
        let mut next = cursor + whole.end();
        output.push_str(&content[cursor..start]);

        let tag = captures.get(2).map(|m| m.as_str()).unwrap_or_default();
        let Some(handler) = registry.get(tag) else {
            output.push_str(whole.as_str());
            cursor = next;
            continue;
        };

        let open_escaped = captures.get(1).is_some_and(|m| !m.as_str().is_empty());
        let close_escaped = captures.get(4).is_some_and(|m| !m.as_str().is_empty());
        if open_escaped && close_escaped {
            let literal = whole.as_str();
            output.push_str(&literal[1..literal.len() - 1]);
            cursor = next;
            continue;
        }

        let attrs = parse_attrs(captures.get(3).map(|m| m.as_str()).unwrap_or_default());

        let closing = format!("[/{tag}]");
        let body = match content[next..].find(&closing) {
            Some(offset) => {
                let body = &content[next..next + offset];
                next += offset + closing.len();
                Some(body)
            }
            None => None,
        };

        if open_escaped {
            output.push('[');
        }
        output.push_str(&handler(engine, &attrs, body));
        if close_escaped {
            output.push(']');
        }
        cursor = next;
    }
    output.push_str(&content[cursor..]);

    output
}

/// Parses a directive's attribute text.
pub fn parse_attrs(text: &str) -> ShortcodeAttrs {
    let mut attrs = ShortcodeAttrs::default();
    let pattern = match Regex::new(ATTR_PATTERN) {
        Ok(pattern) => pattern,
        Err(err) => {
            warn!("Invalid attribute pattern: {err}");
            return attrs;
        }
    };

    for captures in pattern.captures_iter(text) {
        if let (Some(name), Some(value)) = (captures.get(1), captures.get(2)) {
            attrs.named.insert(name.as_str().to_string(), value.as_str().to_string());
        } else if let (Some(name), Some(value)) = (captures.get(3), captures.get(4)) {
            attrs.named.insert(name.as_str().to_string(), value.as_str().to_string());
        } else if let (Some(name), Some(value)) = (captures.get(5), captures.get(6)) {
            attrs.named.insert(name.as_str().to_string(), value.as_str().to_string());
        } else if let Some(value) =
            captures.get(7).or_else(|| captures.get(8)).or_else(|| captures.get(9))
        {
            attrs.positional.push(value.as_str().to_string());
        }
    }

    attrs
}
