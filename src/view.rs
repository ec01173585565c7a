use indexmap::IndexMap;
use log::warn;
use serde::Serialize;
use std::io::Write;

use crate::constants::TEMPLATE_SUFFIX;
use crate::engine::ViewEngine;
use crate::error::Result;

/// How a view's template reference is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    /// Resolved by name through the engine's search folders.
    File,
    /// Literal template source, compiled anonymously.
    Inline,
}

impl TemplateKind {
    fn of(template: &str) -> Self {
        let suffix = template
            .len()
            .checked_sub(TEMPLATE_SUFFIX.len())
            .and_then(|start| template.get(start..));
        match suffix {
            Some(suffix) if suffix.eq_ignore_ascii_case(TEMPLATE_SUFFIX) => {
                TemplateKind::File
            }
            _ => TemplateKind::Inline,
        }
    }
}

/// Fluent builder for one render: a template reference, an accumulating
/// variable bag and a shortcode toggle. Cheap and short-lived; built,
/// rendered, discarded.
pub struct View<'e> {
    engine: &'e ViewEngine,
    template: String,
    kind: TemplateKind,
    vars: IndexMap<String, serde_json::Value>,
    process_shortcodes: bool,
}

impl<'e> View<'e> {
    /// Starts a view. `template` is either a file name (recognized by its
    /// suffix, case-insensitively) or literal template source; the kind is
    /// decided here and never re-derived.
    pub fn with(engine: &'e ViewEngine, template: impl Into<String>) -> Self {
        let template = template.into();
        let kind = TemplateKind::of(&template);
        Self {
            engine,
            template,
            kind,
            vars: IndexMap::new(),
            process_shortcodes: true,
        }
    }

    pub fn kind(&self) -> TemplateKind {
        self.kind
    }

    /// Adds one variable. Values that fail to serialize are dropped with a
    /// warning.
    pub fn add_var(mut self, name: impl Into<String>, value: impl Serialize) -> Self {
        let name = name.into();
        match serde_json::to_value(value) {
            Ok(value) => {
                self.vars.insert(name, value);
            }
            Err(err) => warn!("Dropping variable '{name}': {err}"),
        }
        self
    }

    /// Merges a map of variables; colliding keys are overwritten.
    /// Non-object inputs are ignored with a warning.
    pub fn add_vars(mut self, vars: impl Serialize) -> Self {
        match serde_json::to_value(vars) {
            Ok(serde_json::Value::Object(map)) => {
                for (name, value) in map {
                    self.vars.insert(name, value);
                }
            }
            Ok(other) => warn!("Ignoring non-object variables: {other}"),
            Err(err) => warn!("Ignoring variables: {err}"),
        }
        self
    }

    /// Expand shortcodes in the rendered output. This is the default.
    pub fn enable_shortcodes(mut self) -> Self {
        self.process_shortcodes = true;
        self
    }

    /// Leave shortcode-like text in the rendered output untouched.
    pub fn disable_shortcodes(mut self) -> Self {
        self.process_shortcodes = false;
        self
    }

    /// Renders the view, propagating failures.
    pub fn try_render(&self) -> Result<String> {
        let vars = self.engine.render_vars(&self.vars);

        let html = match self.kind {
            TemplateKind::Inline => self.engine.render_source(&self.template, &vars)?,
            TemplateKind::File => self.engine.render_file(&self.template, &vars)?,
        };

        if self.process_shortcodes {
            Ok(self.engine.expand_shortcodes(&html))
        } else {
            Ok(html)
        }
    }

    /// Renders the view, degrading any failure to its message. A broken
    /// template yields visible diagnostic text instead of taking down the
    /// surrounding page.
    pub fn render(&self) -> String {
        match self.try_render() {
            Ok(html) => html,
            Err(err) => err.render_message(),
        }
    }

    /// Writes the rendered view to stdout. Write failures are swallowed.
    pub fn display(&self) {
        let mut stdout = std::io::stdout();
        let _ = stdout.write_all(self.render().as_bytes());
        let _ = stdout.flush();
    }
}
