use indexmap::IndexMap;
use minijinja::{AutoEscape, Environment};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cache::SourceCache;
use crate::config::{apply, EngineConfig, SiteUrls, VarsHook};
use crate::constants::{CACHE_DIR_NAME, VIEW_SHORTCODE};
use crate::error::Result;
use crate::filters;
use crate::loader;
use crate::shortcode::{self, ShortcodeRegistry};
use crate::view::View;

/// Shared templating environment.
///
/// Built once at application bootstrap from an [`EngineConfig`], immutable
/// afterwards. Every [`View`] renders against an engine handle; there is no
/// hidden global instance.
pub struct ViewEngine {
    env: Environment<'static>,
    folders: Vec<PathBuf>,
    source_cache: Option<SourceCache>,
    debug: bool,
    site: SiteUrls,
    site_vars_hook: Option<VarsHook>,
    render_vars_hook: Option<VarsHook>,
    shortcodes: ShortcodeRegistry,
}

impl ViewEngine {
    /// Builds the templating environment.
    ///
    /// Resolves the search folders, the debug and cache settings and the
    /// cache directory through their override hooks, constructs the
    /// environment with autoescaping off, registers the template helper
    /// surface and the built-in view shortcode, and gives the environment
    /// hook final say.
    ///
    /// # Errors
    /// Fails only when the cache directory cannot be created. A bad
    /// template reference surfaces at render time, not here.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let mut folders = Vec::new();
        if let Some(folder) = config.template_folder {
            folders.push(folder);
        }
        if let Some(folder) = config.default_folder {
            if folder.exists() {
                folders.push(folder);
            }
        }
        let folders = apply(config.folders_hook.as_deref(), folders);

        let debug = apply(config.debug_hook.as_deref(), config.debug);
        let cache = apply(config.cache_hook.as_deref(), !config.debug);

        let source_cache = if cache {
            let dir = config
                .cache_dir
                .unwrap_or_else(|| std::env::temp_dir().join(CACHE_DIR_NAME));
            let dir = apply(config.cache_dir_hook.as_deref(), dir);
            Some(SourceCache::new(dir, &folders)?)
        } else {
            None
        };

        let mut env = Environment::new();
        env.set_auto_escape_callback(|_name| AutoEscape::None);
        if debug {
            env.set_debug(true);
        }

        let search = folders.clone();
        let loader_cache = source_cache.clone();
        env.set_loader(move |name| {
            match loader::resolve(&search, loader_cache.as_ref(), name) {
                Ok(found) => Ok(found),
                Err(err) => Err(minijinja::Error::new(
                    minijinja::ErrorKind::InvalidOperation,
                    format!("could not load template '{name}'"),
                )
                .with_source(err)),
            }
        });

        filters::register(&mut env, config.translate.clone());

        let env = match config.environment_hook {
            Some(hook) => hook(env),
            None => env,
        };

        let mut shortcodes = ShortcodeRegistry::new();
        shortcodes.register(VIEW_SHORTCODE, Arc::new(shortcode::view_shortcode));
        for (tag, handler) in config.shortcodes {
            shortcodes.register(tag, handler);
        }

        Ok(Self {
            env,
            folders,
            source_cache,
            debug,
            site: config.site,
            site_vars_hook: config.site_vars_hook,
            render_vars_hook: config.render_vars_hook,
            shortcodes,
        })
    }

    /// Starts a view for a template reference.
    pub fn view(&self, template: impl Into<String>) -> View<'_> {
        View::with(self, template)
    }

    /// Checks template source against the engine's syntax rules. No
    /// variable resolution happens; only parsing.
    pub fn is_valid_twig(&self, source: &str) -> bool {
        self.env.template_from_str(source).is_ok()
    }

    /// Replaces every registered shortcode in `content` with its handler's
    /// output.
    pub fn expand_shortcodes(&self, content: &str) -> String {
        shortcode::expand(self, &self.shortcodes, content)
    }

    /// The resolved template search folders, in probe order.
    pub fn template_folders(&self) -> &[PathBuf] {
        &self.folders
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Assembles the final variable map for a render: `_site` (after its
    /// hook) merged under the caller's vars, then the render-vars hook with
    /// final say.
    pub(crate) fn render_vars(
        &self,
        vars: &IndexMap<String, serde_json::Value>,
    ) -> serde_json::Value {
        let urls = serde_json::to_value(&self.site).unwrap_or_default();
        let site = apply(self.site_vars_hook.as_deref(), json!({ "urls": urls }));

        let mut merged = serde_json::Map::new();
        merged.insert("_site".to_string(), site);
        for (name, value) in vars {
            merged.insert(name.clone(), value.clone());
        }

        apply(self.render_vars_hook.as_deref(), serde_json::Value::Object(merged))
    }

    pub(crate) fn render_source(
        &self,
        source: &str,
        vars: &serde_json::Value,
    ) -> Result<String> {
        // Cloned per render so nothing loaded here outlives the call.
        let env = self.env.clone();
        Ok(env.render_str(source, vars)?)
    }

    pub(crate) fn render_file(
        &self,
        name: &str,
        vars: &serde_json::Value,
    ) -> Result<String> {
        // Resolved here rather than through the environment's loader so
        // every render observes current file contents.
        let source = loader::resolve(&self.folders, self.source_cache.as_ref(), name)?;
        let Some(source) = source else {
            return Err(minijinja::Error::new(
                minijinja::ErrorKind::TemplateNotFound,
                format!("template {name:?} does not exist in the search folders"),
            )
            .into());
        };

        let env = self.env.clone();
        Ok(env.render_named_str(name, &source, vars)?)
    }
}
