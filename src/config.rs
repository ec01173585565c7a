use crate::constants::AJAX_ENDPOINT;
use crate::error::Result;
use crate::shortcode::ShortcodeHandler;
use minijinja::Environment;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// Override for a resolved boolean setting.
pub type FlagHook = Arc<dyn Fn(bool) -> bool + Send + Sync>;

/// Override for the template search folder list.
pub type FoldersHook = Arc<dyn Fn(Vec<PathBuf>) -> Vec<PathBuf> + Send + Sync>;

/// Override for a resolved path.
pub type PathHook = Arc<dyn Fn(PathBuf) -> PathBuf + Send + Sync>;

/// Override for a variable map; may rewrite or replace it wholesale.
pub type VarsHook = Arc<dyn Fn(serde_json::Value) -> serde_json::Value + Send + Sync>;

/// Final-say override for the built templating environment.
pub type EnvironmentHook =
    Arc<dyn Fn(Environment<'static>) -> Environment<'static> + Send + Sync>;

/// Backing for the `__` and `_x` template functions. The second argument is
/// the disambiguation context, when one was given.
pub type Translator = Arc<dyn Fn(&str, Option<&str>) -> String + Send + Sync>;

/// Site-wide URLs injected into every render under `_site.urls`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SiteUrls {
    /// Base URI of the active theme's assets.
    pub theme: String,
    /// Endpoint for ajax form posts.
    pub ajax: String,
    /// Site home URL.
    pub home: String,
}

impl SiteUrls {
    /// Derives the theme and ajax URLs from the site home URL.
    ///
    /// # Arguments
    /// * `home` - Site home URL
    /// * `theme_path` - Path of the theme assets relative to `home`
    pub fn rooted_at(home: &Url, theme_path: &str) -> Result<Self> {
        Ok(Self {
            theme: home.join(theme_path)?.to_string(),
            ajax: home.join(AJAX_ENDPOINT)?.to_string(),
            home: home.to_string(),
        })
    }
}

/// Configuration consumed by [`ViewEngine::new`](crate::engine::ViewEngine::new).
///
/// Replaces the host's named filter hooks with typed override callbacks,
/// one field per extension point. Every hook receives the value this crate
/// resolved and may return it changed or replaced; hooks that are not set
/// leave the value untouched.
pub struct EngineConfig {
    pub(crate) template_folder: Option<PathBuf>,
    pub(crate) default_folder: Option<PathBuf>,
    pub(crate) debug: bool,
    pub(crate) cache_dir: Option<PathBuf>,
    pub(crate) site: SiteUrls,
    pub(crate) translate: Translator,
    pub(crate) debug_hook: Option<FlagHook>,
    pub(crate) cache_hook: Option<FlagHook>,
    pub(crate) folders_hook: Option<FoldersHook>,
    pub(crate) cache_dir_hook: Option<PathHook>,
    pub(crate) environment_hook: Option<EnvironmentHook>,
    pub(crate) site_vars_hook: Option<VarsHook>,
    pub(crate) render_vars_hook: Option<VarsHook>,
    pub(crate) shortcodes: Vec<(String, ShortcodeHandler)>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            template_folder: None,
            default_folder: None,
            debug: false,
            cache_dir: None,
            site: SiteUrls::default(),
            translate: Arc::new(|text: &str, _context: Option<&str>| text.to_string()),
            debug_hook: None,
            cache_hook: None,
            folders_hook: None,
            cache_dir_hook: None,
            environment_hook: None,
            site_vars_hook: None,
            render_vars_hook: None,
            shortcodes: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folder searched first for file templates. Empty paths are ignored.
    pub fn template_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        let folder = folder.into();
        self.template_folder =
            if folder.as_os_str().is_empty() { None } else { Some(folder) };
        self
    }

    /// Conventional fallback folder; searched only if it exists on disk
    /// when the engine is built.
    pub fn default_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.default_folder = Some(folder.into());
        self
    }

    /// Seed for the debug setting. Caching seeds from its negation.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Directory for the on-disk source cache. Defaults to `twig_cache`
    /// under the system temporary directory.
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Site URLs injected into every render as `_site.urls`.
    pub fn site(mut self, site: SiteUrls) -> Self {
        self.site = site;
        self
    }

    /// Translation backing for the `__` and `_x` template functions.
    /// Defaults to the identity translation.
    pub fn translate(
        mut self,
        translate: impl Fn(&str, Option<&str>) -> String + Send + Sync + 'static,
    ) -> Self {
        self.translate = Arc::new(translate);
        self
    }

    /// Overrides the resolved debug flag.
    pub fn debug_hook(mut self, hook: impl Fn(bool) -> bool + Send + Sync + 'static) -> Self {
        self.debug_hook = Some(Arc::new(hook));
        self
    }

    /// Overrides the resolved cache flag.
    pub fn cache_hook(mut self, hook: impl Fn(bool) -> bool + Send + Sync + 'static) -> Self {
        self.cache_hook = Some(Arc::new(hook));
        self
    }

    /// Rewrites the template search folder list. Order is preserved by the
    /// resolver: the first folder containing a name wins.
    pub fn folders_hook(
        mut self,
        hook: impl Fn(Vec<PathBuf>) -> Vec<PathBuf> + Send + Sync + 'static,
    ) -> Self {
        self.folders_hook = Some(Arc::new(hook));
        self
    }

    /// Overrides the resolved cache directory.
    pub fn cache_dir_hook(
        mut self,
        hook: impl Fn(PathBuf) -> PathBuf + Send + Sync + 'static,
    ) -> Self {
        self.cache_dir_hook = Some(Arc::new(hook));
        self
    }

    /// Final say on the built environment; may register additional filters,
    /// functions or globals before the engine is sealed.
    pub fn environment_hook(
        mut self,
        hook: impl Fn(Environment<'static>) -> Environment<'static> + Send + Sync + 'static,
    ) -> Self {
        self.environment_hook = Some(Arc::new(hook));
        self
    }

    /// Rewrites the `_site` context before it is merged under caller vars.
    /// May replace the injected entries entirely.
    pub fn site_vars_hook(
        mut self,
        hook: impl Fn(serde_json::Value) -> serde_json::Value + Send + Sync + 'static,
    ) -> Self {
        self.site_vars_hook = Some(Arc::new(hook));
        self
    }

    /// Rewrites the final merged variable map on every render, with final
    /// say over all keys.
    pub fn render_vars_hook(
        mut self,
        hook: impl Fn(serde_json::Value) -> serde_json::Value + Send + Sync + 'static,
    ) -> Self {
        self.render_vars_hook = Some(Arc::new(hook));
        self
    }

    /// Registers an additional shortcode tag.
    pub fn shortcode(
        mut self,
        tag: impl Into<String>,
        handler: impl Fn(
                &crate::engine::ViewEngine,
                &crate::shortcode::ShortcodeAttrs,
                Option<&str>,
            ) -> String
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.shortcodes.push((tag.into(), Arc::new(handler)));
        self
    }
}

/// Applies an optional override hook to a resolved value.
pub(crate) fn apply<T>(hook: Option<&(dyn Fn(T) -> T + Send + Sync)>, value: T) -> T {
    match hook {
        Some(hook) => hook(value),
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_urls_derive_from_home() {
        let home = Url::parse("https://example.com/").unwrap();
        let site = SiteUrls::rooted_at(&home, "wp-content/themes/genie/").unwrap();

        assert_eq!(site.home, "https://example.com/");
        assert_eq!(site.ajax, "https://example.com/wp-admin/admin-ajax.php");
        assert_eq!(site.theme, "https://example.com/wp-content/themes/genie/");
    }

    #[test]
    fn apply_leaves_values_alone_without_a_hook() {
        assert!(apply(None::<&(dyn Fn(bool) -> bool + Send + Sync)>, true));
        let negate: FlagHook = Arc::new(|value| !value);
        assert!(!apply(Some(negate.as_ref()), true));
    }
}
