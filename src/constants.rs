//! Constants used throughout the crate.

/// Template references ending in this suffix resolve from the search folders;
/// anything else is treated as inline template source.
pub const TEMPLATE_SUFFIX: &str = ".twig";

/// Directory name of the on-disk source cache.
pub const CACHE_DIR_NAME: &str = "twig_cache";

/// Tag name of the built-in view shortcode.
pub const VIEW_SHORTCODE: &str = "genie_view";

/// Path of the ajax endpoint relative to the site home URL.
pub const AJAX_ENDPOINT: &str = "wp-admin/admin-ajax.php";
