/// Engine configuration, site URLs and typed override hooks.
pub mod config;

/// Constants used throughout the crate.
pub mod constants;

/// Defines custom error types.
pub mod error;

/// On-disk cache of resolved template sources.
pub mod cache;

/// Template resolution across the configured search folders.
pub mod loader;

/// Template helper filters and functions.
pub mod filters;

/// Shared templating environment bootstrap and render plumbing.
pub mod engine;

/// Fluent per-render view builder.
pub mod view;

/// Inline shortcode scanning and expansion.
pub mod shortcode;
