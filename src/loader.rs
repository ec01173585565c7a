use log::debug;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::cache::SourceCache;
use crate::error::Result;

/// Resolves a template name to its source through the search folders.
///
/// Folders are probed in order; the first one containing `name` wins. When a
/// cache is given it answers fresh entries without touching the folder chain
/// and is written through on every miss.
///
/// # Returns
/// * `Ok(Some(source))` - the template's source text
/// * `Ok(None)` - no folder contains `name`, or the name is unsafe
pub fn resolve(
    folders: &[PathBuf],
    cache: Option<&SourceCache>,
    name: &str,
) -> Result<Option<String>> {
    if !is_safe_name(name) {
        debug!("Refusing template name '{name}'.");
        return Ok(None);
    }

    if let Some(cache) = cache {
        if let Some(source) = cache.load(name) {
            return Ok(Some(source));
        }
    }

    for folder in folders {
        let path = folder.join(name);
        if path.is_file() {
            let source = fs::read_to_string(&path)?;
            if let Some(cache) = cache {
                cache.store(name, &path, &source);
            }
            return Ok(Some(source));
        }
    }

    Ok(None)
}

/// Template names must stay inside the search folders: relative, no parent
/// components.
fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && Path::new(name)
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
}
