use std::fs;
use std::path::Path;

use rust_embed::Embed;
use tracing::{info, warn};

use crate::error::CatalogError;
use crate::quiz::question::Catalog;

#[derive(Embed)]
#[folder = "assets/catalog/"]
struct CatalogAssets;

/// Merge every bundled catalog file, in file-name order.
pub fn load_bundled() -> Result<Catalog, CatalogError> {
    let mut names: Vec<String> = CatalogAssets::iter()
        .filter(|n| n.ends_with(".json"))
        .map(|n| n.to_string())
        .collect();
    names.sort();

    let mut catalog = Catalog::new();
    for name in names {
        let Some(file) = CatalogAssets::get(&name) else {
            continue;
        };
        catalog.merge(parse(file.data.as_ref(), &name)?);
    }
    finalize(catalog)
}

pub fn load_file(path: &Path) -> Result<Catalog, CatalogError> {
    let bytes = fs::read(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    finalize(parse(&bytes, &path.display().to_string())?)
}

/// A user catalog replaces the bundled one entirely.
pub fn load(path: Option<&Path>) -> Result<Catalog, CatalogError> {
    match path {
        Some(path) => load_file(path),
        None => load_bundled(),
    }
}

pub fn parse(bytes: &[u8], origin: &str) -> Result<Catalog, CatalogError> {
    serde_json::from_slice(bytes).map_err(|source| CatalogError::Parse {
        origin: origin.to_string(),
        source,
    })
}

fn finalize(mut catalog: Catalog) -> Result<Catalog, CatalogError> {
    for (subject, topic, reason) in catalog.retain_valid() {
        warn!(%subject, %topic, %reason, "dropping invalid question");
    }
    if catalog.is_empty() {
        return Err(CatalogError::Empty);
    }
    info!(subjects = catalog.subjects().len(), "catalog loaded");
    Ok(catalog)
}
