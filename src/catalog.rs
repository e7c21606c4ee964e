//! Catalog of downloadable image sources.
//!
//! A source is a named remote image available at one or more sizes, plus
//! how long a downloaded copy stays fresh:
//!
//! ```json
//! {
//!   "sources": [
//!     {
//!       "name": "GOES-East Full Disk",
//!       "url": { "large": "https://.../5424x5424.jpg" },
//!       "interval": 600
//!     }
//!   ]
//! }
//! ```
//!
//! ## Lookup order
//!
//! 1. `<pipeline_dir>/sources.json`, if present
//! 2. the stock catalog compiled into the binary (`sources.json` at the
//!    repository root)
//!
//! ## Validation
//!
//! Names end up in cache filenames with whitespace replaced by `_`, so both
//! the raw names and the normalized names must be unique; `"A B"` and
//! `"A_B"` would share `A_B_large.jpg`. Every URL must point at a `.jpg`,
//! since downloads are stored verbatim under a `.jpg` name. All of this is
//! checked when the catalog is built, before any download can happen.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name of a pipeline-local catalog override.
pub const CATALOG_FILENAME: &str = "sources.json";

/// Extension every source URL must carry; downloads are stored as-is.
pub const EXPECTED_EXTENSION: &str = "jpg";

const STOCK_CATALOG: &str = include_str!("../sources.json");

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid source catalog {origin}: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Name \"{0}\" is not unique in the sources list")]
    DuplicateName(String),
    #[error("Spaceless name \"{normalized}\" of \"{name}\" is not unique in the sources list")]
    DuplicateNormalizedName { name: String, normalized: String },
    #[error("Source \"{source_name}\" size \"{size}\" does not point at a .jpg file: {url}")]
    UnexpectedFormat {
        source_name: String,
        size: String,
        url: String,
    },
    #[error("Unknown image source \"{0}\"")]
    UnknownSource(String),
    #[error("Source \"{source_name}\" has no size \"{size}\" (available: {available})")]
    UnknownSize {
        source_name: String,
        size: String,
        available: String,
    },
}

/// One remote image source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceDescriptor {
    /// Display name, unique within the catalog.
    pub name: String,
    /// Size label (`"small"`, `"large"`, ...) → download URL.
    pub url: BTreeMap<String, String>,
    /// Seconds a downloaded copy is reused before fetching again.
    pub interval: u64,
}

impl SourceDescriptor {
    /// URL for a size label.
    pub fn url_for(&self, size: &str) -> Result<&str, CatalogError> {
        self.url
            .get(size)
            .map(String::as_str)
            .ok_or_else(|| CatalogError::UnknownSize {
                source_name: self.name.clone(),
                size: size.to_string(),
                available: self.url.keys().cloned().collect::<Vec<_>>().join(", "),
            })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    sources: Vec<SourceDescriptor>,
}

/// Replace every whitespace character with `_`, for use in filenames.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

fn has_expected_extension(url: &str) -> bool {
    // Ignore any query string or fragment.
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case(EXPECTED_EXTENSION))
}

/// A validated set of sources.
#[derive(Debug, Clone)]
pub struct Catalog {
    sources: Vec<SourceDescriptor>,
    origin: String,
}

impl Catalog {
    /// Validate a list of sources.
    pub fn from_sources(
        sources: Vec<SourceDescriptor>,
        origin: impl Into<String>,
    ) -> Result<Self, CatalogError> {
        assert_unique_names(&sources)?;
        assert_expected_formats(&sources)?;
        Ok(Self {
            sources,
            origin: origin.into(),
        })
    }

    /// Parse and validate catalog JSON.
    pub fn from_json(json: &str, origin: impl Into<String>) -> Result<Self, CatalogError> {
        let origin = origin.into();
        let file: CatalogFile = serde_json::from_str(json).map_err(|source| CatalogError::Json {
            origin: origin.clone(),
            source,
        })?;
        Self::from_sources(file.sources, origin)
    }

    /// The catalog shipped with skywall.
    pub fn stock() -> Result<Self, CatalogError> {
        Self::from_json(STOCK_CATALOG, "(built-in)")
    }

    /// The pipeline's own `sources.json` if it has one, else the stock
    /// catalog.
    pub fn load(pipeline_dir: &Path) -> Result<Self, CatalogError> {
        let path = pipeline_dir.join(CATALOG_FILENAME);
        if !path.is_file() {
            tracing::debug!("no {} in {}, using built-in catalog", CATALOG_FILENAME, pipeline_dir.display());
            return Self::stock();
        }
        let json = fs::read_to_string(&path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loading source catalog");
        Self::from_json(&json, path.display().to_string())
    }

    /// Where this catalog came from: a file path or `(built-in)`.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn sources(&self) -> &[SourceDescriptor] {
        &self.sources
    }

    /// Look up a source by its exact display name.
    pub fn source(&self, name: &str) -> Result<&SourceDescriptor, CatalogError> {
        self.sources
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| CatalogError::UnknownSource(name.to_string()))
    }
}

fn assert_unique_names(sources: &[SourceDescriptor]) -> Result<(), CatalogError> {
    let mut names = HashSet::new();
    let mut normalized_names = HashSet::new();
    for s in sources {
        let normalized = normalize_name(&s.name);
        if !names.insert(s.name.as_str()) {
            return Err(CatalogError::DuplicateName(s.name.clone()));
        }
        if !normalized_names.insert(normalized.clone()) {
            return Err(CatalogError::DuplicateNormalizedName {
                name: s.name.clone(),
                normalized,
            });
        }
    }
    Ok(())
}

fn assert_expected_formats(sources: &[SourceDescriptor]) -> Result<(), CatalogError> {
    for s in sources {
        for (size, url) in &s.url {
            if !has_expected_extension(url) {
                return Err(CatalogError::UnexpectedFormat {
                    source_name: s.name.clone(),
                    size: size.clone(),
                    url: url.clone(),
                });
            }
        }
    }
    Ok(())
}
