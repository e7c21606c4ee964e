//! Downloading catalog sources into a pipeline, with freshness caching.
//!
//! [`SourcePipeline::get`] turns `(source name, size label)` into a local
//! [`Image`]:
//!
//! 1. the cache file is `<images_dir>/<normalized name>_<size>.jpg`
//! 2. if it exists and is younger than the source's `interval`, it is
//!    reused without touching the network
//! 3. otherwise the transfer tool downloads the URL over it
//!
//! Age is wall-clock time since the file's modification time, in whole
//! seconds. A modification time in the future (clock moved backwards, file
//! copied from another machine) counts as stale, so the file is fetched
//! again. An interval of 0 always downloads. Interrupted or corrupt
//! downloads are not detected; the next probe will fail on them.

use crate::catalog::{Catalog, CatalogError, EXPECTED_EXTENSION, normalize_name};
use crate::command::{self, CommandError, Invocation};
use crate::imaging::{Image, ImageBackend};
use crate::output;
use crate::pipeline::{Pipeline, PipelineError};
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("Download failed: {0}")]
    Transfer(#[from] CommandError),
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{name} image is only {height}px tall, no room to crop a {bar}px info bar")]
    ShorterThanInfoBar {
        name: &'static str,
        height: u32,
        bar: u32,
    },
}

/// Something that can fetch a URL into a local file, replacing it.
pub trait Transfer {
    fn download(&self, url: &str, dest: &Path) -> Result<(), CommandError>;
}

impl<T: Transfer + ?Sized> Transfer for &T {
    fn download(&self, url: &str, dest: &Path) -> Result<(), CommandError> {
        (**self).download(url, dest)
    }
}

/// Downloads with `curl` (or a compatible program) as
/// `<program> <args...> -o <dest> <url>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurlTransfer {
    program: String,
    args: Vec<String>,
}

impl CurlTransfer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn invocation(&self, url: &str, dest: &Path) -> Invocation {
        Invocation::new(&self.program)
            .args(&self.args)
            .arg("-o")
            .arg(dest)
            .arg(url)
    }
}

impl Default for CurlTransfer {
    fn default() -> Self {
        Self::new("curl", Vec::new())
    }
}

impl Transfer for CurlTransfer {
    fn download(&self, url: &str, dest: &Path) -> Result<(), CommandError> {
        command::run_echoed(&self.invocation(url, dest))
    }
}

/// State of a cached download relative to its source interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Missing,
    Fresh { age_secs: u64 },
    /// `age_secs` is `None` when the modification time is in the future.
    Stale { age_secs: Option<u64> },
}

/// Classify the file at `path` as of `now`.
pub fn freshness(path: &Path, interval_secs: u64, now: SystemTime) -> std::io::Result<Freshness> {
    if !path.is_file() {
        return Ok(Freshness::Missing);
    }
    let modified = std::fs::metadata(path)?.modified()?;
    Ok(match now.duration_since(modified) {
        Ok(age) if age.as_secs() < interval_secs => Freshness::Fresh {
            age_secs: age.as_secs(),
        },
        Ok(age) => Freshness::Stale {
            age_secs: Some(age.as_secs()),
        },
        Err(_) => Freshness::Stale { age_secs: None },
    })
}

/// Cache filename for a source at a size label.
pub fn cache_filename(source_name: &str, size: &str) -> String {
    format!("{}_{size}.{EXPECTED_EXTENSION}", normalize_name(source_name))
}

/// A [`Pipeline`] that can also pull images from a source [`Catalog`].
///
/// Derefs to the inner pipeline, so every transform is available directly.
pub struct SourcePipeline<B, T> {
    pipeline: Pipeline<B>,
    catalog: Catalog,
    transfer: T,
    force_download: bool,
    downloads: u32,
}

impl<B: ImageBackend, T: Transfer> SourcePipeline<B, T> {
    /// The catalog is validated before this is called, so no `get` can run
    /// against a broken catalog.
    pub fn new(pipeline: Pipeline<B>, catalog: Catalog, transfer: T) -> Self {
        Self {
            pipeline,
            catalog,
            transfer,
            force_download: false,
            downloads: 0,
        }
    }

    /// Ignore freshness and download on every `get`.
    pub fn force_download(mut self, force: bool) -> Self {
        self.force_download = force;
        self
    }

    /// Number of downloads performed so far.
    pub fn downloads(&self) -> u32 {
        self.downloads
    }

    /// Fetch `source_name` at `size`, reusing a fresh cached copy.
    pub fn get(&mut self, source_name: &str, size: &str) -> Result<Image, FetchError> {
        let source = self.catalog.source(source_name)?;
        let url = source.url_for(size)?.to_string();
        let interval = source.interval;

        let filename = cache_filename(source_name, size);
        let path = self.pipeline.image_path(&filename);
        self.pipeline.ensure_images_dir()?;

        if !self.force_download {
            let state = freshness(&path, interval, SystemTime::now()).map_err(|source| {
                FetchError::Io {
                    path: path.clone(),
                    source,
                }
            })?;
            tracing::debug!(file = %filename, ?state, interval, "cache check");
            if let Freshness::Fresh { age_secs } = state {
                output::print_download_skip(&filename, age_secs);
                return Ok(self.pipeline.open(path)?);
            }
        }

        self.transfer.download(&url, &path)?;
        self.downloads += 1;
        Ok(self.pipeline.open(path)?)
    }
}

impl<B, T> Deref for SourcePipeline<B, T> {
    type Target = Pipeline<B>;

    fn deref(&self) -> &Pipeline<B> {
        &self.pipeline
    }
}

impl<B, T> DerefMut for SourcePipeline<B, T> {
    fn deref_mut(&mut self) -> &mut Pipeline<B> {
        &mut self.pipeline
    }
}
