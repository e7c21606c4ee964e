//! # skywall
//!
//! Composes desktop wallpapers from satellite full-disk imagery and local
//! photos. A pipeline directory holds a `recipe.toml`; running it downloads
//! the latest images (reusing recent downloads), cleans them up, lays them
//! out for the monitor arrangement, and sets the result as the desktop
//! background.
//!
//! # Architecture: Recipe → Pipeline → ImageMagick
//!
//! ```text
//! pipelines/simple/recipe.toml
//!        │ parsed by recipe, run step by step
//!        ▼
//! SourcePipeline (fetch)  ── curl ──▶ images/GOES-East_Full_Disk_large.jpg
//!        │ derefs to
//!        ▼
//! Pipeline ── MagickBackend ──▶ images/generated0.png, generated1.png, ...
//!        │
//!        ▼
//! desktop (xloadimage / gsettings / gconftool-2 / xfconf-query)
//! ```
//!
//! Every image is a file on disk plus the dimensions probed from it. Every
//! transform writes a new `generatedN` file, so intermediate images stay
//! around for inspection and any of them can be reused later in a recipe.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`geometry`] | Positions, sizes, and aspect-preserving size arithmetic |
//! | [`imaging`] | [`imaging::Image`] handles and the ImageMagick backend |
//! | [`pipeline`] | Counter-named transforms: crop, blank, place, resize, convert |
//! | [`catalog`] | Named image sources (`sources.json`) and their validation |
//! | [`fetch`] | Downloads with freshness caching, layered over the pipeline |
//! | [`satellite`] | Info-bar and logo cleanup for full-disk images |
//! | [`desktop`] | Setting the background per desktop environment, and viewing |
//! | [`recipe`] | `recipe.toml` parsing and step-by-step execution |
//! | [`config`] | `skywall.toml` loading and merging over stock defaults |
//! | [`command`] | Echo-then-run wrapper for every external program |
//! | [`output`] | Operator-facing console lines |
//!
//! # Design Decisions
//!
//! ## External Tools, Not Decoders
//!
//! All raster work is done by ImageMagick, and all downloads by curl. The
//! binary never decodes a pixel. Every command is echoed before it runs, so
//! a failing step can be reproduced by pasting the printed line into a
//! shell.
//!
//! ## PNG Until the Last Step
//!
//! Intermediate files are PNG forced to RGBA, so chaining many transforms
//! never compounds JPEG artifacts and all composites see the same color
//! type. Recipes convert to JPG only for the final image handed to the
//! desktop.

pub mod catalog;
pub mod command;
pub mod config;
pub mod desktop;
pub mod fetch;
pub mod geometry;
pub mod imaging;
pub mod output;
pub mod pipeline;
pub mod recipe;
pub mod satellite;
