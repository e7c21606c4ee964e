//! Recipes: the per-directory description of what a pipeline does.
//!
//! A pipeline directory holds a `recipe.toml` with an ordered list of
//! steps. Each step names an operation (`op`) and may bind its result to a
//! name (`as`) that later steps refer to. Binding a name again replaces the
//! earlier value, so an accumulating canvas can keep one name:
//!
//! ```toml
//! [[step]]
//! op = "clean"
//! satellite = "goes-east"
//! as = "earth"
//!
//! [[step]]
//! op = "resize"
//! image = "earth"
//! size = { scale = { fit = { of = "earth" }, within = [1920, 1080] }, factor = 0.9 }
//! as = "earth"
//!
//! [[step]]
//! op = "blank"
//! color = "black"
//! size = [1920, 1080]
//! as = "bg"
//!
//! [[step]]
//! op = "place"
//! overlay = "earth"
//! offset = { center = { of = "earth" }, frame = [1920, 1080] }
//! base = "bg"
//! as = "bg"
//!
//! [[step]]
//! op = "set_background"
//! image = "bg"
//! desktop = "gnome3"
//! ```
//!
//! ## Size expressions
//!
//! | Form | Value |
//! |---|---|
//! | `[w, h]` | literal |
//! | `{ of = "name" }` | size of a bound image |
//! | `{ fit = S, within = S }` | [`scale_to_fit`] |
//! | `{ to_width = S, width = N }` | [`scale_to_width`] |
//! | `{ to_height = S, height = N }` | [`scale_to_height`] |
//! | `{ scale = S, factor = F }` | [`scale`] |
//!
//! ## Position expressions
//!
//! | Form | Value |
//! |---|---|
//! | `[x, y]` | literal |
//! | `{ center = S, frame = S, offset = P }` | [`centering_offset`], `offset` optional |
//! | `{ add = [P, P] }` | sum |
//!
//! There is no general arithmetic. Derived constants (half a monitor, a
//! monitor plus a margin) are written out as literals.

use crate::desktop::{Desktop, DesktopError, DesktopKind, Screen};
use crate::fetch::{FetchError, SourcePipeline, Transfer};
use crate::geometry::{
    Position, Size, centering_offset, scale, scale_to_fit, scale_to_height, scale_to_width,
};
use crate::imaging::{Image, ImageBackend, ImageFormat};
use crate::output;
use crate::pipeline::PipelineError;
use crate::satellite::Satellite;
use serde::de::{self, Deserializer};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const RECIPE_FILENAME: &str = "recipe.toml";

#[derive(Error, Debug)]
pub enum RecipeError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid recipe {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("No image is bound to \"{0}\"")]
    UnknownBinding(String),
    #[error("Scale factor must be a positive number, got {0}")]
    InvalidFactor(f64),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Desktop(#[from] DesktopError),
    #[error("Step {index} ({op}) failed: {source}")]
    Step {
        index: usize,
        op: &'static str,
        #[source]
        source: Box<RecipeError>,
    },
}

impl RecipeError {
    /// The underlying error, without step context.
    pub fn root(&self) -> &RecipeError {
        match self {
            RecipeError::Step { source, .. } => source.root(),
            other => other,
        }
    }
}

/// A parsed `recipe.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Recipe {
    #[serde(rename = "step", default)]
    pub steps: Vec<Step>,
}

/// One `[[step]]` table: an `op` with its fields, plus an optional `as`.
#[derive(Debug, Clone)]
pub struct Step {
    pub binding: Option<String>,
    pub action: Action,
}

impl<'de> Deserialize<'de> for Step {
    // `as` is removed first; every remaining key must be a field of the op.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut table = toml::Table::deserialize(deserializer)?;
        let binding = match table.remove("as") {
            None => None,
            Some(toml::Value::String(name)) => Some(name),
            Some(other) => {
                return Err(de::Error::custom(format!(
                    "`as` must be a string, found {}",
                    other.type_str()
                )));
            }
        };
        let action = Action::deserialize(toml::Value::Table(table)).map_err(de::Error::custom)?;
        Ok(Step { binding, action })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", deny_unknown_fields)]
pub enum Action {
    Get {
        source: String,
        size: String,
    },
    /// A local image; relative paths are resolved against the pipeline
    /// directory.
    Open {
        path: PathBuf,
    },
    Clean {
        satellite: Satellite,
    },
    Crop {
        image: String,
        offset: PosExpr,
        size: SizeExpr,
    },
    Blank {
        color: String,
        size: SizeExpr,
    },
    Place {
        overlay: String,
        offset: PosExpr,
        base: String,
    },
    Resize {
        image: String,
        size: SizeExpr,
    },
    ToFormat {
        image: String,
        format: ImageFormat,
    },
    SetBackground {
        image: String,
        desktop: DesktopKind,
        monitor: Option<String>,
    },
    View {
        image: String,
    },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Get { .. } => "get",
            Action::Open { .. } => "open",
            Action::Clean { .. } => "clean",
            Action::Crop { .. } => "crop",
            Action::Blank { .. } => "blank",
            Action::Place { .. } => "place",
            Action::Resize { .. } => "resize",
            Action::ToFormat { .. } => "to_format",
            Action::SetBackground { .. } => "set_background",
            Action::View { .. } => "view",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged, deny_unknown_fields)]
pub enum SizeExpr {
    Literal([u32; 2]),
    Of {
        of: String,
    },
    Fit {
        fit: Box<SizeExpr>,
        within: Box<SizeExpr>,
    },
    ToWidth {
        to_width: Box<SizeExpr>,
        width: u32,
    },
    ToHeight {
        to_height: Box<SizeExpr>,
        height: u32,
    },
    Scale {
        scale: Box<SizeExpr>,
        factor: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged, deny_unknown_fields)]
pub enum PosExpr {
    Literal([i32; 2]),
    Center {
        center: SizeExpr,
        frame: SizeExpr,
        offset: Option<Box<PosExpr>>,
    },
    Add {
        add: Box<[PosExpr; 2]>,
    },
}

/// Images bound by name during a run.
#[derive(Debug, Default)]
pub struct Bindings {
    images: HashMap<String, Image>,
}

impl Bindings {
    pub fn get(&self, name: &str) -> Result<&Image, RecipeError> {
        self.images
            .get(name)
            .ok_or_else(|| RecipeError::UnknownBinding(name.to_string()))
    }

    pub fn bind(&mut self, name: impl Into<String>, image: Image) {
        self.images.insert(name.into(), image);
    }
}

impl SizeExpr {
    pub fn eval(&self, bindings: &Bindings) -> Result<Size, RecipeError> {
        Ok(match self {
            SizeExpr::Literal(wh) => Size::from(*wh),
            SizeExpr::Of { of } => bindings.get(of)?.size(),
            SizeExpr::Fit { fit, within } => {
                scale_to_fit(fit.eval(bindings)?, within.eval(bindings)?)
            }
            SizeExpr::ToWidth { to_width, width } => {
                scale_to_width(to_width.eval(bindings)?, *width)
            }
            SizeExpr::ToHeight { to_height, height } => {
                scale_to_height(to_height.eval(bindings)?, *height)
            }
            SizeExpr::Scale { scale: inner, factor } => {
                if !factor.is_finite() || *factor <= 0.0 {
                    return Err(RecipeError::InvalidFactor(*factor));
                }
                scale(inner.eval(bindings)?, *factor)
            }
        })
    }
}

impl PosExpr {
    pub fn eval(&self, bindings: &Bindings) -> Result<Position, RecipeError> {
        Ok(match self {
            PosExpr::Literal(xy) => Position::from(*xy),
            PosExpr::Center {
                center,
                frame,
                offset,
            } => {
                let frame_offset = match offset {
                    Some(pos) => pos.eval(bindings)?,
                    None => Position::ORIGIN,
                };
                centering_offset(center.eval(bindings)?, frame.eval(bindings)?, frame_offset)
            }
            PosExpr::Add { add } => add[0].eval(bindings)? + add[1].eval(bindings)?,
        })
    }
}

impl Recipe {
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, RecipeError> {
        toml::from_str(text).map_err(|source| RecipeError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read `recipe.toml` from a pipeline directory.
    pub fn load(pipeline_dir: &Path) -> Result<Self, RecipeError> {
        let path = pipeline_dir.join(RECIPE_FILENAME);
        let text = std::fs::read_to_string(&path).map_err(|source| RecipeError::Io {
            path: path.clone(),
            source,
        })?;
        Self::from_toml(&text, &path)
    }
}

/// Run every step in order, stopping at the first failure.
pub fn run_recipe<B, T, S>(
    recipe: &Recipe,
    pipeline: &mut SourcePipeline<B, T>,
    pipeline_dir: &Path,
    screen: &S,
) -> Result<Bindings, RecipeError>
where
    B: ImageBackend,
    T: Transfer,
    S: Screen + ?Sized,
{
    let mut bindings = Bindings::default();
    for (i, step) in recipe.steps.iter().enumerate() {
        let index = i + 1;
        let op = step.action.name();
        output::print_step(index, op, step.binding.as_deref());

        let result = run_step(&step.action, pipeline, pipeline_dir, screen, &bindings)
            .map_err(|source| RecipeError::Step {
                index,
                op,
                source: Box::new(source),
            })?;
        match (result, &step.binding) {
            (Some(image), Some(name)) => bindings.bind(name, image),
            (None, Some(name)) => {
                tracing::warn!(step = index, op, binding = %name, "step produces no image; binding ignored");
            }
            _ => {}
        }
    }
    Ok(bindings)
}

fn run_step<B, T, S>(
    action: &Action,
    pipeline: &mut SourcePipeline<B, T>,
    pipeline_dir: &Path,
    screen: &S,
    bindings: &Bindings,
) -> Result<Option<Image>, RecipeError>
where
    B: ImageBackend,
    T: Transfer,
    S: Screen + ?Sized,
{
    let image = match action {
        Action::Get { source, size } => pipeline.get(source, size)?,
        Action::Open { path } => pipeline.open(pipeline_dir.join(path))?,
        Action::Clean { satellite } => pipeline.clean_large(satellite.profile())?,
        Action::Crop {
            image,
            offset,
            size,
        } => {
            let (offset, size) = (offset.eval(bindings)?, size.eval(bindings)?);
            pipeline.crop(bindings.get(image)?, offset, size)?
        }
        Action::Blank { color, size } => pipeline.blank(color, size.eval(bindings)?)?,
        Action::Place {
            overlay,
            offset,
            base,
        } => {
            let offset = offset.eval(bindings)?;
            pipeline.place(bindings.get(overlay)?, offset, bindings.get(base)?)?
        }
        Action::Resize { image, size } => {
            let size = size.eval(bindings)?;
            pipeline.resize(bindings.get(image)?, size)?
        }
        Action::ToFormat { image, format } => pipeline.to_format(bindings.get(image)?, *format)?,
        Action::SetBackground {
            image,
            desktop,
            monitor,
        } => {
            let desktop = Desktop::from_kind(*desktop, monitor.clone())?;
            screen.set_background(&desktop, bindings.get(image)?)?;
            return Ok(None);
        }
        Action::View { image } => {
            screen.view(bindings.get(image)?)?;
            return Ok(None);
        }
    };
    Ok(Some(image))
}
