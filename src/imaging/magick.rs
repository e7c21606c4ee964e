//! ImageMagick backend.
//!
//! ## Dialects
//!
//! | Dialect | Transforms | Probe |
//! |---|---|---|
//! | **Modern** (ImageMagick 7) | `magick <args>` | `magick identify ...` |
//! | **Legacy** (ImageMagick 6) | `convert <args>` | `identify ...` |
//!
//! The dialect is resolved once at startup ([`Dialect::resolve`]) and handed
//! to [`MagickBackend::new`]; nothing looks it up again later.
//!
//! ## PNG color type
//!
//! ImageMagick picks a PNG color type heuristically (palette, grayscale,
//! RGB...) from the pixels it writes. A black logo patch would otherwise come
//! out as a 1-bit grayscale file and composite differently from a full-color
//! one, so every PNG output is forced to RGBA with `-define png:color-type=6`,
//! placed directly before the output path.

use super::backend::{BackendError, ImageBackend};
use super::params::{
    BlankParams, CompositeParams, ConvertParams, CropParams, ImageFormat, OutputFile,
    ResizeParams,
};
use crate::command::{self, Invocation};
use crate::geometry::{Position, Size};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Forces 8-bit RGBA output for PNG files.
const PNG_COLOR_TYPE: [&str; 2] = ["-define", "png:color-type=6"];

/// Which ImageMagick command-line form is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Legacy,
    Modern,
}

/// Dialect selection as written in config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectSetting {
    #[default]
    Auto,
    Legacy,
    Modern,
}

impl Dialect {
    /// Look for `magick`, then `convert`, on `PATH`.
    pub fn detect() -> Option<Dialect> {
        Self::detect_with(|program| which::which(program).is_ok())
    }

    fn detect_with(installed: impl Fn(&str) -> bool) -> Option<Dialect> {
        if installed("magick") {
            Some(Dialect::Modern)
        } else if installed("convert") {
            Some(Dialect::Legacy)
        } else {
            None
        }
    }

    /// Resolve a config setting to an installed dialect.
    ///
    /// An explicit setting is still checked against `PATH`, so a wrong
    /// choice fails at startup rather than on the first transform.
    pub fn resolve(setting: DialectSetting) -> Result<Dialect, BackendError> {
        Self::resolve_with(setting, |program| which::which(program).is_ok())
    }

    fn resolve_with(
        setting: DialectSetting,
        installed: impl Fn(&str) -> bool,
    ) -> Result<Dialect, BackendError> {
        let dialect = match setting {
            DialectSetting::Auto => Self::detect_with(&installed),
            DialectSetting::Legacy => Some(Dialect::Legacy).filter(|_| installed("convert")),
            DialectSetting::Modern => Some(Dialect::Modern).filter(|_| installed("magick")),
        };
        let dialect = dialect.ok_or(BackendError::ToolNotFound)?;
        tracing::debug!(?dialect, ?setting, "resolved ImageMagick dialect");
        Ok(dialect)
    }

    fn transform(self, args: Vec<String>) -> Invocation {
        match self {
            Dialect::Modern => Invocation::new("magick").args(args),
            Dialect::Legacy => Invocation::new("convert").args(args),
        }
    }

    fn identify(self, path: &Path) -> Invocation {
        let inv = match self {
            Dialect::Modern => Invocation::new("magick").arg("identify"),
            Dialect::Legacy => Invocation::new("identify"),
        };
        inv.args(["-ping", "-format", "%w %h\n"]).arg(path)
    }
}

/// `+X+Y` with explicit signs, so negative offsets render as `-X`.
fn offset_geometry(offset: Position) -> String {
    format!("{:+}{:+}", offset.x, offset.y)
}

fn crop_geometry(size: Size, offset: Position) -> String {
    format!("{}{}", size, offset_geometry(offset))
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Append the output path, preceded by the color-type define for PNG.
fn push_output(args: &mut Vec<String>, output: &OutputFile) {
    if output.format == ImageFormat::Png {
        args.extend(PNG_COLOR_TYPE.iter().map(|s| s.to_string()));
    }
    args.push(path_arg(&output.path));
}

pub(crate) fn crop_args(params: &CropParams) -> Vec<String> {
    let mut args = vec![
        path_arg(&params.source),
        "-crop".to_string(),
        crop_geometry(params.size, params.offset),
        // Drop the virtual canvas so the result sits at (0, 0) when composited.
        "+repage".to_string(),
    ];
    push_output(&mut args, &params.output);
    args
}

pub(crate) fn blank_args(params: &BlankParams) -> Vec<String> {
    let mut args = vec![
        "-size".to_string(),
        params.size.to_string(),
        format!("canvas:{}", params.color),
    ];
    push_output(&mut args, &params.output);
    args
}

pub(crate) fn composite_args(params: &CompositeParams) -> Vec<String> {
    let mut args = vec![
        path_arg(&params.base),
        path_arg(&params.overlay),
        "-geometry".to_string(),
        offset_geometry(params.offset),
        "-composite".to_string(),
    ];
    push_output(&mut args, &params.output);
    args
}

pub(crate) fn resize_args(params: &ResizeParams) -> Vec<String> {
    let mut args = vec![
        path_arg(&params.source),
        "-resize".to_string(),
        params.size.to_string(),
    ];
    push_output(&mut args, &params.output);
    args
}

pub(crate) fn convert_args(params: &ConvertParams) -> Vec<String> {
    let mut args = vec![path_arg(&params.source)];
    push_output(&mut args, &params.output);
    args
}

/// Parse `identify -format "%w %h\n"` output. Multi-frame files print one
/// line per frame; the first frame wins.
fn parse_identify(output: &str) -> Option<Size> {
    let line = output.lines().next()?;
    let mut parts = line.split_whitespace();
    let w = parts.next()?.parse().ok()?;
    let h = parts.next()?.parse().ok()?;
    Some(Size::new(w, h))
}

/// Runs every operation as a blocking ImageMagick subprocess.
#[derive(Debug, Clone, Copy)]
pub struct MagickBackend {
    dialect: Dialect,
}

impl MagickBackend {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    fn run(&self, args: Vec<String>) -> Result<(), BackendError> {
        command::run_echoed(&self.dialect.transform(args))?;
        Ok(())
    }
}

impl ImageBackend for MagickBackend {
    fn identify(&self, path: &Path) -> Result<Size, BackendError> {
        let out = command::capture(&self.dialect.identify(path))?;
        parse_identify(&out).ok_or_else(|| BackendError::Probe {
            path: path.display().to_string(),
            output: out,
        })
    }

    fn crop(&self, params: &CropParams) -> Result<(), BackendError> {
        self.run(crop_args(params))
    }

    fn blank(&self, params: &BlankParams) -> Result<(), BackendError> {
        self.run(blank_args(params))
    }

    fn composite(&self, params: &CompositeParams) -> Result<(), BackendError> {
        self.run(composite_args(params))
    }

    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
        self.run(resize_args(params))
    }

    fn convert(&self, params: &ConvertParams) -> Result<(), BackendError> {
        self.run(convert_args(params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn png(path: &str) -> OutputFile {
        OutputFile {
            path: PathBuf::from(path),
            format: ImageFormat::Png,
        }
    }

    // =========================================================================
    // Dialect detection
    // =========================================================================

    #[test]
    fn modern_wins_when_both_installed() {
        assert_eq!(Dialect::detect_with(|_| true), Some(Dialect::Modern));
    }

    #[test]
    fn convert_alone_is_legacy() {
        assert_eq!(
            Dialect::detect_with(|p| p == "convert"),
            Some(Dialect::Legacy)
        );
    }

    #[test]
    fn nothing_installed_detects_none() {
        assert_eq!(Dialect::detect_with(|_| false), None);
    }

    #[test]
    fn explicit_setting_must_be_installed() {
        let only_convert = |p: &str| p == "convert";
        assert_eq!(
            Dialect::resolve_with(DialectSetting::Legacy, only_convert).unwrap(),
            Dialect::Legacy
        );
        assert!(matches!(
            Dialect::resolve_with(DialectSetting::Modern, only_convert),
            Err(BackendError::ToolNotFound)
        ));
        assert!(matches!(
            Dialect::resolve_with(DialectSetting::Auto, |_| false),
            Err(BackendError::ToolNotFound)
        ));
    }

    #[test]
    fn dialects_pick_their_programs() {
        let legacy = Dialect::Legacy.transform(vec!["a.png".into(), "b.jpg".into()]);
        assert_eq!(legacy.program, "convert");
        assert_eq!(legacy.args, vec!["a.png", "b.jpg"]);

        let modern = Dialect::Modern.transform(vec!["a.png".into(), "b.jpg".into()]);
        assert_eq!(modern.program, "magick");
        assert_eq!(modern.args, vec!["a.png", "b.jpg"]);
    }

    #[test]
    fn identify_invocations() {
        let legacy = Dialect::Legacy.identify(Path::new("x.jpg"));
        assert_eq!(legacy.program, "identify");
        assert_eq!(legacy.args, vec!["-ping", "-format", "%w %h\n", "x.jpg"]);

        let modern = Dialect::Modern.identify(Path::new("x.jpg"));
        assert_eq!(modern.program, "magick");
        assert_eq!(
            modern.args,
            vec!["identify", "-ping", "-format", "%w %h\n", "x.jpg"]
        );
    }

    // =========================================================================
    // Argument planning
    // =========================================================================

    #[test]
    fn crop_args_geometry_and_color_type() {
        let args = crop_args(&CropParams {
            source: "images/GOES-East_Full_Disk_large.jpg".into(),
            offset: Position::ORIGIN,
            size: Size::new(5424, 5377),
            output: png("images/generated0.png"),
        });
        assert_eq!(
            args,
            vec![
                "images/GOES-East_Full_Disk_large.jpg",
                "-crop",
                "5424x5377+0+0",
                "+repage",
                "-define",
                "png:color-type=6",
                "images/generated0.png",
            ]
        );
    }

    #[test]
    fn blank_args_use_canvas() {
        let args = blank_args(&BlankParams {
            color: "black".into(),
            size: Size::new(400, 400),
            output: png("g1.png"),
        });
        assert_eq!(
            args,
            vec![
                "-size",
                "400x400",
                "canvas:black",
                "-define",
                "png:color-type=6",
                "g1.png"
            ]
        );
    }

    #[test]
    fn composite_args_base_first_then_overlay() {
        let args = composite_args(&CompositeParams {
            base: "bg.png".into(),
            overlay: "earth.png".into(),
            offset: Position::new(1200, 240),
            output: png("g2.png"),
        });
        assert_eq!(
            args,
            vec![
                "bg.png",
                "earth.png",
                "-geometry",
                "+1200+240",
                "-composite",
                "-define",
                "png:color-type=6",
                "g2.png"
            ]
        );
    }

    #[test]
    fn negative_offsets_keep_their_sign() {
        assert_eq!(offset_geometry(Position::new(-12, 7)), "-12+7");
        assert_eq!(
            crop_geometry(Size::new(10, 20), Position::new(3, -4)),
            "10x20+3-4"
        );
    }

    #[test]
    fn resize_args_exact_size() {
        let args = resize_args(&ResizeParams {
            source: "g2.png".into(),
            size: Size::new(1089, 1080),
            output: png("g3.png"),
        });
        assert_eq!(&args[..3], &["g2.png", "-resize", "1089x1080"]);
        assert_eq!(args.last().unwrap(), "g3.png");
    }

    #[test]
    fn jpeg_conversion_has_no_png_define() {
        let args = convert_args(&ConvertParams {
            source: "g3.png".into(),
            output: OutputFile {
                path: "g4.jpg".into(),
                format: ImageFormat::Jpg,
            },
        });
        assert_eq!(args, vec!["g3.png", "g4.jpg"]);
    }

    // =========================================================================
    // identify parsing
    // =========================================================================

    #[test]
    fn parse_identify_single_frame() {
        assert_eq!(parse_identify("5424 5424\n"), Some(Size::new(5424, 5424)));
    }

    #[test]
    fn parse_identify_takes_first_frame() {
        assert_eq!(
            parse_identify("640 480\n320 240\n"),
            Some(Size::new(640, 480))
        );
    }

    #[test]
    fn parse_identify_rejects_garbage() {
        assert_eq!(parse_identify(""), None);
        assert_eq!(parse_identify("identify: no decode delegate"), None);
        assert_eq!(parse_identify("640"), None);
    }
}
