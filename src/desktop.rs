//! Putting a finished image on the desktop.
//!
//! Each desktop has its own tool. All of them are handed an absolute path,
//! since they may resolve it long after this process has exited. Prefer a
//! JPG: some setters render PNG colors wrongly.

use crate::command::{self, CommandError, Invocation};
use crate::imaging::Image;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DesktopError {
    #[error("Cannot make {path} absolute: {source}")]
    Path {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("The xfce desktop needs a monitor, e.g. \"screen0/monitorHDMI-0/workspace0\"")]
    MissingMonitor,
}

/// Desktop names as written in recipes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DesktopKind {
    WindowManager,
    Gnome2,
    Gnome3,
    Unity,
    Xfce,
}

/// Desktop environment (or lack of one) to set the background on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Desktop {
    /// Bare window manager (XMonad, Openbox, ...): draws on the root window.
    WindowManager,
    Gnome2,
    /// GNOME 3 and Unity. The image is spanned across all monitors.
    Gnome3,
    /// One monitor and workspace at a time, e.g.
    /// `screen0/monitorHDMI-0/workspace0`. Valid identifiers are listed by
    /// `xfconf-query --channel xfce4-desktop --list`.
    Xfce { monitor: String },
}

impl Desktop {
    /// Only xfce takes a monitor; it is ignored for the others.
    pub fn from_kind(kind: DesktopKind, monitor: Option<String>) -> Result<Self, DesktopError> {
        Ok(match kind {
            DesktopKind::WindowManager => Self::WindowManager,
            DesktopKind::Gnome2 => Self::Gnome2,
            DesktopKind::Gnome3 | DesktopKind::Unity => Self::Gnome3,
            DesktopKind::Xfce => Self::Xfce {
                monitor: monitor.ok_or(DesktopError::MissingMonitor)?,
            },
        })
    }

    /// Commands that install `path`, in the order they run.
    pub fn invocations(&self, path: &Path) -> Vec<Invocation> {
        match self {
            Self::WindowManager => vec![Invocation::new("xloadimage").arg("-onroot").arg(path)],
            Self::Gnome2 => vec![
                Invocation::new("gconftool-2")
                    .arg("--type=string")
                    .arg("--set")
                    .arg("/desktop/gnome/background/picture_filename")
                    .arg(path),
            ],
            Self::Gnome3 => {
                let uri = format!("file://{}", path.display());
                vec![
                    gsettings_background("picture-uri", &uri),
                    gsettings_background("picture-options", "spanned"),
                ]
            }
            Self::Xfce { monitor } => vec![
                Invocation::new("xfconf-query")
                    .arg("--channel")
                    .arg("xfce4-desktop")
                    .arg("--property")
                    .arg(format!("/backdrop/{monitor}/last-image"))
                    .arg("--set")
                    .arg(path),
            ],
        }
    }

    pub fn set_background(&self, image: &Image) -> Result<(), DesktopError> {
        let path = absolute(image.path())?;
        tracing::debug!(desktop = ?self, path = %path.display(), "setting background");
        for invocation in self.invocations(&path) {
            command::run_echoed(&invocation)?;
        }
        Ok(())
    }
}

fn gsettings_background(key: &str, value: &str) -> Invocation {
    Invocation::new("gsettings")
        .arg("set")
        .arg("org.gnome.desktop.background")
        .arg(key)
        .arg(value)
}

fn absolute(path: &Path) -> Result<PathBuf, DesktopError> {
    std::path::absolute(path).map_err(|source| DesktopError::Path {
        path: path.to_path_buf(),
        source,
    })
}

pub fn viewer_invocation(path: &Path) -> Invocation {
    Invocation::new("eog").arg(path)
}

/// Open `image` in the Eye of GNOME viewer. Blocks until the viewer exits.
pub fn view(image: &Image) -> Result<(), DesktopError> {
    command::run_echoed(&viewer_invocation(image.path()))?;
    Ok(())
}

/// Where finished images end up: the desktop background or a viewer.
pub trait Screen {
    fn set_background(&self, desktop: &Desktop, image: &Image) -> Result<(), DesktopError>;

    fn view(&self, image: &Image) -> Result<(), DesktopError>;
}

/// Runs the real desktop tools.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemScreen;

impl Screen for SystemScreen {
    fn set_background(&self, desktop: &Desktop, image: &Image) -> Result<(), DesktopError> {
        desktop.set_background(image)
    }

    fn view(&self, image: &Image) -> Result<(), DesktopError> {
        view(image)
    }
}
