//! Handing files to external editors.
//!
//! [`Launcher`] is the seam between pdfcombine and the outside world:
//! the CLI uses [`ProcessLauncher`], tests substitute their own.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::str::FromStr;

use crate::config::Settings;
use crate::error::{CombineError, Result};

/// Opens files in an external program.
pub trait Launcher {
    /// Start `executable` with `files` as arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if the program cannot be started.
    fn launch(&self, executable: &Path, files: &[PathBuf]) -> Result<()>;
}

/// Spawns the program as a child process and does not wait for it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessLauncher;

impl ProcessLauncher {
    /// Create a new process launcher.
    pub fn new() -> Self {
        Self
    }
}

impl Launcher for ProcessLauncher {
    fn launch(&self, executable: &Path, files: &[PathBuf]) -> Result<()> {
        if !executable.is_file() {
            return Err(CombineError::configuration(format!(
                "Executable not found: {}",
                executable.display()
            )));
        }

        let child = Command::new(executable)
            .args(files)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| CombineError::LaunchFailed {
                executable: executable.to_path_buf(),
                source,
            })?;

        log::info!(
            "Started {} (pid {}) with {} file(s)",
            executable.display(),
            child.id(),
            files.len()
        );
        Ok(())
    }
}

/// External editors known to the settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Editor {
    /// Inkscape, for PDF files.
    Inkscape,
    /// GIMP, for PNG files.
    Gimp,
    /// LibreOffice Draw, for PDF files.
    LibreOfficeDraw,
}

impl Editor {
    /// Settings key holding this editor's executable.
    pub fn settings_key(&self) -> &'static str {
        match self {
            Self::Inkscape => "inkscape_path",
            Self::Gimp => "gimp_path",
            Self::LibreOfficeDraw => "libreoffice_draw_path",
        }
    }

    /// Configured executable for this editor.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the path is not set.
    pub fn executable<'a>(&self, settings: &'a Settings) -> Result<&'a Path> {
        let path = match self {
            Self::Inkscape => settings.inkscape_path.as_deref(),
            Self::Gimp => settings.gimp_path.as_deref(),
            Self::LibreOfficeDraw => settings.libreoffice_draw_path.as_deref(),
        };
        path.ok_or_else(|| {
            CombineError::configuration(format!(
                "{self} is not configured (settings key '{}')",
                self.settings_key()
            ))
        })
    }

    /// Open `files` in this editor through `launcher`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no files are given or the editor is
    /// not configured, and whatever `launcher` returns otherwise.
    pub fn open(&self, launcher: &dyn Launcher, settings: &Settings, files: &[PathBuf]) -> Result<()> {
        if files.is_empty() {
            return Err(CombineError::configuration("No files to open"));
        }
        launcher.launch(self.executable(settings)?, files)
    }
}

impl fmt::Display for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Inkscape => "Inkscape",
            Self::Gimp => "GIMP",
            Self::LibreOfficeDraw => "LibreOffice Draw",
        })
    }
}

impl FromStr for Editor {
    type Err = CombineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "inkscape" => Ok(Self::Inkscape),
            "gimp" => Ok(Self::Gimp),
            "libreoffice" | "libreoffice-draw" | "draw" => Ok(Self::LibreOfficeDraw),
            _ => Err(CombineError::configuration(format!(
                "Unknown editor: {s}. Must be one of: inkscape, gimp, libreoffice"
            ))),
        }
    }
}
