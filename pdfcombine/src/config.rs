//! Configuration for pdfcombine.
//!
//! Two layers live here:
//!
//! - [`Settings`]: the persistent key-value settings file (working and source
//!   directories, editor executables, ordering keywords, toggles). It is an
//!   explicit value passed to whoever needs it; nothing reads settings from
//!   global state.
//! - [`Config`]: the validated configuration of a single compile, derived
//!   from CLI arguments and settings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::entry::SelectionMode;
use crate::error::{CombineError, Result};

/// Environment variable overriding the settings file location.
pub const SETTINGS_ENV: &str = "PDFCOMBINE_CONFIG";

/// Rank given to files that match no ordering keyword.
pub const OTHER_RANK: i64 = 100;

/// Default filename ordering keywords and their ranks.
pub const DEFAULT_ORDERING_KEYWORDS: [(&str, i64); 8] = [
    ("drawing", 10),
    ("plan", 20),
    ("detail", 30),
    ("schedule", 40),
    ("specification", 50),
    ("report", 60),
    ("photo", 70),
    ("other", OTHER_RANK),
];

fn default_ordering_keywords() -> BTreeMap<String, i64> {
    DEFAULT_ORDERING_KEYWORDS
        .iter()
        .map(|(k, v)| (k.to_string(), *v))
        .collect()
}

/// Keep the integer ranks of a keyword object, dropping anything else.
///
/// Ranks may be negative. Fractional, string or other values are skipped
/// with a warning so one bad entry does not make the settings unreadable.
pub fn ranks_from_json(object: serde_json::Map<String, serde_json::Value>) -> BTreeMap<String, i64> {
    object
        .into_iter()
        .filter_map(|(keyword, value)| match value.as_i64() {
            Some(rank) => Some((keyword, rank)),
            None => {
                log::warn!("Ignoring ordering keyword '{keyword}': rank {value} is not an integer");
                None
            }
        })
        .collect()
}

fn lenient_ranks<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let object = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
    Ok(ranks_from_json(object))
}

fn default_true() -> bool {
    true
}

/// Persistent user settings.
///
/// Well-known keys are typed; any other key found in the file is kept in
/// `extra` and written back unchanged. Two keys keep their historical names
/// on disk (`factory_paperwork_dir`, `delete_originals_on_action`); the
/// short names are accepted when reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Working directory whose contents are listed and compiled.
    #[serde(default, rename = "factory_paperwork_dir", alias = "working_dir")]
    pub working_dir: Option<PathBuf>,

    /// Directory files are imported from.
    #[serde(default)]
    pub source_dir: Option<PathBuf>,

    /// Inkscape executable.
    #[serde(default)]
    pub inkscape_path: Option<PathBuf>,

    /// GIMP executable.
    #[serde(default)]
    pub gimp_path: Option<PathBuf>,

    /// LibreOffice Draw executable.
    #[serde(default)]
    pub libreoffice_draw_path: Option<PathBuf>,

    /// Delete originals after a successful compile or conversion.
    #[serde(
        default,
        rename = "delete_originals_on_action",
        alias = "delete_originals"
    )]
    pub delete_originals: bool,

    /// Filename keywords mapped to listing ranks (lower sorts first).
    #[serde(
        default = "default_ordering_keywords",
        deserialize_with = "lenient_ranks"
    )]
    pub ordering_keywords: BTreeMap<String, i64>,

    /// Open the compiled PDF in Inkscape.
    #[serde(default)]
    pub open_combined_in_inkscape: bool,

    /// Open the compiled PDF in LibreOffice Draw.
    #[serde(default)]
    pub open_combined_in_libreoffice: bool,

    /// Whether a front end should show previews.
    #[serde(default = "default_true")]
    pub show_preview: bool,

    /// Keys this version does not know about.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            working_dir: None,
            source_dir: None,
            inkscape_path: None,
            gimp_path: None,
            libreoffice_draw_path: None,
            delete_originals: false,
            ordering_keywords: default_ordering_keywords(),
            open_combined_in_inkscape: false,
            open_combined_in_libreoffice: false,
            show_preview: true,
            extra: BTreeMap::new(),
        }
    }
}

/// Settings keys accepted by [`Settings::get`] and [`Settings::set`].
pub const SETTINGS_KEYS: [&str; 10] = [
    "working_dir",
    "source_dir",
    "inkscape_path",
    "gimp_path",
    "libreoffice_draw_path",
    "delete_originals",
    "ordering_keywords",
    "open_combined_in_inkscape",
    "open_combined_in_libreoffice",
    "show_preview",
];

/// Settings key names as written to disk, for keys whose file name differs.
const FILE_KEYS: [(&str, &str); 2] = [
    ("working_dir", "factory_paperwork_dir"),
    ("delete_originals", "delete_originals_on_action"),
];

/// Short name for a key, accepting either spelling of the renamed keys.
fn canonical_key(key: &str) -> &str {
    FILE_KEYS
        .iter()
        .find(|(_, file)| *file == key)
        .map_or(key, |(short, _)| *short)
}

/// Name under which `key` is stored in the settings file.
pub fn file_key(key: &str) -> &str {
    let key = canonical_key(key);
    FILE_KEYS
        .iter()
        .find(|(short, _)| *short == key)
        .map_or(key, |(_, file)| *file)
}

/// Parse a command-line value as JSON, falling back to a plain string.
fn json_or_string(value: &str) -> serde_json::Value {
    serde_json::from_str(value).unwrap_or_else(|_| serde_json::Value::String(value.to_string()))
}

/// Write `value` as pretty JSON, replacing `path` atomically.
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value).map_err(|source| CombineError::Settings {
        path: path.to_path_buf(),
        source,
    })?;

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(|e| CombineError::destination_write(path, e))?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)
        .map_err(|e| CombineError::destination_write(path, e))?;
    temp.write_all(&json)
        .and_then(|_| temp.flush())
        .map_err(|e| CombineError::destination_write(path, e))?;
    temp.persist(path)
        .map_err(|e| CombineError::destination_write(path, e.error))?;

    Ok(())
}

/// Settings file as an untyped JSON object.
///
/// Used to show and repair a file whose values no longer fit [`Settings`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSettings {
    values: serde_json::Map<String, serde_json::Value>,
}

impl RawSettings {
    /// Load `path` as a JSON object. A missing file is empty.
    ///
    /// # Errors
    ///
    /// Returns a `Settings` error if the file is not a JSON object.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(err.into()),
        };
        let values = serde_json::from_str(&text).map_err(|source| CombineError::Settings {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { values })
    }

    /// Value stored for `key`, under either spelling of a renamed key.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.values
            .get(file_key(key))
            .or_else(|| self.values.get(canonical_key(key)))
    }

    /// Store `value` under the on-disk name of `key`. An empty value removes it.
    pub fn set(&mut self, key: &str, value: &str) {
        // Drop the other spelling so the file holds one entry per key
        self.values.remove(canonical_key(key));
        let key = file_key(key).to_string();
        if value.trim().is_empty() {
            self.values.remove(&key);
        } else {
            self.values.insert(key, json_or_string(value));
        }
    }

    /// The whole object, for display.
    pub fn values(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.values
    }

    /// Save as pretty JSON, replacing `path` atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_json(path, &self.values)
    }
}

impl Settings {
    /// Default settings file location.
    ///
    /// `PDFCOMBINE_CONFIG` wins; otherwise `<config dir>/pdfcombine/config.json`,
    /// falling back to `config.json` in the current directory.
    pub fn default_path() -> PathBuf {
        if let Some(path) = std::env::var_os(SETTINGS_ENV) {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .map(|dir| dir.join("pdfcombine").join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    }

    /// Load settings from `path`.
    ///
    /// A missing file yields defaults. A malformed file is an error rather
    /// than being silently replaced.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::info!("{} not found, using default settings", path.display());
                return Ok(Self::default());
            }
            Err(err) => return Err(err.into()),
        };

        serde_json::from_str(&text).map_err(|source| CombineError::Settings {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save settings as pretty JSON, replacing `path` atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_json(path, self)
    }

    /// Whether `key` names a typed setting (either spelling).
    pub fn is_known_key(key: &str) -> bool {
        SETTINGS_KEYS.contains(&canonical_key(key))
    }

    /// Read a setting as a display string. Unknown keys look in `extra`.
    pub fn get(&self, key: &str) -> Option<String> {
        let path_str = |p: &Option<PathBuf>| p.as_ref().map(|p| p.display().to_string());
        match canonical_key(key) {
            "working_dir" => path_str(&self.working_dir),
            "source_dir" => path_str(&self.source_dir),
            "inkscape_path" => path_str(&self.inkscape_path),
            "gimp_path" => path_str(&self.gimp_path),
            "libreoffice_draw_path" => path_str(&self.libreoffice_draw_path),
            "delete_originals" => Some(self.delete_originals.to_string()),
            "ordering_keywords" => serde_json::to_string(&self.ordering_keywords).ok(),
            "open_combined_in_inkscape" => Some(self.open_combined_in_inkscape.to_string()),
            "open_combined_in_libreoffice" => Some(self.open_combined_in_libreoffice.to_string()),
            "show_preview" => Some(self.show_preview.to_string()),
            other => self.extra.get(other).map(|v| v.to_string()),
        }
    }

    /// Set a setting from a string value.
    ///
    /// Path keys accept any string (an empty string clears them), boolean
    /// keys accept `true`/`false`, `ordering_keywords` takes a JSON object.
    /// Unknown keys are stored verbatim (parsed as JSON when possible).
    /// Ordering ranks must be integers; other values are dropped.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let as_path = |v: &str| {
            let v = v.trim();
            (!v.is_empty()).then(|| PathBuf::from(v))
        };
        let as_bool = |v: &str| {
            v.trim().parse::<bool>().map_err(|_| {
                CombineError::configuration(format!("{key} must be true or false, got '{v}'"))
            })
        };

        match canonical_key(key) {
            "working_dir" => self.working_dir = as_path(value),
            "source_dir" => self.source_dir = as_path(value),
            "inkscape_path" => self.inkscape_path = as_path(value),
            "gimp_path" => self.gimp_path = as_path(value),
            "libreoffice_draw_path" => self.libreoffice_draw_path = as_path(value),
            "delete_originals" => self.delete_originals = as_bool(value)?,
            "open_combined_in_inkscape" => self.open_combined_in_inkscape = as_bool(value)?,
            "open_combined_in_libreoffice" => self.open_combined_in_libreoffice = as_bool(value)?,
            "show_preview" => self.show_preview = as_bool(value)?,
            "ordering_keywords" => {
                let object = serde_json::from_str(value).map_err(|e| {
                    CombineError::configuration(format!(
                        "ordering_keywords must be a JSON object of keyword to rank: {e}"
                    ))
                })?;
                self.ordering_keywords = ranks_from_json(object);
            }
            other => {
                self.extra.insert(other.to_string(), json_or_string(value));
            }
        }
        Ok(())
    }

    /// Configured working directory, checked to exist.
    pub fn require_working_dir(&self) -> Result<&Path> {
        let dir = self.working_dir.as_deref().ok_or_else(|| {
            CombineError::configuration("Working directory is not set (settings key 'working_dir')")
        })?;
        if !dir.is_dir() {
            return Err(CombineError::configuration(format!(
                "Working directory does not exist: {}",
                dir.display()
            )));
        }
        Ok(dir)
    }
}

/// Compression level for the output PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionLevel {
    /// No compression.
    None,
    /// Compress content streams.
    #[default]
    Standard,
    /// Compress and drop unreferenced objects.
    Maximum,
}

impl FromStr for CompressionLevel {
    type Err = CombineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "standard" => Ok(Self::Standard),
            "maximum" => Ok(Self::Maximum),
            _ => Err(CombineError::configuration(format!(
                "Invalid compression level: {s}. Must be one of: none, standard, maximum"
            ))),
        }
    }
}

/// PDF metadata to set on the output document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    /// Document title.
    pub title: Option<String>,
    /// Document author.
    pub author: Option<String>,
    /// Document subject.
    pub subject: Option<String>,
    /// Document keywords (comma-separated).
    pub keywords: Option<String>,
}

impl Metadata {
    /// Check if any metadata fields are set.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.subject.is_none()
            && self.keywords.is_none()
    }

    /// Create metadata from optional strings, trimming whitespace.
    pub fn new(
        title: Option<String>,
        author: Option<String>,
        subject: Option<String>,
        keywords: Option<String>,
    ) -> Self {
        let to_string_opt = |opt: Option<String>| {
            opt.filter(|s| !s.trim().is_empty())
                .map(|s| s.trim().to_string())
        };

        Self {
            title: to_string_opt(title),
            author: to_string_opt(author),
            subject: to_string_opt(subject),
            keywords: to_string_opt(keywords),
        }
    }
}

/// Output file overwrite behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwriteMode {
    /// Ask before overwriting. The library treats this like `Force`;
    /// asking is the front end's job.
    #[default]
    Prompt,
    /// Always overwrite.
    Force,
    /// Never overwrite, error if the file exists.
    NoClobber,
}

/// Complete configuration for one compile.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Output PDF file path.
    pub output: PathBuf,

    /// Which entries take part.
    pub mode: SelectionMode,

    /// Validate and report the plan without writing output.
    pub dry_run: bool,

    /// Verbose output mode.
    pub verbose: bool,

    /// Quiet mode - suppress non-error output.
    pub quiet: bool,

    /// File overwrite behavior.
    pub overwrite_mode: OverwriteMode,

    /// Compression level for output.
    pub compression: CompressionLevel,

    /// Metadata to set on output document.
    pub metadata: Metadata,
}

impl Config {
    /// Create a configuration writing to `output` with defaults elsewhere.
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            ..Default::default()
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the output path is empty, does not
    /// end in `.pdf`, or both verbose and quiet are set.
    pub fn validate(&self) -> Result<()> {
        if self.output.as_os_str().is_empty() {
            return Err(CombineError::configuration("No output file specified"));
        }

        let is_pdf = self
            .output
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        if !is_pdf {
            return Err(CombineError::configuration(format!(
                "Output file must have a .pdf extension: {}",
                self.output.display()
            )));
        }

        if self.verbose && self.quiet {
            return Err(CombineError::configuration(
                "Cannot use both --verbose and --quiet",
            ));
        }

        Ok(())
    }

    /// Check if output should be displayed.
    ///
    /// Returns false if in quiet mode and not doing a dry run.
    pub fn should_print(&self) -> bool {
        !self.quiet || self.dry_run
    }
}
