//! Hotkey configuration: a tiny `key = "value"` file.
//!
//! The file holds exactly two settings, the add hotkey and the download
//! hotkey. A missing file means defaults; an unreadable or malformed file is
//! an error so a typo never silently reverts the user's bindings.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Default binding for "add clipboard link to queue".
pub const DEFAULT_ADD_HOTKEY: &str = "ctrl+space";
/// Default binding for "download everything queued".
pub const DEFAULT_DOWNLOAD_HOTKEY: &str = "ctrl+shift+space";

/// Errors loading or saving the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file '{path}' could not be accessed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config syntax on line {line}: {detail}")]
    Parse { line: usize, detail: String },
}

/// The two hotkey bindings the host UI registers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub add_hotkey: String,
    pub download_hotkey: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            add_hotkey: DEFAULT_ADD_HOTKEY.to_string(),
            download_hotkey: DEFAULT_DOWNLOAD_HOTKEY.to_string(),
        }
    }
}

impl Config {
    /// Loads config from `path`, falling back to defaults when the file does
    /// not exist. Unknown keys are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on unreadable files or malformed lines.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Self::parse(&raw)
    }

    /// Parses the `key = "value"` format.
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        for (line_index, raw_line) in raw.lines().enumerate() {
            let line = strip_inline_comment(raw_line).trim();
            if line.is_empty() {
                continue;
            }

            let Some((raw_key, raw_value)) = line.split_once('=') else {
                return Err(ConfigError::Parse {
                    line: line_index + 1,
                    detail: "expected key = value".to_string(),
                });
            };

            let key = raw_key.trim();
            let value = parse_string_literal(raw_value.trim()).ok_or_else(|| {
                ConfigError::Parse {
                    line: line_index + 1,
                    detail: format!("invalid value for `{key}`"),
                }
            })?;

            match key {
                "add_hotkey" => config.add_hotkey = value,
                "download_hotkey" => config.download_hotkey = value,
                other => {
                    return Err(ConfigError::Parse {
                        line: line_index + 1,
                        detail: format!("unknown key `{other}`"),
                    });
                }
            }
        }
        Ok(config)
    }

    /// Writes the config back in the same format `load` reads.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let rendered = format!(
            "add_hotkey = \"{}\"\ndownload_hotkey = \"{}\"\n",
            self.add_hotkey, self.download_hotkey
        );
        std::fs::write(path, rendered).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Drops everything after an unquoted `#`.
fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, c) in line.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

/// Accepts `"quoted"` or bare values without quotes.
fn parse_string_literal(value: &str) -> Option<String> {
    if value.is_empty() {
        return None;
    }
    if let Some(stripped) = value.strip_prefix('"') {
        let inner = stripped.strip_suffix('"')?;
        if inner.contains('"') {
            return None;
        }
        return Some(inner.to_string());
    }
    if value.contains('"') {
        return None;
    }
    Some(value.to_string())
}
