// ABOUTME: On-disk TOML record for the two persisted popover preferences
// ABOUTME: Lenient loading: missing file, missing keys, or unknown tokens fall back to defaults

use crate::preset::SizePreset;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Resolved preference values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preferences {
    pub size_preset: SizePreset,
    pub retain_focus: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            size_preset: SizePreset::Mid,
            retain_focus: true,
        }
    }
}

/// Exactly what sits in the file. Both keys are optional so a partially
/// written or hand-edited file still loads.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct PreferencesFile {
    #[serde(rename = "sizePreset", default, skip_serializing_if = "Option::is_none")]
    pub size_preset: Option<String>,
    #[serde(rename = "retainFocus", default, skip_serializing_if = "Option::is_none")]
    pub retain_focus: Option<bool>,
}

impl PreferencesFile {
    pub fn load_from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse preferences")
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read preferences file: {}", path.display()))?;
        Self::load_from_str(&content)
    }

    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Failed to determine config directory")?;
        Ok(config_dir.join("grokbar").join("preferences.toml"))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create preferences directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string(self).context("Failed to serialize preferences")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write preferences to: {}", path.display()))?;

        Ok(())
    }

    pub fn resolve(&self) -> Preferences {
        let defaults = Preferences::default();
        let size_preset = match self.size_preset.as_deref().map(str::parse::<SizePreset>) {
            Some(Ok(preset)) => preset,
            Some(Err(e)) => {
                tracing::warn!("{e}; using {}", defaults.size_preset);
                defaults.size_preset
            }
            None => defaults.size_preset,
        };

        Preferences {
            size_preset,
            retain_focus: self.retain_focus.unwrap_or(defaults.retain_focus),
        }
    }
}

impl From<Preferences> for PreferencesFile {
    fn from(prefs: Preferences) -> Self {
        PreferencesFile {
            size_preset: Some(prefs.size_preset.token().to_string()),
            retain_focus: Some(prefs.retain_focus),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_file() {
        let file = PreferencesFile::load_from_str(
            r#"
sizePreset = "large"
retainFocus = false
"#,
        )
        .unwrap();

        assert_eq!(
            file.resolve(),
            Preferences {
                size_preset: SizePreset::Large,
                retain_focus: false,
            }
        );
    }

    #[test]
    fn test_empty_file_resolves_to_defaults() {
        let file = PreferencesFile::load_from_str("").unwrap();
        let prefs = file.resolve();
        assert_eq!(prefs.size_preset.index(), 2);
        assert!(prefs.retain_focus);
    }

    #[test]
    fn test_unknown_token_falls_back_to_mid() {
        let file = PreferencesFile::load_from_str(r#"sizePreset = "gigantic""#).unwrap();
        assert_eq!(file.resolve().size_preset, SizePreset::Mid);
    }

    #[test]
    fn test_wrong_type_is_an_error() {
        let result = PreferencesFile::load_from_str(r#"retainFocus = "yes""#);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Failed to parse preferences"));
    }

    #[test]
    fn test_save_creates_directory_and_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("preferences.toml");
        let prefs = Preferences {
            size_preset: SizePreset::SmallMid,
            retain_focus: false,
        };

        PreferencesFile::from(prefs).save(&path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains(r#"sizePreset = "smallMid""#));
        assert_eq!(PreferencesFile::load_from_file(&path).unwrap().resolve(), prefs);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = PreferencesFile::load_from_file(&temp_dir.path().join("absent.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_default_path() {
        let path = PreferencesFile::default_path().unwrap();
        assert!(path.to_string_lossy().contains("grokbar"));
        assert!(path.to_string_lossy().ends_with("preferences.toml"));
    }
}
