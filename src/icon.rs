// ABOUTME: Locates and decodes the status item icon, falling back to a one-letter title
// ABOUTME: Candidates are tried in a fixed order; the first file that decodes as an image wins

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub const ICON_FILE_NAME: &str = "grok-small.png";

/// Shown in the menu bar when no icon image can be loaded.
pub const FALLBACK_TITLE: &str = "G";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaIcon {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusIcon {
    Image { source: PathBuf, icon: RgbaIcon },
    Title(&'static str),
}

/// Bundle resources, next to the executable, the working directory, then the
/// user's config directory.
pub fn candidate_paths() -> Vec<PathBuf> {
    let mut candidates = Vec::with_capacity(4);

    if let Ok(exe) = std::env::current_exe() {
        if let Some(exe_dir) = exe.parent() {
            // GrokBar.app/Contents/MacOS/grokbar -> GrokBar.app/Contents/Resources
            if let Some(contents) = exe_dir.parent() {
                candidates.push(contents.join("Resources").join(ICON_FILE_NAME));
            }
            candidates.push(exe_dir.join(ICON_FILE_NAME));
        }
    }
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join(ICON_FILE_NAME));
    }
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join("grokbar").join(ICON_FILE_NAME));
    }

    candidates
}

pub fn resolve<P: AsRef<Path>>(candidates: &[P]) -> StatusIcon {
    for candidate in candidates {
        let path = candidate.as_ref();
        if !path.is_file() {
            continue;
        }
        match load_rgba(path) {
            Ok(icon) => {
                tracing::debug!(path = %path.display(), "Loaded status item icon");
                return StatusIcon::Image {
                    source: path.to_path_buf(),
                    icon,
                };
            }
            Err(e) => tracing::warn!("{e:#}"),
        }
    }

    tracing::info!("No status item icon found, using text title");
    StatusIcon::Title(FALLBACK_TITLE)
}

fn load_rgba(path: &Path) -> Result<RgbaIcon> {
    let image = image::open(path)
        .with_context(|| format!("Failed to decode icon: {}", path.display()))?
        .to_rgba8();
    let (width, height) = image.dimensions();

    Ok(RgbaIcon {
        rgba: image.into_raw(),
        width,
        height,
    })
}
