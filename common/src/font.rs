use std::{
    env, fs,
    path::{Path, PathBuf},
};

use eyre::{Context, Result, eyre};
use plotters::style::FontStyle;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Family name chart text is drawn with
pub const FONT_FAMILY: &str = "sans-serif";

const FONT_DIRS: &[&str] = &[
    "/usr/share/fonts",
    "/usr/local/share/fonts",
    "/Library/Fonts",
    "/System/Library/Fonts",
    "C:\\Windows\\Fonts",
];

/// Picked first when present, in this order
const PREFERRED_FONTS: &[&str] = &[
    "DejaVuSans.ttf",
    "LiberationSans-Regular.ttf",
    "Arial.ttf",
    "arial.ttf",
    "NotoSans-Regular.ttf",
    "Roboto-Regular.ttf",
];

fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("ttf") || ext.eq_ignore_ascii_case("otf"))
}

fn font_dirs() -> Vec<PathBuf> {
    let mut dirs = FONT_DIRS.iter().map(PathBuf::from).collect::<Vec<_>>();
    if let Some(home) = env::var_os("HOME").map(PathBuf::from) {
        dirs.push(home.join(".fonts"));
        dirs.push(home.join(".local/share/fonts"));
    }
    dirs
}

/// Searches the usual font directories for a sans-serif TTF/OTF font
pub fn find_system_font() -> Option<PathBuf> {
    let mut candidates = font_dirs()
        .into_iter()
        .filter(|dir| dir.is_dir())
        .flat_map(|dir| WalkDir::new(dir).follow_links(true).into_iter())
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && is_font_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect::<Vec<_>>();
    candidates.sort();
    debug!("Found {} font candidates", candidates.len());

    PREFERRED_FONTS
        .iter()
        .find_map(|name| {
            candidates
                .iter()
                .find(|path| path.file_name().is_some_and(|f| f == *name))
                .cloned()
        })
        .or_else(|| candidates.into_iter().next())
}

/// Registers `path` as the chart font. Lives for the rest of the process.
pub fn register_font(path: &Path) -> Result<()> {
    let bytes = fs::read(path).wrap_err_with(|| format!("Reading font {}", path.display()))?;
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    plotters::style::register_font(FONT_FAMILY, FontStyle::Normal, bytes)
        .map_err(|_| eyre!("Invalid font file {}", path.display()))?;
    info!("Using chart font {}", path.display());
    Ok(())
}
