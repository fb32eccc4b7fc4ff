//! Property folders: locating them, listing their images, encoding them.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use realview_core::ImageAsset;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// A path argument if it contains a separator, otherwise a property id under
/// `cases_root` (`2203177` and `case_2203177` name the same folder).
pub fn resolve_property_dir(arg: &str, cases_root: &Path) -> PathBuf {
    let arg = arg.trim();
    if arg.contains('/') || arg.contains('\\') {
        return PathBuf::from(arg);
    }
    if arg.starts_with("case_") {
        cases_root.join(arg)
    } else {
        cases_root.join(format!("case_{arg}"))
    }
}

/// Image files directly inside `dir`, sorted by path.
pub fn list_images(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("image folder not found: {}", dir.display());
    }
    let mut paths = Vec::new();
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() && is_image(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

fn mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    match ext.as_str() {
        "png" => "image/png",
        "webp" => "image/webp",
        _ => "image/jpeg",
    }
}

pub fn encode_data_url(path: &Path) -> anyhow::Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(format!(
        "data:{};base64,{}",
        mime_type(path),
        STANDARD.encode(bytes)
    ))
}

/// Load every image of a property folder. The folder name is the property id.
pub fn load_property(dir: &Path) -> anyhow::Result<(String, Vec<ImageAsset>)> {
    if !dir.is_dir() {
        bail!("image folder not found: {}", dir.display());
    }
    // `.` and `..` components carry no folder name until resolved.
    let dir = &dir
        .canonicalize()
        .with_context(|| format!("resolving {}", dir.display()))?;
    let property_id = dir
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("cannot derive a property id from {}", dir.display()))?
        .to_string();

    let mut assets = Vec::new();
    for path in list_images(dir)? {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .with_context(|| format!("non UTF-8 file name: {}", path.display()))?
            .to_string();
        assets.push(ImageAsset::new(
            filename,
            property_id.clone(),
            encode_data_url(&path)?,
        ));
    }
    Ok((property_id, assets))
}
