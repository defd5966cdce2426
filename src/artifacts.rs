// Post-processing and packaging of renderer output.

use base64::prelude::{BASE64_STANDARD, Engine as _};
use image::ImageFormat;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::RenderError;

const MIRRORED_PREFIX: &str = "flipped_";

/// Mirrors every image in `chathead_dir` left to right, in place.
///
/// Each image is written to a sibling file first and then renamed over the
/// original, so file names are preserved.
pub fn mirror_chatheads(chathead_dir: &Path) -> Result<(), RenderError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(chathead_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }

    for path in files {
        mirror_in_place(&path)?;
    }

    Ok(())
}

fn mirror_in_place(path: &Path) -> Result<(), RenderError> {
    let post_process_error = |message: String| RenderError::PostProcess {
        path: path.to_path_buf(),
        message,
    };

    let file_name = path
        .file_name()
        .ok_or_else(|| post_process_error("path has no file name".to_string()))?;
    let mut tmp_name = std::ffi::OsString::from(MIRRORED_PREFIX);
    tmp_name.push(file_name);
    let tmp_path = path.with_file_name(tmp_name);

    let image = image::open(path).map_err(|e| post_process_error(e.to_string()))?;
    image
        .fliph()
        .save_with_format(&tmp_path, ImageFormat::Png)
        .map_err(|e| post_process_error(e.to_string()))?;
    std::fs::rename(&tmp_path, path)?;

    debug!("Mirrored chathead {}", path.display());
    Ok(())
}

/// Reads an artifact and returns it base64 encoded.
pub async fn encode_artifact(path: &Path) -> Result<String, RenderError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| RenderError::ArtifactNotFound {
            path: PathBuf::from(path),
            source,
        })?;
    Ok(BASE64_STANDARD.encode(bytes))
}
