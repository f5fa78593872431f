// src/images.rs
use crate::error::ImageError;
use base64::{engine::general_purpose::STANDARD, Engine};
use futures::future::join_all;
use log;
use std::path::{Path, PathBuf};

fn mime_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        _ => return None,
    };
    Some(mime)
}

pub fn to_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Reads one image file into an embeddable `data:` URI.
pub async fn encode_image(path: &Path) -> Result<String, ImageError> {
    let mime = mime_for(path).ok_or_else(|| ImageError::UnsupportedType(path.display().to_string()))?;
    let bytes = tokio::fs::read(path).await.map_err(|source| ImageError::Read {
        path: path.display().to_string(),
        source,
    })?;
    log::debug!("Encoded {:?} ({} bytes)", path, bytes.len());
    Ok(to_data_uri(mime, &bytes))
}

/// Outcome of attaching several files at once.
#[derive(Debug, Default)]
pub struct EncodedImages {
    pub payloads: Vec<String>,
    pub failures: Vec<ImageError>,
}

/// Reads all files concurrently. Files that fail are reported and skipped.
pub async fn encode_images(paths: Vec<PathBuf>) -> EncodedImages {
    let results = join_all(paths.iter().map(|p| encode_image(p))).await;
    let mut out = EncodedImages::default();
    for result in results {
        match result {
            Ok(payload) => out.payloads.push(payload),
            Err(e) => {
                log::warn!("Skipping image: {}", e);
                out.failures.push(e);
            }
        }
    }
    out
}
