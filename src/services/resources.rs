use crate::error::AppError;
use futures::future::BoxFuture;
use std::path::PathBuf;

/// Reads bundled text resources by logical path.
pub trait ResourceReader: Send + Sync {
    fn read_text<'a>(&'a self, logical_path: &'a str) -> BoxFuture<'a, Result<String, AppError>>;

    /// Absolute location handed to the inference engine.
    fn locate(&self, logical_path: &str) -> PathBuf;
}

/// Resources shipped next to the app binary, under the resource directory.
#[derive(Debug, Clone)]
pub struct BundledResources {
    root: PathBuf,
}

impl BundledResources {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ResourceReader for BundledResources {
    fn read_text<'a>(&'a self, logical_path: &'a str) -> BoxFuture<'a, Result<String, AppError>> {
        Box::pin(async move {
            let path = self.locate(logical_path);
            let bytes = tokio::fs::read(&path).await.map_err(|e| {
                AppError::resource_load(format!(
                    "Failed to read resource {}: {}",
                    path.display(),
                    e
                ))
            })?;
            decode_text(bytes)
        })
    }

    fn locate(&self, logical_path: &str) -> PathBuf {
        self.root.join(logical_path)
    }
}

/// Decodes UTF-8 (with or without BOM) or BOM-tagged UTF-16.
pub fn decode_text(bytes: Vec<u8>) -> Result<String, AppError> {
    match bytes.as_slice() {
        [0xEF, 0xBB, 0xBF, rest @ ..] => Ok(String::from_utf8(rest.to_vec())?),
        [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, u16::from_le_bytes),
        [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes),
        _ => Ok(String::from_utf8(bytes)?),
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Result<String, AppError> {
    if bytes.len() % 2 != 0 {
        return Err(AppError::resource_load("UTF-16 resource has an odd byte count"));
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| unit([pair[0], pair[1]]))
        .collect();
    Ok(String::from_utf16(&units)?)
}
