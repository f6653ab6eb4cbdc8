//! Writing image bytes to disk
//!
//! Sources are either an HTTP response body or a file already on local
//! storage. Destinations are overwritten and their parent directories created.

use std::path::Path;

use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use crate::error::{ApiError, Error, Result};

/// Create (or truncate) `destination`, making parent directories first
async fn create_destination(destination: &Path) -> Result<File> {
    if let Some(parent) = destination.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).await?;
    }
    Ok(File::create(destination).await?)
}

/// Stream a response body into `destination`, returning the bytes written.
///
/// A half-written file is removed when the body cannot be read to the end.
pub async fn save_response(mut response: reqwest::Response, destination: &Path) -> Result<u64> {
    let mut file = create_destination(destination).await?;

    let mut written = 0u64;
    let streamed = async {
        while let Some(chunk) = response.chunk().await.map_err(ApiError::from)? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        Ok::<(), Error>(())
    }
    .await;

    if let Err(err) = streamed {
        drop(file);
        let _ = fs::remove_file(destination).await;
        return Err(err);
    }

    log::debug!("Wrote {} bytes to {}", written, destination.display());
    Ok(written)
}

/// Copy a local image file to `destination`, returning the bytes copied.
///
/// When both paths name the same file nothing is written and the file's
/// length is returned.
pub async fn copy_local(source: &Path, destination: &Path) -> Result<u64> {
    let mut reader = File::open(source).await.map_err(|e| {
        Error::Other(format!(
            "Cannot read image source {}: {}",
            source.display(),
            e
        ))
    })?;

    if is_same_file(source, destination).await {
        let len = reader.metadata().await?.len();
        log::debug!("{} is already in place", destination.display());
        return Ok(len);
    }

    let mut file = create_destination(destination).await?;

    let copied = tokio::io::copy(&mut reader, &mut file).await?;
    file.flush().await?;

    log::debug!(
        "Copied {} bytes from {} to {}",
        copied,
        source.display(),
        destination.display()
    );
    Ok(copied)
}

/// True when both paths resolve to one existing file
async fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a).await, fs::canonicalize(b).await) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
