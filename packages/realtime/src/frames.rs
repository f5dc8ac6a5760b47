//! Frame source backed by a directory of still images.
//!
//! Cycles through the image files in a directory in name order, one per
//! capture. Used by the CLI in place of a webcam.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crowdwatch_ai::DataUri;

use crate::{CaptureError, FrameSource};

/// Cycles through image files in a directory.
#[derive(Debug, Clone)]
pub struct DirectoryFrameSource {
    files: Vec<PathBuf>,
    next: usize,
}

impl DirectoryFrameSource {
    /// Lists the images in `dir`.
    ///
    /// # Errors
    ///
    /// * [`CaptureError::PermissionDenied`] if the directory can't be read
    /// * [`CaptureError::Unsupported`] if it holds no supported images
    /// * [`CaptureError::Unavailable`] if it does not exist
    pub fn open(dir: &Path) -> Result<Self, CaptureError> {
        let entries = std::fs::read_dir(dir).map_err(|e| io_error(dir, &e))?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && media_type(path).is_some())
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(CaptureError::Unsupported(format!(
                "no .jpg, .png, .webp or .gif files in {}",
                dir.display()
            )));
        }

        log::info!("Using {} frame(s) from {}", files.len(), dir.display());

        Ok(Self { files, next: 0 })
    }

    /// Number of frames in the cycle.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Always `false`; [`Self::open`] rejects empty directories.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[async_trait::async_trait]
impl FrameSource for DirectoryFrameSource {
    async fn capture(&mut self) -> Result<DataUri, CaptureError> {
        let path = self
            .files
            .get(self.next)
            .ok_or_else(|| CaptureError::Unsupported("no frames".to_string()))?
            .clone();
        self.next = (self.next + 1) % self.files.len();

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| io_error(&path, &e))?;
        if bytes.is_empty() {
            return Err(CaptureError::Unavailable(format!(
                "{} is empty",
                path.display()
            )));
        }

        let media_type = media_type(&path).unwrap_or("image/jpeg");
        log::trace!("Captured {} ({} bytes)", path.display(), bytes.len());

        Ok(DataUri::from_bytes(media_type, &bytes))
    }
}

fn media_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

fn io_error(path: &Path, e: &std::io::Error) -> CaptureError {
    let message = format!("{}: {e}", path.display());
    match e.kind() {
        ErrorKind::PermissionDenied => CaptureError::PermissionDenied(message),
        _ => CaptureError::Unavailable(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "crowdwatch_frames_{name}_{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn cycles_images_in_name_order() {
        let dir = scratch_dir("cycle");
        std::fs::write(dir.join("b.png"), [2u8]).unwrap();
        std::fs::write(dir.join("a.jpg"), [1u8]).unwrap();
        std::fs::write(dir.join("notes.txt"), b"skip me").unwrap();

        let mut source = DirectoryFrameSource::open(&dir).unwrap();
        assert_eq!(source.len(), 2);

        let first = source.capture().await.unwrap();
        let second = source.capture().await.unwrap();
        let third = source.capture().await.unwrap();
        assert_eq!(first.media_type(), "image/jpeg");
        assert_eq!(second.media_type(), "image/png");
        assert_eq!(third.bytes().unwrap(), vec![1u8]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_or_empty_directories_are_rejected() {
        let dir = scratch_dir("empty");
        assert!(matches!(
            DirectoryFrameSource::open(&dir),
            Err(CaptureError::Unsupported(_))
        ));
        std::fs::remove_dir_all(&dir).unwrap();

        assert!(matches!(
            DirectoryFrameSource::open(&dir),
            Err(CaptureError::Unavailable(_))
        ));
    }
}
