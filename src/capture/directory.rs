use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, info};
use std::path::{Path, PathBuf};

use crate::assets::FRAME_EXTENSIONS;
use crate::capture::{CaptureError, FrameSource};

/// Replays encoded images from a directory as a looping camera feed.
///
/// The directory is scanned lazily: until it holds at least one image every
/// capture reports `Unavailable`, the same way a camera that is still waiting
/// for permission would.
pub struct DirectorySource {
    dir: PathBuf,
    frames: Vec<PathBuf>,
    cursor: usize,
    released: bool,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            frames: Vec::new(),
            cursor: 0,
            released: false,
        }
    }

    async fn load_frames(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        let mut frames = Vec::new();
        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !is_frame(&path) {
                continue;
            }
            // follows symlinks, like a camera device node would
            if tokio::fs::metadata(&path).await?.is_file() {
                frames.push(path);
            }
        }
        frames.sort();
        Ok(frames)
    }
}

fn is_frame(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            FRAME_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

#[async_trait]
impl FrameSource for DirectorySource {
    async fn capture_frame(&mut self) -> Result<Bytes, CaptureError> {
        if self.released {
            return Err(CaptureError::Unavailable("device released".into()));
        }

        if self.frames.is_empty() {
            self.frames = Self::load_frames(&self.dir)
                .await
                .map_err(|e| CaptureError::Unavailable(format!("{}: {}", self.dir.display(), e)))?;
            if self.frames.is_empty() {
                return Err(CaptureError::Unavailable(format!(
                    "no frames in {}",
                    self.dir.display()
                )));
            }
            info!(
                "DirectorySource: {} frames found in {}",
                self.frames.len(),
                self.dir.display()
            );
        }

        let path = &self.frames[self.cursor];
        self.cursor = (self.cursor + 1) % self.frames.len();
        let data = tokio::fs::read(path).await?;
        debug!("DirectorySource: read {} ({} bytes)", path.display(), data.len());
        Ok(Bytes::from(data))
    }

    async fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.frames.clear();
            info!("DirectorySource: released {}", self.dir.display());
        }
    }

    fn name(&self) -> &str {
        "directory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frames_replayed_in_order_and_looped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("002.jpg"), b"second").unwrap();
        std::fs::write(dir.path().join("001.JPG"), b"first").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"skip me").unwrap();

        let mut source = DirectorySource::new(dir.path());
        assert_eq!(&source.capture_frame().await.unwrap()[..], b"first");
        assert_eq!(&source.capture_frame().await.unwrap()[..], b"second");
        assert_eq!(&source.capture_frame().await.unwrap()[..], b"first");
    }

    #[tokio::test]
    async fn test_directories_named_like_frames_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("000.jpg")).unwrap();
        std::fs::write(dir.path().join("001.png"), b"only").unwrap();

        let mut source = DirectorySource::new(dir.path());
        assert_eq!(&source.capture_frame().await.unwrap()[..], b"only");
        assert_eq!(&source.capture_frame().await.unwrap()[..], b"only");
    }

    #[tokio::test]
    async fn test_empty_directory_is_unavailable_until_filled() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = DirectorySource::new(dir.path());

        assert!(matches!(
            source.capture_frame().await,
            Err(CaptureError::Unavailable(_))
        ));

        std::fs::write(dir.path().join("frame.png"), b"png").unwrap();
        assert_eq!(&source.capture_frame().await.unwrap()[..], b"png");
    }

    #[tokio::test]
    async fn test_missing_directory_is_unavailable() {
        let mut source = DirectorySource::new("/definitely/not/here");
        assert!(matches!(
            source.capture_frame().await,
            Err(CaptureError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_released_source_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.jpeg"), b"a").unwrap();

        let mut source = DirectorySource::new(dir.path());
        source.capture_frame().await.unwrap();
        source.release().await;

        assert!(matches!(
            source.capture_frame().await,
            Err(CaptureError::Unavailable(_))
        ));
    }
}
