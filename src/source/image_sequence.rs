//! Clip backed by a directory of extracted still frames
//!
//! Host tools commonly dump a clip's frames as numbered images
//! (`frame_0001.png`, `frame_0002.png`, ...). Files are ordered by name and
//! decoded lazily when the extractor asks for them.

use super::{frame_index, VideoSource};
use crate::error::VitalsError;
use crate::types::Frame;
use std::fs;
use std::path::{Path, PathBuf};

/// Image extensions recognised as frames
const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// A clip stored as one image file per frame
#[derive(Debug, Clone)]
pub struct ImageSequenceClip {
    paths: Vec<PathBuf>,
    frame_rate: u32,
}

impl ImageSequenceClip {
    /// Index every frame image in `dir`; `frame_rate` is the rate the frames were extracted at
    pub fn open(dir: &Path, frame_rate: u32) -> Result<Self, VitalsError> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && is_frame_image(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        log::debug!(
            "indexed {} frame images in {} at {} fps",
            paths.len(),
            dir.display(),
            frame_rate
        );

        Ok(Self { paths, frame_rate })
    }

    pub fn frame_count(&self) -> usize {
        self.paths.len()
    }
}

fn is_frame_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            FRAME_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

impl VideoSource for ImageSequenceClip {
    fn nominal_frame_rate(&self) -> Option<u32> {
        if self.paths.is_empty() {
            None
        } else {
            Some(self.frame_rate)
        }
    }

    fn duration_seconds(&self) -> f64 {
        if self.frame_rate == 0 {
            return 0.0;
        }
        self.paths.len() as f64 / f64::from(self.frame_rate)
    }

    fn frame_at(&self, seconds: f64) -> Result<Frame, VitalsError> {
        let index = frame_index(seconds, self.frame_rate);
        let path = self.paths.get(index).ok_or_else(|| {
            VitalsError::FrameDecode(format!("no frame image at index {index}"))
        })?;
        let img = image::open(path)
            .map_err(|e| VitalsError::FrameDecode(format!("{}: {e}", path.display())))?;
        Ok(Frame::from(img.to_rgb8()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_reads_frames_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..4u8 {
            let img = RgbImage::from_pixel(3, 2, Rgb([i * 10, 0, 0]));
            img.save(dir.path().join(format!("frame_{i:04}.png"))).unwrap();
        }
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let clip = ImageSequenceClip::open(dir.path(), 2).unwrap();
        assert_eq!(clip.frame_count(), 4);
        assert_eq!(clip.nominal_frame_rate(), Some(2));
        assert!((clip.duration_seconds() - 2.0).abs() < f64::EPSILON);

        let frame = clip.frame_at(1.5).unwrap();
        assert_eq!((frame.width(), frame.height()), (3, 2));
        assert_eq!(frame.pixel(0, 0), Some([30, 0, 0]));
    }

    #[test]
    fn test_empty_directory_has_no_video_track() {
        let dir = tempfile::tempdir().unwrap();
        let clip = ImageSequenceClip::open(dir.path(), 30).unwrap();
        assert_eq!(clip.nominal_frame_rate(), None);
    }

    #[test]
    fn test_corrupt_frame_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("frame_0000.png"), b"not a png").unwrap();
        let clip = ImageSequenceClip::open(dir.path(), 1).unwrap();
        assert!(matches!(clip.frame_at(0.0), Err(VitalsError::FrameDecode(_))));
    }

    #[test]
    fn test_missing_directory() {
        let result = ImageSequenceClip::open(Path::new("/nonexistent/vitals/frames"), 30);
        assert!(matches!(result, Err(VitalsError::Io(_))));
    }
}
