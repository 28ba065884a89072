use std::path::{Path, PathBuf};

use image::{ImageError, ImageReader, RgbaImage};
use thiserror::Error;
use tracing::debug;

use crate::geometry::Size;
use crate::raster::Image;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to open asset {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode asset {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: ImageError,
    },
    #[error("sprite sheet frame size must be at least 1x1, got {width}x{height}")]
    InvalidFrameSize { width: u32, height: u32 },
    #[error("sprite sheet {path} is smaller than one {width}x{height} frame")]
    EmptySpriteSheet {
        path: PathBuf,
        width: u32,
        height: u32,
    },
    #[error("raster length mismatch: expected {expected} bytes, got {actual}")]
    RasterLength { expected: usize, actual: usize },
}

#[derive(Debug, Clone)]
pub struct AssetLoader {
    root: PathBuf,
}

impl AssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn load_image(&self, relative_path: &str) -> Result<Image, AssetError> {
        let path = self.root.join(relative_path);
        let decoded = decode_rgba(&path)?;
        debug!(
            path = %path.display(),
            width = decoded.width(),
            height = decoded.height(),
            "image_loaded"
        );
        let (width, height) = decoded.dimensions();
        Image::from_rgba(width, height, decoded.into_raw())
    }

    pub fn load_sprite_sheet(
        &self,
        relative_path: &str,
        frame_size: Size,
    ) -> Result<Vec<Image>, AssetError> {
        let frame_width = frame_size.width().round() as u32;
        let frame_height = frame_size.height().round() as u32;
        if frame_width == 0 || frame_height == 0 {
            return Err(AssetError::InvalidFrameSize {
                width: frame_width,
                height: frame_height,
            });
        }

        let path = self.root.join(relative_path);
        let sheet = decode_rgba(&path)?;
        let frames = slice_sheet(&sheet, frame_width, frame_height)?;
        if frames.is_empty() {
            return Err(AssetError::EmptySpriteSheet {
                path,
                width: frame_width,
                height: frame_height,
            });
        }
        debug!(
            path = %path.display(),
            frame_count = frames.len(),
            frame_width,
            frame_height,
            "sprite_sheet_loaded"
        );
        Ok(frames)
    }
}

fn decode_rgba(path: &Path) -> Result<RgbaImage, AssetError> {
    let reader = ImageReader::open(path).map_err(|source| AssetError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = reader
        .with_guessed_format()
        .map_err(|source| AssetError::Open {
            path: path.to_path_buf(),
            source,
        })?;
    let decoded = reader.decode().map_err(|source| AssetError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(decoded.to_rgba8())
}

fn slice_sheet(
    sheet: &RgbaImage,
    frame_width: u32,
    frame_height: u32,
) -> Result<Vec<Image>, AssetError> {
    let columns = sheet.width() / frame_width;
    let rows = sheet.height() / frame_height;
    let row_bytes = frame_width as usize * 4;
    let mut frames = Vec::with_capacity(columns as usize * rows as usize);

    for row in 0..rows {
        for column in 0..columns {
            let mut rgba = Vec::with_capacity(row_bytes * frame_height as usize);
            for y in 0..frame_height {
                let sheet_y = row * frame_height + y;
                let start =
                    (sheet_y as usize * sheet.width() as usize + (column * frame_width) as usize) * 4;
                rgba.extend_from_slice(&sheet.as_raw()[start..start + row_bytes]);
            }
            frames.push(Image::from_rgba(frame_width, frame_height, rgba)?);
        }
    }

    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use tempfile::TempDir;

    use crate::raster::Color;

    fn write_png(dir: &TempDir, name: &str, width: u32, height: u32) {
        let mut sheet = RgbaImage::new(width, height);
        for (x, y, pixel) in sheet.enumerate_pixels_mut() {
            *pixel = Rgba([(x % 256) as u8, (y % 256) as u8, 7, 255]);
        }
        sheet.save(dir.path().join(name)).expect("write png");
    }

    #[test]
    fn load_image_decodes_rgba() {
        let dir = TempDir::new().expect("tempdir");
        write_png(&dir, "ship.png", 4, 3);
        let loader = AssetLoader::new(dir.path());

        let image = loader.load_image("ship.png").expect("image");
        assert_eq!((image.width(), image.height()), (4, 3));
        assert_eq!(image.pixel(2, 1), Some(Color::rgba(2, 1, 7, 255)));
    }

    #[test]
    fn missing_image_is_an_open_error() {
        let dir = TempDir::new().expect("tempdir");
        let loader = AssetLoader::new(dir.path());
        let err = loader.load_image("img/missing.png").expect_err("missing");
        assert!(matches!(err, AssetError::Open { .. }));
    }

    #[test]
    fn sprite_sheet_slices_row_major_and_drops_partial_tiles() {
        let dir = TempDir::new().expect("tempdir");
        write_png(&dir, "sheet.png", 25, 20);
        let loader = AssetLoader::new(dir.path());

        let frames = loader
            .load_sprite_sheet("sheet.png", Size::new(10.0, 10.0))
            .expect("frames");
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[1].pixel(0, 0), Some(Color::rgba(10, 0, 7, 255)));
        assert_eq!(frames[2].pixel(0, 0), Some(Color::rgba(0, 10, 7, 255)));
        assert_eq!(frames[3].pixel(9, 9), Some(Color::rgba(19, 19, 7, 255)));
    }

    #[test]
    fn zero_frame_size_is_rejected() {
        let dir = TempDir::new().expect("tempdir");
        write_png(&dir, "sheet.png", 10, 10);
        let loader = AssetLoader::new(dir.path());
        let err = loader
            .load_sprite_sheet("sheet.png", Size::new(0.0, 10.0))
            .expect_err("zero width");
        assert!(matches!(err, AssetError::InvalidFrameSize { .. }));
    }

    #[test]
    fn sheet_smaller_than_one_frame_is_rejected() {
        let dir = TempDir::new().expect("tempdir");
        write_png(&dir, "tiny.png", 5, 5);
        let loader = AssetLoader::new(dir.path());
        let err = loader
            .load_sprite_sheet("tiny.png", Size::new(10.0, 10.0))
            .expect_err("too small");
        assert!(matches!(err, AssetError::EmptySpriteSheet { .. }));
    }
}
