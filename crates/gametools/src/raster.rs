use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::assets::AssetError;
use crate::geometry::Size;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "opaque")]
    pub a: u8,
}

fn opaque() -> u8 {
    255
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);
    pub const DARK_GRAY: Color = Color::rgb(64, 64, 64);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn from_rgb_hex(hex: u32) -> Self {
        Self::rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

struct Pixels {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

#[derive(Clone)]
pub struct Image {
    pixels: Rc<Pixels>,
}

impl Image {
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, AssetError> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(AssetError::RasterLength {
                expected,
                actual: rgba.len(),
            });
        }
        Ok(Self {
            pixels: Rc::new(Pixels {
                width,
                height,
                rgba,
            }),
        })
    }

    pub fn solid(size: Size, color: Color) -> Self {
        let width = size.width().round() as u32;
        let height = size.height().round() as u32;
        let rgba = color
            .to_array()
            .repeat(width as usize * height as usize);
        Self {
            pixels: Rc::new(Pixels {
                width,
                height,
                rgba,
            }),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width
    }

    pub fn height(&self) -> u32 {
        self.pixels.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.pixels.width as f32, self.pixels.height as f32)
    }

    pub fn rgba(&self) -> &[u8] {
        &self.pixels.rgba
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.pixels.width || y >= self.pixels.height {
            return None;
        }
        let offset = (y as usize * self.pixels.width as usize + x as usize) * 4;
        let px = self.pixels.rgba.get(offset..offset + 4)?;
        Some(Color::rgba(px[0], px[1], px[2], px[3]))
    }

    pub fn ptr_eq(&self, other: &Image) -> bool {
        Rc::ptr_eq(&self.pixels, &other.pixels)
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("width", &self.pixels.width)
            .field("height", &self.pixels.height)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgba_rejects_length_mismatch() {
        let err = Image::from_rgba(2, 2, vec![0; 15]).expect_err("mismatch");
        assert!(matches!(
            err,
            AssetError::RasterLength {
                expected: 16,
                actual: 15
            }
        ));
    }

    #[test]
    fn solid_box_fills_every_pixel() {
        let image = Image::solid(Size::new(3.0, 2.0), Color::BLUE);
        assert_eq!((image.width(), image.height()), (3, 2));
        assert_eq!(image.pixel(2, 1), Some(Color::BLUE));
        assert_eq!(image.pixel(3, 0), None);
    }

    #[test]
    fn clones_share_pixels() {
        let image = Image::solid(Size::new(1.0, 1.0), Color::RED);
        let copy = image.clone();
        assert!(image.ptr_eq(&copy));
    }

    #[test]
    fn hex_colors_unpack_channels() {
        assert_eq!(Color::from_rgb_hex(0x0b1037), Color::rgb(0x0b, 0x10, 0x37));
    }
}
