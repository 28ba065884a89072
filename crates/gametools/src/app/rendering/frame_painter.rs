use crate::geometry::{Area, Position};
use crate::painter::Painter;
use crate::raster::{Color, Image};

use super::font::draw_text_clipped;

pub struct FramePainter<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
}

impl<'a> FramePainter<'a> {
    /// `frame` must hold `width * height` RGBA8 pixels; writes past its end are dropped.
    pub fn new(frame: &'a mut [u8], width: u32, height: u32) -> Self {
        Self {
            frame,
            width,
            height,
        }
    }

    pub fn clear(&mut self, color: Color) {
        let rgba = color.to_array();
        for pixel in self.frame.chunks_exact_mut(4) {
            pixel.copy_from_slice(&rgba);
        }
    }
}

impl Painter for FramePainter<'_> {
    fn area(&self) -> Area {
        Area::from_origin(self.width as f32, self.height as f32)
    }

    fn draw_image(&mut self, image: &Image, position: Position, angle: f32) {
        blit_rotated(self.frame, self.width, self.height, image, position, angle);
    }

    fn draw_text(&mut self, text: &str, position: Position, color: Color) {
        draw_text_clipped(
            self.frame,
            self.width,
            self.height,
            (position.x.round() as i32, position.y.round() as i32),
            text,
            color.to_array(),
        );
    }

    fn fill_rect(&mut self, rect: Area, color: Color) {
        let (left, top, right, bottom) = pixel_bounds(rect);
        for y in top..bottom {
            for x in left..right {
                write_pixel_rgba_clipped(self.frame, self.width, self.height, x, y, color.to_array());
            }
        }
    }

    fn stroke_rect(&mut self, rect: Area, color: Color) {
        let (left, top, right, bottom) = pixel_bounds(rect);
        if right - left < 1 || bottom - top < 1 {
            return;
        }
        let rgba = color.to_array();
        for x in left..right {
            write_pixel_rgba_clipped(self.frame, self.width, self.height, x, top, rgba);
            write_pixel_rgba_clipped(self.frame, self.width, self.height, x, bottom - 1, rgba);
        }
        for y in top..bottom {
            write_pixel_rgba_clipped(self.frame, self.width, self.height, left, y, rgba);
            write_pixel_rgba_clipped(self.frame, self.width, self.height, right - 1, y, rgba);
        }
    }
}

fn pixel_bounds(rect: Area) -> (i32, i32, i32, i32) {
    (
        rect.left().round() as i32,
        rect.top().round() as i32,
        rect.right().round() as i32,
        rect.bottom().round() as i32,
    )
}

pub(crate) fn write_pixel_rgba_clipped(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    color: [u8; 4],
) {
    if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 || color[3] == 0 {
        return;
    }
    let offset = (y as usize * width as usize + x as usize) * 4;
    let Some(dst) = frame.get_mut(offset..offset + 4) else {
        return;
    };
    if color[3] == u8::MAX {
        dst.copy_from_slice(&color);
        return;
    }
    let alpha = color[3] as u32;
    for channel in 0..3 {
        let blended = (color[channel] as u32 * alpha + dst[channel] as u32 * (255 - alpha)) / 255;
        dst[channel] = blended as u8;
    }
    dst[3] = dst[3].max(color[3]);
}

fn blit_rotated(
    frame: &mut [u8],
    width: u32,
    height: u32,
    image: &Image,
    position: Position,
    angle: f32,
) {
    let (image_w, image_h) = (image.width(), image.height());
    if image_w == 0 || image_h == 0 || width == 0 || height == 0 {
        return;
    }

    let half_w = image_w as f32 * 0.5;
    let half_h = image_h as f32 * 0.5;
    let center_x = position.x + half_w;
    let center_y = position.y + half_h;
    let (sin, cos) = if angle == 0.0 {
        (0.0, 1.0)
    } else {
        angle.to_radians().sin_cos()
    };

    let reach = if angle == 0.0 {
        (half_w, half_h)
    } else {
        let radius = (half_w * half_w + half_h * half_h).sqrt();
        (radius, radius)
    };
    let left = ((center_x - reach.0).floor() as i32).max(0);
    let top = ((center_y - reach.1).floor() as i32).max(0);
    let right = ((center_x + reach.0).ceil() as i32).min(width as i32);
    let bottom = ((center_y + reach.1).ceil() as i32).min(height as i32);

    let rgba = image.rgba();
    for out_y in top..bottom {
        let dy = out_y as f32 + 0.5 - center_y;
        for out_x in left..right {
            let dx = out_x as f32 + 0.5 - center_x;
            let src_x = (dx * cos + dy * sin + half_w).floor();
            let src_y = (-dx * sin + dy * cos + half_h).floor();
            if src_x < 0.0 || src_y < 0.0 || src_x >= image_w as f32 || src_y >= image_h as f32 {
                continue;
            }
            let offset = (src_y as usize * image_w as usize + src_x as usize) * 4;
            let Some(texel) = rgba.get(offset..offset + 4) else {
                continue;
            };
            write_pixel_rgba_clipped(
                frame,
                width,
                height,
                out_x,
                out_y,
                [texel[0], texel[1], texel[2], texel[3]],
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;

    fn pixel(frame: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
        let offset = ((y * width + x) * 4) as usize;
        [
            frame[offset],
            frame[offset + 1],
            frame[offset + 2],
            frame[offset + 3],
        ]
    }

    fn painted_extent(frame: &[u8], width: u32, height: u32) -> (u32, u32) {
        let mut columns = 0;
        for x in 0..width {
            if (0..height).any(|y| pixel(frame, width, x, y) != [0, 0, 0, 255]) {
                columns += 1;
            }
        }
        let mut rows = 0;
        for y in 0..height {
            if (0..width).any(|x| pixel(frame, width, x, y) != [0, 0, 0, 255]) {
                rows += 1;
            }
        }
        (columns, rows)
    }

    #[test]
    fn unrotated_image_lands_at_its_top_left_corner() {
        let mut frame = vec![0u8; 10 * 10 * 4];
        let mut painter = FramePainter::new(&mut frame, 10, 10);
        painter.clear(Color::BLACK);
        let image = Image::solid(Size::new(2.0, 3.0), Color::RED);
        painter.draw_image(&image, Position::new(4.0, 5.0), 0.0);

        assert_eq!(pixel(&frame, 10, 4, 5), [255, 0, 0, 255]);
        assert_eq!(pixel(&frame, 10, 5, 7), [255, 0, 0, 255]);
        assert_eq!(pixel(&frame, 10, 6, 5), [0, 0, 0, 255]);
        assert_eq!(pixel(&frame, 10, 4, 8), [0, 0, 0, 255]);
    }

    #[test]
    fn quarter_turn_swaps_the_painted_extent() {
        let mut frame = vec![0u8; 20 * 20 * 4];
        let mut painter = FramePainter::new(&mut frame, 20, 20);
        painter.clear(Color::BLACK);
        let image = Image::solid(Size::new(8.0, 2.0), Color::WHITE);
        painter.draw_image(&image, Position::new(6.0, 9.0), 90.0);

        let (columns, rows) = painted_extent(&frame, 20, 20);
        assert!(rows >= 7);
        assert!(columns <= 3);
    }

    #[test]
    fn transparent_texels_are_skipped() {
        let mut frame = vec![0u8; 4 * 4 * 4];
        let mut painter = FramePainter::new(&mut frame, 4, 4);
        painter.clear(Color::BLUE);
        let image = Image::solid(Size::new(4.0, 4.0), Color::TRANSPARENT);
        painter.draw_image(&image, Position::ZERO, 0.0);
        assert_eq!(pixel(&frame, 4, 1, 1), Color::BLUE.to_array());
    }

    #[test]
    fn partially_off_screen_drawing_is_clipped() {
        let mut frame = vec![0u8; 4 * 4 * 4];
        let mut painter = FramePainter::new(&mut frame, 4, 4);
        let image = Image::solid(Size::new(6.0, 6.0), Color::GREEN);
        painter.draw_image(&image, Position::new(-3.0, -3.0), 30.0);
        painter.fill_rect(Area::new(Position::new(2.0, 2.0), Size::new(50.0, 50.0)), Color::RED);
        painter.stroke_rect(Area::new(Position::new(-1.0, -1.0), Size::new(3.0, 3.0)), Color::WHITE);
        painter.draw_text("OFF", Position::new(3.0, 3.0), Color::WHITE);
        assert_eq!(pixel(&frame, 4, 3, 3)[..3], [255, 255, 255]);
    }

    #[test]
    fn fill_and_stroke_cover_expected_pixels() {
        let mut frame = vec![0u8; 8 * 8 * 4];
        let mut painter = FramePainter::new(&mut frame, 8, 8);
        painter.clear(Color::BLACK);
        painter.stroke_rect(Area::new(Position::new(1.0, 1.0), Size::new(4.0, 4.0)), Color::WHITE);
        painter.fill_rect(Area::new(Position::new(6.0, 6.0), Size::new(2.0, 2.0)), Color::RED);

        assert_eq!(pixel(&frame, 8, 1, 1), [255, 255, 255, 255]);
        assert_eq!(pixel(&frame, 8, 4, 4), [255, 255, 255, 255]);
        assert_eq!(pixel(&frame, 8, 2, 2), [0, 0, 0, 255]);
        assert_eq!(pixel(&frame, 8, 7, 7), [255, 0, 0, 255]);
    }

    #[test]
    fn half_transparent_fill_blends() {
        let mut frame = vec![0u8; 4];
        let mut painter = FramePainter::new(&mut frame, 1, 1);
        painter.clear(Color::BLACK);
        painter.fill_rect(Area::from_origin(1.0, 1.0), Color::rgba(255, 255, 255, 128));
        let value = pixel(&frame, 1, 0, 0);
        assert!(value[0] > 120 && value[0] < 135);
        assert_eq!(value[3], 255);
    }
}
