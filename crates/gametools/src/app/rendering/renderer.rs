use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture, TextureError};
use winit::window::Window;

use crate::geometry::Position;

use super::FramePainter;

pub(crate) struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    buffer_width: u32,
    buffer_height: u32,
}

impl Renderer {
    pub(crate) fn new(window: Arc<Window>, buffer_width: u32, buffer_height: u32) -> Result<Self, Error> {
        let size = window.inner_size();
        let surface = SurfaceTexture::new(size.width.max(1), size.height.max(1), Arc::clone(&window));
        let buffer_width = buffer_width.max(1);
        let buffer_height = buffer_height.max(1);
        let pixels = Pixels::new(buffer_width, buffer_height, surface)?;
        Ok(Self {
            window,
            pixels,
            buffer_width,
            buffer_height,
        })
    }

    pub(crate) fn resize(&mut self, width: u32, height: u32) -> Result<(), TextureError> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels.resize_surface(width, height)
    }

    pub(crate) fn resize_to_window(&mut self) -> Result<(), TextureError> {
        let size = self.window.inner_size();
        self.resize(size.width, size.height)
    }

    pub(crate) fn frame_painter(&mut self) -> FramePainter<'_> {
        FramePainter::new(self.pixels.frame_mut(), self.buffer_width, self.buffer_height)
    }

    pub(crate) fn present(&self) -> Result<(), Error> {
        self.pixels.render()
    }

    pub(crate) fn window_pos_to_play_area(&self, x: f32, y: f32) -> Option<Position> {
        self.pixels
            .window_pos_to_pixel((x, y))
            .ok()
            .map(|(px, py)| Position::new(px as f32, py as f32))
    }
}
