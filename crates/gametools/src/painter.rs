use crate::geometry::{Area, Position};
use crate::raster::{Color, Image};

pub trait Painter {
    fn area(&self) -> Area;

    fn draw_image(&mut self, image: &Image, position: Position, angle: f32);

    fn draw_text(&mut self, text: &str, position: Position, color: Color);

    fn fill_rect(&mut self, rect: Area, color: Color);

    fn stroke_rect(&mut self, rect: Area, color: Color);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Image {
        width: u32,
        height: u32,
        position: Position,
        angle: f32,
    },
    Text {
        text: String,
        position: Position,
        color: Color,
    },
    FillRect {
        rect: Area,
        color: Color,
    },
    StrokeRect {
        rect: Area,
        color: Color,
    },
}

#[derive(Debug, Clone)]
pub struct HeadlessPainter {
    area: Area,
    calls: Vec<DrawCall>,
}

impl HeadlessPainter {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_area(Area::from_origin(width as f32, height as f32))
    }

    pub fn with_area(area: Area) -> Self {
        Self {
            area,
            calls: Vec::new(),
        }
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    pub fn image_draw_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, DrawCall::Image { .. }))
            .count()
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.calls.iter().filter_map(|call| match call {
            DrawCall::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

impl Painter for HeadlessPainter {
    fn area(&self) -> Area {
        self.area
    }

    fn draw_image(&mut self, image: &Image, position: Position, angle: f32) {
        self.calls.push(DrawCall::Image {
            width: image.width(),
            height: image.height(),
            position,
            angle,
        });
    }

    fn draw_text(&mut self, text: &str, position: Position, color: Color) {
        self.calls.push(DrawCall::Text {
            text: text.to_owned(),
            position,
            color,
        });
    }

    fn fill_rect(&mut self, rect: Area, color: Color) {
        self.calls.push(DrawCall::FillRect { rect, color });
    }

    fn stroke_rect(&mut self, rect: Area, color: Color) {
        self.calls.push(DrawCall::StrokeRect { rect, color });
    }
}
