mod font;
mod frame_painter;
mod renderer;

pub use frame_painter::FramePainter;
pub(crate) use renderer::Renderer;
