use std::time::Duration;

use crate::assets::{AssetError, AssetLoader};
use crate::geometry::{Area, Size};
use crate::gravity::{Gravity, GravityConfig};
use crate::painter::Painter;
use crate::raster::{Color, Image};

use super::input::InputSnapshot;

#[derive(Debug, Clone, PartialEq)]
pub struct WindowSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub background: Color,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub gravity: GravityConfig,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "gametools".to_string(),
            width: 800,
            height: 600,
            background: Color::BLACK,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            gravity: GravityConfig::default(),
        }
    }
}

impl WindowSettings {
    pub fn play_area(&self) -> Area {
        Area::from_origin(self.width.max(1) as f32, self.height.max(1) as f32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameCommand {
    Continue,
    Reset,
    Quit,
}

pub struct Setup<'a> {
    settings: &'a WindowSettings,
    assets: &'a AssetLoader,
}

impl<'a> Setup<'a> {
    pub(crate) fn new(settings: &'a WindowSettings, assets: &'a AssetLoader) -> Self {
        Self { settings, assets }
    }

    pub fn settings(&self) -> &WindowSettings {
        self.settings
    }

    pub fn play_area(&self) -> Area {
        self.settings.play_area()
    }

    pub fn assets(&self) -> &AssetLoader {
        self.assets
    }

    pub fn load_image(&self, relative_path: &str) -> Result<Image, AssetError> {
        self.assets.load_image(relative_path)
    }

    pub fn load_sprite_sheet(
        &self,
        relative_path: &str,
        frame_size: Size,
    ) -> Result<Vec<Image>, AssetError> {
        self.assets.load_sprite_sheet(relative_path, frame_size)
    }
}

pub struct Frame<'a> {
    input: &'a InputSnapshot,
    painter: &'a mut dyn Painter,
    tick: u64,
}

impl<'a> Frame<'a> {
    pub fn new(input: &'a InputSnapshot, painter: &'a mut dyn Painter, tick: u64) -> Self {
        Self {
            input,
            painter,
            tick,
        }
    }

    pub fn input(&self) -> &InputSnapshot {
        self.input
    }

    pub fn painter(&mut self) -> &mut (dyn Painter + 'a) {
        &mut *self.painter
    }

    pub fn play_area(&self) -> Area {
        self.painter.area()
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }
}

pub trait Game {
    fn window(&mut self, settings: &mut WindowSettings) {
        let _ = settings;
    }

    fn setup(&mut self, setup: &mut Setup<'_>) -> Result<(), AssetError>;

    fn run(&mut self, frame: &mut Frame<'_>) -> GameCommand;

    fn gravity(&self) -> Option<&Gravity> {
        None
    }
}
