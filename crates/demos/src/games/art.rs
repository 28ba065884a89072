use gametools::{AssetError, Color, Image, Setup, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum ArtSource {
    #[default]
    Files,
    Generated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Art {
    Ship,
    Star,
    Missile,
    Plasma,
    Alien,
    Heart,
    Green,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Sheet {
    ExplosionSmall,
    ExplosionLarge,
}

pub(crate) const SHEET_COLUMNS: u32 = 3;
pub(crate) const SHEET_ROWS: u32 = 2;

impl Art {
    #[cfg(test)]
    pub(crate) const ALL: [Art; 7] = [
        Art::Ship,
        Art::Star,
        Art::Missile,
        Art::Plasma,
        Art::Alien,
        Art::Heart,
        Art::Green,
    ];

    pub(crate) fn path(self) -> &'static str {
        match self {
            Art::Ship => "img/ship.png",
            Art::Star => "img/star.png",
            Art::Missile => "img/missile.png",
            Art::Plasma => "img/plasma.png",
            Art::Alien => "img/alien.png",
            Art::Heart => "img/heart.png",
            Art::Green => "img/green.png",
        }
    }

    pub(crate) fn dimensions(self) -> (u32, u32) {
        match self {
            Art::Ship => (40, 40),
            Art::Star => (3, 3),
            Art::Missile => (16, 6),
            Art::Plasma => (12, 12),
            Art::Alien => (56, 56),
            Art::Heart => (24, 24),
            Art::Green => (36, 36),
        }
    }

    /// Color at normalized coordinates, both in -1..1 with y pointing down.
    fn shade(self, nx: f32, ny: f32) -> Color {
        let radius = (nx * nx + ny * ny).sqrt();
        match self {
            Art::Ship => {
                let half_span = (0.9 - nx) * 0.45;
                if !(-0.9..=0.9).contains(&nx) || ny.abs() > half_span {
                    Color::TRANSPARENT
                } else if (nx - 0.1).powi(2) + ny * ny < 0.04 {
                    Color::rgb(90, 200, 255)
                } else {
                    Color::rgb(200, 210, 230)
                }
            }
            Art::Star => {
                if nx.abs() > 0.5 && ny.abs() > 0.5 {
                    Color::TRANSPARENT
                } else {
                    Color::WHITE
                }
            }
            Art::Missile => {
                if nx > 0.6 {
                    Color::rgb(230, 60, 40)
                } else {
                    Color::rgb(255, 200, 60)
                }
            }
            Art::Plasma => {
                if radius > 1.0 {
                    Color::TRANSPARENT
                } else if radius < 0.4 {
                    Color::WHITE
                } else {
                    Color::rgb(120, 255, 160)
                }
            }
            Art::Alien => {
                let eye = |cx: f32| (nx - cx).powi(2) + (ny + 0.2).powi(2) < 0.0225;
                if radius > 0.95 {
                    Color::TRANSPARENT
                } else if eye(-0.35) || eye(0.35) {
                    Color::BLACK
                } else {
                    Color::rgb(80, 200, 80)
                }
            }
            Art::Heart => {
                let x = nx * 1.3;
                let y = -ny * 1.3 + 0.2;
                let curve = (x * x + y * y - 1.0).powi(3) - x * x * y.powi(3);
                if curve <= 0.0 {
                    Color::rgb(220, 30, 60)
                } else {
                    Color::TRANSPARENT
                }
            }
            Art::Green => {
                if nx.abs() > 0.85 || ny.abs() > 0.85 {
                    Color::rgb(20, 120, 20)
                } else {
                    Color::rgb(40, 220, 40)
                }
            }
        }
    }

    pub(crate) fn generate(self) -> Result<Image, AssetError> {
        let (width, height) = self.dimensions();
        paint(width, height, |nx, ny| self.shade(nx, ny))
    }
}

impl Sheet {
    pub(crate) fn path(self) -> &'static str {
        match self {
            Sheet::ExplosionSmall => "img/explosion-small.png",
            Sheet::ExplosionLarge => "img/explosion-large.png",
        }
    }

    pub(crate) fn frame_side(self) -> u32 {
        match self {
            Sheet::ExplosionSmall => 30,
            Sheet::ExplosionLarge => 60,
        }
    }

    pub(crate) fn frame_count(self) -> u32 {
        SHEET_COLUMNS * SHEET_ROWS
    }

    pub(crate) fn generate(self) -> Result<Vec<Image>, AssetError> {
        let side = self.frame_side();
        let count = self.frame_count();
        (0..count)
            .map(|index| {
                let progress = index as f32 / (count - 1) as f32;
                paint(side, side, |nx, ny| explosion_shade(progress, nx, ny))
            })
            .collect()
    }
}

fn explosion_shade(progress: f32, nx: f32, ny: f32) -> Color {
    let reach = 0.3 + 0.7 * progress;
    let radius = (nx * nx + ny * ny).sqrt();
    if radius > reach {
        return Color::TRANSPARENT;
    }
    let heat = 1.0 - radius / reach;
    let alpha = (255.0 * (1.0 - 0.7 * progress)) as u8;
    Color::rgba(255, (80.0 + 175.0 * heat) as u8, (40.0 * heat) as u8, alpha)
}

fn paint<F>(width: u32, height: u32, shade: F) -> Result<Image, AssetError>
where
    F: Fn(f32, f32) -> Color,
{
    let mut rgba = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        let ny = (y as f32 + 0.5) / height as f32 * 2.0 - 1.0;
        for x in 0..width {
            let nx = (x as f32 + 0.5) / width as f32 * 2.0 - 1.0;
            rgba.extend_from_slice(&shade(nx, ny).to_array());
        }
    }
    Image::from_rgba(width, height, rgba)
}

impl ArtSource {
    pub(crate) fn image(self, setup: &Setup<'_>, art: Art) -> Result<Image, AssetError> {
        match self {
            ArtSource::Files => setup.load_image(art.path()),
            ArtSource::Generated => art.generate(),
        }
    }

    pub(crate) fn frames(self, setup: &Setup<'_>, sheet: Sheet) -> Result<Vec<Image>, AssetError> {
        match self {
            ArtSource::Files => {
                let side = sheet.frame_side() as f32;
                setup.load_sprite_sheet(sheet.path(), Size::new(side, side))
            }
            ArtSource::Generated => sheet.generate(),
        }
    }
}
