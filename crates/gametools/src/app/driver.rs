use tracing::info;

use crate::assets::{AssetError, AssetLoader};
use crate::painter::{HeadlessPainter, Painter};

use super::game::{Frame, Game, GameCommand, Setup, WindowSettings};
use super::input::InputSnapshot;

pub struct TickDriver<G: Game> {
    game: G,
    settings: WindowSettings,
    assets: AssetLoader,
    tick: u64,
    started: bool,
}

impl<G: Game> TickDriver<G> {
    pub fn new(mut game: G, assets: AssetLoader) -> Self {
        let mut settings = WindowSettings::default();
        game.window(&mut settings);
        Self {
            game,
            settings,
            assets,
            tick: 0,
            started: false,
        }
    }

    pub fn settings(&self) -> &WindowSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut WindowSettings {
        &mut self.settings
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut G {
        &mut self.game
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn start(&mut self) -> Result<(), AssetError> {
        self.run_setup()?;
        self.started = true;
        info!(
            title = %self.settings.title,
            width = self.settings.width,
            height = self.settings.height,
            "game_started"
        );
        Ok(())
    }

    fn run_setup(&mut self) -> Result<(), AssetError> {
        let mut setup = Setup::new(&self.settings, &self.assets);
        self.game.setup(&mut setup)?;
        self.tick = 0;
        Ok(())
    }

    /// Runs one tick. `Reset` is handled here by re-running setup; it is still
    /// returned so the caller can log or react.
    pub fn tick(
        &mut self,
        input: &InputSnapshot,
        painter: &mut dyn Painter,
    ) -> Result<GameCommand, AssetError> {
        if let Some(gravity) = self.game.gravity() {
            gravity.step();
        }

        let command = {
            let mut frame = Frame::new(input, painter, self.tick);
            self.game.run(&mut frame)
        };
        self.tick = self.tick.saturating_add(1);

        if command == GameCommand::Reset {
            info!(ticks = self.tick, "game_reset");
            self.run_setup()?;
        }
        Ok(command)
    }

    pub fn run_headless<F>(&mut self, ticks: u64, mut input: F) -> Result<u64, AssetError>
    where
        F: FnMut(u64) -> InputSnapshot,
    {
        if !self.started {
            self.start()?;
        }
        let mut painter = HeadlessPainter::with_area(self.settings.play_area());
        let mut ran = 0;
        while ran < ticks {
            painter.clear();
            let snapshot = input(ran);
            let command = self.tick(&snapshot, &mut painter)?;
            ran += 1;
            if command == GameCommand::Quit {
                info!(ticks = ran, "headless_quit");
                break;
            }
        }
        Ok(ran)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Position, Size};
    use crate::gravity::Gravity;
    use crate::group::Group;
    use crate::raster::{Color, Image};
    use crate::sprite::{Sprite, SpriteRef};

    #[derive(Default)]
    struct Counter {
        setups: u32,
        runs: u64,
        reset_at: Option<u64>,
        quit_at: Option<u64>,
        gravity: Option<Gravity>,
        faller: Option<SpriteRef>,
        observed_fall: Vec<f32>,
        dots: Group,
    }

    impl Game for Counter {
        fn window(&mut self, settings: &mut WindowSettings) {
            settings.width = 320;
            settings.height = 200;
            settings.gravity.default_percent = 50.0;
        }

        fn setup(&mut self, setup: &mut Setup<'_>) -> Result<(), AssetError> {
            self.setups += 1;
            self.dots.clear();
            self.dots.add(SpriteRef::new(Sprite::new(Image::solid(
                Size::new(4.0, 4.0),
                Color::WHITE,
            ))));
            let gravity = Gravity::new(setup.settings().gravity);
            let faller = SpriteRef::new(Sprite::new(Image::solid(
                Size::new(2.0, 2.0),
                Color::RED,
            )));
            gravity.add_mass(&faller);
            self.gravity = Some(gravity);
            self.faller = Some(faller);
            Ok(())
        }

        fn run(&mut self, frame: &mut Frame<'_>) -> GameCommand {
            self.runs += 1;
            if let Some(faller) = &self.faller {
                self.observed_fall.push(faller.borrow().y());
            }
            self.dots.draw_all(frame.painter());
            if Some(frame.tick()) == self.reset_at {
                self.reset_at = None;
                return GameCommand::Reset;
            }
            if Some(self.runs) == self.quit_at {
                return GameCommand::Quit;
            }
            GameCommand::Continue
        }

        fn gravity(&self) -> Option<&Gravity> {
            self.gravity.as_ref()
        }
    }

    fn driver(game: Counter) -> TickDriver<Counter> {
        TickDriver::new(game, AssetLoader::new("."))
    }

    #[test]
    fn window_hook_shapes_settings_before_setup() {
        let driver = driver(Counter::default());
        assert_eq!(driver.settings().play_area().width(), 320.0);
        assert_eq!(driver.settings().gravity.default_percent, 50.0);
        assert!(!driver.is_started());
        assert_eq!(driver.game().setups, 0);
    }

    #[test]
    fn headless_run_counts_ticks_and_steps_gravity_before_run() {
        let mut driver = driver(Counter::default());
        let ran = driver
            .run_headless(3, |_| InputSnapshot::default())
            .expect("headless run");

        assert_eq!(ran, 3);
        assert_eq!(driver.tick_count(), 3);
        assert_eq!(driver.game().setups, 1);
        let fall = &driver.game().observed_fall;
        assert!((fall[0] - 0.5).abs() < 0.0001);
        assert!((fall[1] - 1.5).abs() < 0.0001);
    }

    #[test]
    fn reset_reruns_setup_and_restarts_tick_counter() {
        let mut driver = driver(Counter {
            reset_at: Some(2),
            ..Counter::default()
        });
        driver
            .run_headless(5, |_| InputSnapshot::default())
            .expect("headless run");

        assert_eq!(driver.game().setups, 2);
        assert_eq!(driver.game().dots.len(), 1);
        assert_eq!(driver.tick_count(), 2);
    }

    #[test]
    fn quit_stops_headless_run_early() {
        let mut driver = driver(Counter {
            quit_at: Some(4),
            ..Counter::default()
        });
        let ran = driver
            .run_headless(100, |_| InputSnapshot::default())
            .expect("headless run");
        assert_eq!(ran, 4);
    }

    #[test]
    fn frame_exposes_input_and_play_area() {
        let input = InputSnapshot::default().with_mouse_at(Position::new(1.0, 2.0));
        let mut painter = HeadlessPainter::new(64, 32);
        let frame = Frame::new(&input, &mut painter, 7);
        assert_eq!(frame.tick(), 7);
        assert_eq!(frame.play_area().width(), 64.0);
        assert_eq!(frame.input().mouse_position(), Some(Position::new(1.0, 2.0)));
    }
}
