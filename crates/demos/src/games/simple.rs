use fastrand::Rng;
use gametools::{
    AssetError, Color, Direction, Frame, Game, GameCommand, Group, Image, Key, Position, Rotation,
    Setup, Sprite, SpriteRef, WindowSettings,
};
use tracing::debug;

use super::art::{Art, ArtSource};
use super::util::random_position;

const DOT_INTERVAL_TICKS: i32 = 60;

pub(crate) struct Simple {
    art: ArtSource,
    rng: Rng,
    state: Option<SimpleState>,
}

struct SimpleState {
    heart: Image,
    dot: Image,
    player: SpriteRef,
    dots: Group,
    timer: i32,
}

impl Simple {
    pub(crate) fn new(art: ArtSource, rng: Rng) -> Self {
        Self {
            art,
            rng,
            state: None,
        }
    }
}

impl Game for Simple {
    fn window(&mut self, settings: &mut WindowSettings) {
        settings.title = "Simple Example Game".to_string();
        settings.width = 800;
        settings.height = 800;
        settings.background = Color::BLUE;
    }

    fn setup(&mut self, setup: &mut Setup<'_>) -> Result<(), AssetError> {
        let area = setup.play_area();
        let mut player = Sprite::new(self.art.image(setup, Art::Ship)?);
        player.lock_movement_area(area);
        player.center_on(&area.center());
        player.set_relational_movement(true);

        self.state = Some(SimpleState {
            heart: self.art.image(setup, Art::Heart)?,
            dot: self.art.image(setup, Art::Green)?,
            player: SpriteRef::new(player),
            dots: Group::new(),
            timer: 0,
        });
        Ok(())
    }

    fn run(&mut self, frame: &mut Frame<'_>) -> GameCommand {
        let Some(state) = self.state.as_mut() else {
            return GameCommand::Continue;
        };
        let input = *frame.input();
        let area = frame.play_area();

        {
            let mut player = state.player.borrow_mut();
            if input.is_down(Key::W) {
                player.move_in(Direction::East);
            }
            if input.is_down(Key::D) {
                player.turn(Rotation::Clockwise);
            }
            if input.is_down(Key::A) {
                player.turn(Rotation::CounterClockwise);
            }
        }

        let painter = frame.painter();
        painter.draw_text("Hello World!", Position::new(200.0, 200.0), Color::WHITE);
        painter.draw_image(&state.heart, Position::new(200.0, 600.0), 0.0);

        state.timer -= 1;
        if state.timer < 0 {
            let position = random_position(&mut self.rng, area, state.dot.size());
            state.dots.spawn(Sprite::at(position, state.dot.clone()));
            state.timer = DOT_INTERVAL_TICKS;
        }

        let eaten = state.dots.get_all_within(&state.player);
        if !eaten.is_empty() {
            debug!(count = eaten.len(), "dots_eaten");
        }
        state.dots.remove_all(&eaten);
        state.dots.draw_all(painter);
        state.player.draw(painter);
        GameCommand::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gametools::{AssetLoader, DrawCall, HeadlessPainter, InputSnapshot, TickDriver};

    fn started() -> TickDriver<Simple> {
        let mut driver = TickDriver::new(
            Simple::new(ArtSource::Generated, Rng::with_seed(11)),
            AssetLoader::new("."),
        );
        driver.start().expect("setup");
        driver
    }

    fn state(driver: &TickDriver<Simple>) -> &SimpleState {
        driver.game().state.as_ref().expect("state after setup")
    }

    fn tick(driver: &mut TickDriver<Simple>, input: InputSnapshot) -> HeadlessPainter {
        let mut painter = HeadlessPainter::with_area(driver.settings().play_area());
        driver.tick(&input, &mut painter).expect("tick");
        painter
    }

    #[test]
    fn player_starts_centered_and_locked() {
        let driver = started();
        let player = state(&driver).player.borrow();
        assert_eq!(player.center(), Position::new(400.0, 400.0));
        assert!(player.movement_area().is_some());
        assert!(player.relational_movement());
    }

    #[test]
    fn forward_key_moves_along_heading() {
        let mut driver = started();
        tick(&mut driver, InputSnapshot::default().with_key_down(Key::D));
        let angle = state(&driver).player.borrow().angle();
        assert!((angle - 5.0).abs() < 0.0001);

        state(&driver).player.borrow_mut().set_angle(90.0);
        let before = state(&driver).player.borrow().position();
        tick(&mut driver, InputSnapshot::default().with_key_down(Key::W));
        let after = state(&driver).player.borrow().position();
        assert!((after.x - before.x).abs() < 0.0001);
        assert!((after.y - before.y - 5.0).abs() < 0.0001);
    }

    #[test]
    fn dots_spawn_once_per_interval() {
        let mut driver = started();
        for _ in 0..62 {
            tick(&mut driver, InputSnapshot::default());
        }
        assert!(state(&driver).dots.len() <= 2);
        assert_eq!(state(&driver).timer, DOT_INTERVAL_TICKS);
    }

    #[test]
    fn dot_under_the_player_is_eaten() {
        let mut driver = started();
        let center = state(&driver).player.borrow().center();
        let dot = state(&driver)
            .dots
            .spawn(Sprite::at(center, state(&driver).dot.clone()));

        tick(&mut driver, InputSnapshot::default());
        assert!(!state(&driver).dots.contains(&dot));
    }

    #[test]
    fn frame_draws_greeting_heart_and_player() {
        let mut driver = started();
        let painter = tick(&mut driver, InputSnapshot::default());
        assert_eq!(painter.texts().collect::<Vec<_>>(), vec!["Hello World!"]);
        assert!(painter.calls().iter().any(|call| matches!(
            call,
            DrawCall::Image { width: 24, height: 24, .. }
        )));
        let dots = state(&driver).dots.len();
        assert_eq!(painter.image_draw_count(), 2 + dots);
    }
}
