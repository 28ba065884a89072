use fastrand::Rng;
use gametools::{
    Area, AssetError, Color, Direction, Frame, Game, GameCommand, Gravity, Group, Image, Key,
    Position, Setup, Size, Sprite, SpriteRef, WindowSettings,
};
use tracing::{debug, info};

use super::art::{Art, ArtSource};
use super::util::random_below;

const GRAVITY_PERCENT: f32 = 75.0;
const PLAYER_SPEED: f32 = 10.0;
const JUMP_IMPULSE: f32 = 18.0;
const START_HEALTH: i32 = 3;
const START_PLATFORMS: u32 = 9;
const PLATFORM_HEIGHT: f32 = 30.0;
const START_PLATFORM_WIDTH: f32 = 160.0;
const MIN_PLATFORM_WIDTH: f32 = 40.0;
const START_SCROLL_SPEED: f32 = 1.5;
const MAX_SCROLL_SPEED: f32 = 4.5;
const SCROLL_SPEED_STEP: f32 = 0.02;
const START_SPACING: f32 = 30.0;
const MAX_SPACING: f32 = 80.0;
const DIFFICULTY_PERIOD: u64 = 30;
const BONUS_RATE: f64 = 0.15;
const BONUS_DISPLAY_TICKS: i32 = 60;

pub(crate) struct Platformer {
    art: ArtSource,
    rng: Rng,
    state: Option<PlatformerState>,
}

struct PlatformerState {
    gravity: Gravity,
    platforms: Group,
    player: SpriteRef,
    heart: Image,
    platform: Image,
    score: u64,
    time: u64,
    spacing: f32,
    scroll_speed: f32,
    health: i32,
    bonus_countdown: i32,
    last_bonus: u64,
}

impl Platformer {
    pub(crate) fn new(art: ArtSource, rng: Rng) -> Self {
        Self {
            art,
            rng,
            state: None,
        }
    }
}

fn platform_image(width: f32, color: Color) -> Image {
    Image::solid(Size::new(width, PLATFORM_HEIGHT), color)
}

impl Game for Platformer {
    fn window(&mut self, settings: &mut WindowSettings) {
        settings.title = "Example Platform Game".to_string();
        settings.width = 800;
        settings.height = 800;
        settings.background = Color::DARK_GRAY;
        settings.gravity.default_percent = GRAVITY_PERCENT;
    }

    fn setup(&mut self, setup: &mut Setup<'_>) -> Result<(), AssetError> {
        let area = setup.play_area();
        let gravity = Gravity::new(setup.settings().gravity);
        let platforms = gravity.ground().clone();

        let mut player = Sprite::new(self.art.image(setup, Art::Green)?);
        player.set_speed(PLAYER_SPEED);
        let player = SpriteRef::new(player);
        gravity.add_mass(&player);

        let platform = platform_image(START_PLATFORM_WIDTH, Color::BLUE);
        let free_width = area.width() - platform.size().width();
        for row in 0..START_PLATFORMS {
            let position = Position::new(
                random_below(&mut self.rng, free_width),
                row as f32 * 80.0 + 60.0,
            );
            platforms.spawn(Sprite::at(position, platform.clone()));
        }
        platforms.remove_when_off_screen();

        let mut state = PlatformerState {
            gravity,
            platforms,
            player,
            heart: self.art.image(setup, Art::Heart)?,
            platform,
            score: 0,
            time: 0,
            spacing: START_SPACING,
            scroll_speed: START_SCROLL_SPEED,
            health: START_HEALTH,
            bonus_countdown: 0,
            last_bonus: 0,
        };
        state.respawn(area);
        self.state = Some(state);
        Ok(())
    }

    fn run(&mut self, frame: &mut Frame<'_>) -> GameCommand {
        let Some(state) = self.state.as_mut() else {
            return GameCommand::Continue;
        };
        let input = *frame.input();
        let area = frame.play_area();
        state.score += 1;
        state.time += 1;

        state.raise_difficulty();
        state.spawn_platform_if_needed(&mut self.rng, area);

        let scroll = Position::new(0.0, state.scroll_speed);
        state.platforms.translate(scroll);
        state.player.borrow_mut().translate(scroll);

        {
            let mut player = state.player.borrow_mut();
            if input.is_down(Key::Right) || input.is_down(Key::D) {
                player.move_in(Direction::East);
            }
            if input.is_down(Key::Left) || input.is_down(Key::A) {
                player.move_in(Direction::West);
            }
            if input.is_down(Key::Space) && player.is_on_ground() {
                player.jump(JUMP_IMPULSE);
            }

            if player.x() >= area.width() {
                player.set_x(0.0);
            } else if player.x() < 0.0 {
                let width = player.width();
                player.set_x(area.width() - width);
            }
        }

        let mut command = GameCommand::Continue;
        let (player_y, player_height) = {
            let player = state.player.borrow();
            (player.y(), player.height())
        };
        if player_y >= area.height() {
            state.health -= 1;
            if state.health < 0 {
                info!(score = state.score, "platformer_game_over");
                command = GameCommand::Reset;
            } else {
                debug!(health = state.health, "platformer_life_lost");
                state.respawn(area);
            }
        } else if player_y < -player_height {
            state.last_bonus = (state.score as f64 * BONUS_RATE).floor() as u64;
            state.score += state.last_bonus;
            state.bonus_countdown = BONUS_DISPLAY_TICKS;
            debug!(bonus = state.last_bonus, "platformer_bonus");
            state.respawn(area);
        }

        let painter = frame.painter();
        state.platforms.draw_all(painter);
        state.player.draw(painter);

        let heart_width = state.heart.size().width();
        for life in 0..state.health.max(0) {
            let x = area.width() - (life + 1) as f32 * heart_width - 10.0;
            painter.draw_image(&state.heart, Position::new(x, 10.0), 0.0);
        }
        painter.draw_text(&state.score.to_string(), Position::new(15.0, 20.0), Color::WHITE);
        if state.bonus_countdown > 0 {
            painter.draw_text(
                &format!("15% Score Bonus! +{}", state.last_bonus),
                Position::new(320.0, 100.0),
                Color::WHITE,
            );
        }
        state.bonus_countdown -= 1;

        command
    }

    fn gravity(&self) -> Option<&Gravity> {
        self.state.as_ref().map(|state| &state.gravity)
    }
}

impl PlatformerState {
    fn raise_difficulty(&mut self) {
        match self.time % DIFFICULTY_PERIOD {
            0 if self.platform.size().width() > MIN_PLATFORM_WIDTH => {
                self.platform = platform_image(self.platform.size().width() - 1.0, Color::BLUE);
            }
            10 if self.scroll_speed < MAX_SCROLL_SPEED => self.scroll_speed += SCROLL_SPEED_STEP,
            20 if self.spacing < MAX_SPACING => self.spacing += 1.0,
            _ => {}
        }
    }

    fn spawn_platform_if_needed(&mut self, rng: &mut Rng, area: Area) {
        let newest_y = self
            .platforms
            .len()
            .checked_sub(1)
            .and_then(|index| self.platforms.get(index))
            .map(|newest| newest.borrow().y());
        if newest_y.map_or(true, |y| y > self.spacing) {
            let free_width = area.width() - self.platform.size().width();
            let position = Position::new(random_below(rng, free_width), -PLATFORM_HEIGHT);
            self.platforms
                .spawn(Sprite::at(position, self.platform.clone()));
        }
    }

    /// Puts a red platform at the center, clearing whatever it overlaps, and
    /// stands the player on it.
    fn respawn(&mut self, area: Area) {
        let mut base = Sprite::new(platform_image(self.platform.size().width(), Color::RED));
        base.center_on(&area.center());
        let base_height = base.height();
        let base = SpriteRef::new(base);

        let overlapping = self.platforms.get_all_within(&base);
        self.platforms.remove_all(&overlapping);
        self.platforms.insert(0, base);

        let mut player = self.player.borrow_mut();
        player.center_on(&area.center());
        let lift = (-base_height - player.height()) / 2.0;
        player.translate(Position::new(0.0, lift));
        player.stop_jump();
    }
}
