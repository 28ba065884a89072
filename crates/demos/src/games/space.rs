use fastrand::Rng;
use gametools::{
    Animation, Area, AssetError, Color, Direction, Frame, Game, GameCommand, Group, Image, Key,
    Position, Script, Setup, Size, Sprite, SpriteRef, WeakSprite, WindowSettings,
};
use tracing::{debug, info};

use super::art::{Art, ArtSource, Sheet};
use super::util::random_position;

const STAR_COUNT: usize = 200;
const START_HEALTH: i32 = 100;
const SHOT_SPEED: f32 = 10.0;
const SHOT_COOLDOWN: i32 = 15;
const ENEMY_SHOT_COOLDOWN: i32 = 30;
const MIN_ENEMY_DELAY: i32 = 50;
const PLASMA_DAMAGE: i32 = 5;
const RAM_DAMAGE: i32 = 10;
const KILL_SCORE: i32 = 15;
const LARGE_EXPLOSION_WIDTH: f32 = 50.0;
const EXPLOSION_SPEED: u32 = 2;
const HEALTH_BAR_WIDTH: f32 = 150.0;
const HEALTH_BAR_HEIGHT: f32 = 15.0;

pub(crate) struct Space {
    art: ArtSource,
    rng: Rng,
    state: Option<SpaceState>,
}

struct SpaceState {
    player: SpriteRef,
    stars: Group,
    bullets: Group,
    plasma: Group,
    enemies: Group,
    explosions: Group,
    explosion_small: Animation,
    explosion_large: Animation,
    missile: Image,
    plasma_bolt: Image,
    alien: Image,
    score: i32,
    health: i32,
    shot_timer: i32,
    enemy_timer: i32,
}

impl Space {
    pub(crate) fn new(art: ArtSource, rng: Rng) -> Self {
        Self {
            art,
            rng,
            state: None,
        }
    }
}

impl Game for Space {
    fn window(&mut self, settings: &mut WindowSettings) {
        settings.title = "Example Space Game".to_string();
        settings.width = 800;
        settings.height = 800;
        settings.background = Color::from_rgb_hex(0x0b1037);
    }

    fn setup(&mut self, setup: &mut Setup<'_>) -> Result<(), AssetError> {
        let area = setup.play_area();
        let mut player = Sprite::new(self.art.image(setup, Art::Ship)?);
        player.lock_movement_area(area);
        player.center_on(&area.center());

        let stars = Group::new();
        let star = self.art.image(setup, Art::Star)?;
        for _ in 0..STAR_COUNT {
            let position = random_position(&mut self.rng, area, star.size());
            stars.spawn(Sprite::at(position, star.clone()));
        }

        let bullets = Group::new();
        bullets.remove_when_off_screen();
        let plasma = Group::new();
        plasma.remove_when_off_screen();

        self.state = Some(SpaceState {
            player: SpriteRef::new(player),
            stars,
            bullets,
            plasma,
            enemies: Group::new(),
            explosions: Group::new(),
            explosion_small: Animation::new(
                self.art.frames(setup, Sheet::ExplosionSmall)?,
                EXPLOSION_SPEED,
                1,
            ),
            explosion_large: Animation::new(
                self.art.frames(setup, Sheet::ExplosionLarge)?,
                EXPLOSION_SPEED,
                1,
            ),
            missile: self.art.image(setup, Art::Missile)?,
            plasma_bolt: self.art.image(setup, Art::Plasma)?,
            alien: self.art.image(setup, Art::Alien)?,
            score: 0,
            health: START_HEALTH,
            shot_timer: 0,
            enemy_timer: 0,
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
            if let Some(mouse) = input.mouse_position() {
                player.face(&mouse);
            }
            let mut horizontal = 0;
            let mut vertical = 0;
            if input.is_down(Key::W) {
                vertical += 1;
            }
            if input.is_down(Key::A) {
                horizontal -= 1;
            }
            if input.is_down(Key::S) {
                vertical -= 1;
            }
            if input.is_down(Key::D) {
                horizontal += 1;
            }
            player.move_by(horizontal, vertical);
        }

        state.shot_timer -= 1;
        if (input.is_down(Key::Space) || input.mouse_down()) && state.shot_timer < 0 {
            let bullet = shot(&state.missile, &state.player.borrow());
            state.bullets.add(bullet);
            state.shot_timer = SHOT_COOLDOWN;
        }

        state.enemy_timer -= 1;
        if state.enemy_timer < 0 {
            state.spawn_enemy(&mut self.rng, area.width(), area.height());
        }

        state.resolve_collisions();

        let command = if state.health <= 0 {
            info!(score = state.score, "space_game_over");
            GameCommand::Reset
        } else {
            GameCommand::Continue
        };

        let painter = frame.painter();
        state.stars.draw_all(painter);
        state.bullets.draw_all(painter);
        state.plasma.draw_all(painter);
        state.enemies.draw_all(painter);
        state.player.draw(painter);
        state.explosions.draw_all(painter);

        painter.draw_text(&state.score.to_string(), Position::new(15.0, 25.0), Color::WHITE);

        let bar_x = area.width() - 165.0;
        let full = health_bar(bar_x, HEALTH_BAR_WIDTH);
        let remaining = health_bar(bar_x, state.health.max(0) as f32 * 1.5);
        painter.fill_rect(full, Color::RED);
        let health_color = if state.health > 50 {
            Color::GREEN
        } else {
            Color::YELLOW
        };
        painter.fill_rect(remaining, health_color);
        painter.stroke_rect(full, Color::BLACK);
        painter.stroke_rect(remaining, Color::BLACK);

        command
    }
}

fn health_bar(x: f32, width: f32) -> Area {
    Area::new(Position::new(x, 15.0), Size::new(width, HEALTH_BAR_HEIGHT))
}

fn shot(image: &Image, shooter: &Sprite) -> SpriteRef {
    let mut bullet = Sprite::new(image.clone());
    bullet.center_on(shooter);
    bullet.set_angle(shooter.angle());
    bullet.set_speed(SHOT_SPEED);
    bullet.set_relational_movement(true);
    bullet.set_script(fly_forward);
    SpriteRef::new(bullet)
}

fn fly_forward(sprite: &SpriteRef) {
    sprite.borrow_mut().move_in(Direction::East);
}

fn burn_out(sprite: &SpriteRef) {
    let done = sprite
        .borrow()
        .animation()
        .map_or(true, Animation::is_complete);
    if done {
        sprite.borrow_mut().remove(true);
    }
}

impl SpaceState {
    fn spawn_enemy(&mut self, rng: &mut Rng, width: f32, height: f32) {
        let (alien_width, alien_height) = (self.alien.size().width(), self.alien.size().height());
        let along = |rng: &mut Rng, extent: f32| rng.u32(0..extent.max(1.0) as u32) as f32;
        let position = match rng.u8(0..4) {
            0 => Position::new(-alien_width, along(rng, height)),
            1 => Position::new(width, along(rng, height)),
            2 => Position::new(along(rng, width), -alien_height),
            _ => Position::new(along(rng, width), height),
        };

        let mut enemy = Sprite::at(position, self.alien.clone());
        enemy.face(&self.player);
        enemy.set_relational_movement(true);
        enemy.set_script(EnemyPilot::new(
            Rng::with_seed(rng.u64(..)),
            self.player.downgrade(),
            self.plasma.clone(),
            self.plasma_bolt.clone(),
        ));
        self.enemies.spawn(enemy);

        let difficulty = 100 - (self.score / 5) * 2;
        self.enemy_timer = if difficulty > 0 {
            rng.i32(0..difficulty) + MIN_ENEMY_DELAY
        } else {
            MIN_ENEMY_DELAY
        };
        debug!(x = position.x, y = position.y, next_in = self.enemy_timer, "enemy_spawned");
    }

    fn resolve_collisions(&mut self) {
        let mut wrecks = Vec::new();

        let plasma_hits = self.plasma.get_all_within(&self.player);
        self.health -= plasma_hits.len() as i32 * PLASMA_DAMAGE;
        self.plasma.remove_all(&plasma_hits);
        wrecks.extend(plasma_hits);

        let rams = self.enemies.get_all_within(&self.player);
        self.health -= rams.len() as i32 * RAM_DAMAGE;
        self.enemies.remove_all(&rams);
        wrecks.extend(rams);

        let kills = self.enemies.get_all_within(&self.bullets);
        self.score += kills.len() as i32 * KILL_SCORE;
        self.enemies.remove_all(&kills);
        wrecks.extend(kills);

        let intercepts = self.bullets.get_all_within(&self.plasma);
        self.bullets.remove_all(&intercepts);
        let intercepted = self.plasma.get_all_within(&intercepts);
        self.plasma.remove_all(&intercepted);
        wrecks.extend(intercepts);

        for wreck in &wrecks {
            let mut sprite = wreck.borrow_mut();
            let center = sprite.center();
            let explosion = if sprite.width() > LARGE_EXPLOSION_WIDTH {
                &self.explosion_large
            } else {
                &self.explosion_small
            };
            sprite.set_animation(explosion.restarted());
            sprite.center_on(&center);
            sprite.set_script(burn_out);
        }
        self.explosions.add_all(wrecks);
    }
}

struct EnemyPilot {
    rng: Rng,
    player: WeakSprite,
    plasma: Group,
    bolt: Image,
    moving: bool,
    mode_timer: i32,
    shot_timer: i32,
}

impl EnemyPilot {
    fn new(rng: Rng, player: WeakSprite, plasma: Group, bolt: Image) -> Self {
        Self {
            rng,
            player,
            plasma,
            bolt,
            moving: false,
            mode_timer: 0,
            shot_timer: 0,
        }
    }
}

impl Script for EnemyPilot {
    fn update(&mut self, sprite: &SpriteRef) {
        self.mode_timer -= 1;
        if self.mode_timer < 0 {
            self.moving = !self.moving;
            self.mode_timer = if self.moving {
                self.rng.i32(20..80)
            } else {
                self.rng.i32(100..200)
            };
            self.shot_timer = 0;
        }

        let mut enemy = sprite.borrow_mut();
        if self.moving {
            enemy.move_in(Direction::East);
            return;
        }

        enemy.turn_to(&self.player);
        self.shot_timer -= 1;
        if self.shot_timer < 0 {
            self.plasma.add(shot(&self.bolt, &enemy));
            self.shot_timer = ENEMY_SHOT_COOLDOWN;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gametools::{AssetLoader, DrawCall, HeadlessPainter, InputSnapshot, TickDriver};

    fn started() -> TickDriver<Space> {
        let mut driver = TickDriver::new(
            Space::new(ArtSource::Generated, Rng::with_seed(3)),
            AssetLoader::new("."),
        );
        driver.start().expect("setup");
        driver
    }

    fn state(driver: &TickDriver<Space>) -> &SpaceState {
        driver.game().state.as_ref().expect("state after setup")
    }

    fn state_mut(driver: &mut TickDriver<Space>) -> &mut SpaceState {
        driver.game_mut().state.as_mut().expect("state after setup")
    }

    fn tick(driver: &mut TickDriver<Space>, input: InputSnapshot) -> (GameCommand, HeadlessPainter) {
        let mut painter = HeadlessPainter::with_area(driver.settings().play_area());
        let command = driver.tick(&input, &mut painter).expect("tick");
        (command, painter)
    }

    fn plasma_on_player(driver: &TickDriver<Space>) -> SpriteRef {
        let state = state(driver);
        let mut bolt = Sprite::new(state.plasma_bolt.clone());
        bolt.center_on(&state.player);
        state.plasma.spawn(bolt)
    }

    #[test]
    fn setup_builds_the_field() {
        let driver = started();
        let state = state(&driver);
        assert_eq!(state.stars.len(), STAR_COUNT);
        assert!(state.bullets.evicts_off_screen());
        assert!(state.plasma.evicts_off_screen());
        assert!(!state.enemies.evicts_off_screen());
        assert_eq!(state.player.borrow().center(), Position::new(400.0, 400.0));
        assert_eq!(state.health, START_HEALTH);
    }

    #[test]
    fn ship_faces_the_mouse() {
        let mut driver = started();
        tick(
            &mut driver,
            InputSnapshot::default().with_mouse_at(Position::new(400.0, 700.0)),
        );
        assert!((state(&driver).player.borrow().angle() - 90.0).abs() < 0.0001);
    }

    #[test]
    fn firing_respects_the_cooldown() {
        let mut driver = started();
        state(&driver).player.borrow_mut().set_angle(270.0);
        let firing = InputSnapshot::default().with_key_down(Key::Space);

        tick(&mut driver, firing);
        assert_eq!(state(&driver).bullets.len(), 1);
        assert_eq!(state(&driver).shot_timer, SHOT_COOLDOWN);

        tick(&mut driver, firing);
        assert_eq!(state(&driver).bullets.len(), 1);

        let bullet = state(&driver).bullets.get(0).expect("bullet");
        let bullet = bullet.borrow();
        assert!((bullet.angle() - 270.0).abs() < 0.0001);
        assert!(bullet.center().y < 400.0 - 15.0);
    }

    #[test]
    fn first_tick_spawns_an_enemy_at_an_edge() {
        let mut driver = started();
        tick(&mut driver, InputSnapshot::default());
        let state = state(&driver);
        assert_eq!(state.enemies.len(), 1);
        assert!(state.enemy_timer >= MIN_ENEMY_DELAY);

        let enemy = state.enemies.get(0).expect("enemy");
        let enemy = enemy.borrow();
        assert!(enemy.has_script());
        let bounds = enemy.bounds();
        let touches_edge = bounds.right() <= 5.0
            || bounds.left() >= 795.0
            || bounds.bottom() <= 5.0
            || bounds.top() >= 795.0;
        assert!(touches_edge, "{bounds:?}");
    }

    #[test]
    fn plasma_hit_hurts_and_explodes() {
        let mut driver = started();
        let bolt = plasma_on_player(&driver);
        tick(&mut driver, InputSnapshot::default());

        let state = state(&driver);
        assert_eq!(state.health, START_HEALTH - PLASMA_DAMAGE);
        assert!(!state.plasma.contains(&bolt));
        assert!(state.explosions.contains(&bolt));
        assert_eq!(bolt.borrow().width(), 30.0);
    }

    #[test]
    fn shooting_an_enemy_scores() {
        let mut driver = started();
        let (enemy, bullet) = {
            let state = state(&driver);
            let enemy = state
                .enemies
                .spawn(Sprite::at(Position::new(100.0, 100.0), state.alien.clone()));
            let bullet = state
                .bullets
                .spawn(Sprite::at(Position::new(110.0, 110.0), state.missile.clone()));
            (enemy, bullet)
        };
        tick(&mut driver, InputSnapshot::default());

        let state = state(&driver);
        assert_eq!(state.score, KILL_SCORE);
        assert!(!state.enemies.contains(&enemy));
        assert!(state.bullets.contains(&bullet));
        let explosion = enemy.borrow();
        assert_eq!(explosion.width(), 60.0);
        assert!((explosion.center().x - 128.0).abs() < 0.0001);
    }

    #[test]
    fn explosions_remove_themselves_when_finished() {
        let mut driver = started();
        plasma_on_player(&driver);
        tick(&mut driver, InputSnapshot::default());
        assert_eq!(state(&driver).explosions.len(), 1);

        for _ in 0..20 {
            tick(&mut driver, InputSnapshot::default());
        }
        assert!(state(&driver).explosions.is_empty());
    }

    #[test]
    fn running_out_of_health_resets() {
        let mut driver = started();
        state_mut(&mut driver).health = PLASMA_DAMAGE;
        state_mut(&mut driver).score = 40;
        plasma_on_player(&driver);

        let (command, _) = tick(&mut driver, InputSnapshot::default());
        assert_eq!(command, GameCommand::Reset);
        assert_eq!(state(&driver).health, START_HEALTH);
        assert_eq!(state(&driver).score, 0);
    }

    #[test]
    fn hud_draws_score_and_health_bar() {
        let mut driver = started();
        state_mut(&mut driver).health = 40;
        let (_, painter) = tick(&mut driver, InputSnapshot::default());

        assert!(painter.texts().any(|text| text == "0"));
        let fills: Vec<_> = painter
            .calls()
            .iter()
            .filter_map(|call| match call {
                DrawCall::FillRect { rect, color } => Some((rect.width(), *color)),
                _ => None,
            })
            .collect();
        assert_eq!(fills.len(), 2);
        assert_eq!(fills[0], (150.0, Color::RED));
        assert!((fills[1].0 - 60.0).abs() < 0.0001);
        assert_eq!(fills[1].1, Color::YELLOW);
    }

    #[test]
    fn pilot_flies_then_turns_and_fires() {
        let player = SpriteRef::new(Sprite::at(
            Position::new(400.0, 400.0),
            Image::solid(Size::new(40.0, 40.0), Color::WHITE),
        ));
        let plasma = Group::new();
        let mut enemy = Sprite::at(
            Position::new(0.0, 0.0),
            Image::solid(Size::new(56.0, 56.0), Color::GREEN),
        );
        enemy.set_relational_movement(true);
        let enemy = SpriteRef::new(enemy);
        enemy.set_script(EnemyPilot::new(
            Rng::with_seed(9),
            player.downgrade(),
            plasma.clone(),
            Image::solid(Size::new(12.0, 12.0), Color::GREEN),
        ));

        enemy.update();
        assert!((enemy.borrow().x() - 5.0).abs() < 0.0001);
        assert!(plasma.is_empty());

        for _ in 0..80 {
            enemy.update();
        }
        assert!(!plasma.is_empty());
        let bolt = plasma.get(0).expect("plasma bolt");
        let bolt = bolt.borrow();
        assert!(bolt.has_script());
        assert!((bolt.speed() - SHOT_SPEED).abs() < 0.0001);
        assert!(bolt.relational_movement());
    }
}
