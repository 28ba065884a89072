use std::cell::RefCell;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::geometry::{Area, Position};
use crate::group::Group;
use crate::sprite::{Sprite, SpriteRef, WeakSprite};

const CONTACT_EPSILON: f32 = 1.0e-3;
const RIDE_TOLERANCE: f32 = 1.0e-2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GravityConfig {
    pub default_percent: f32,
    /// Pixels per tick squared at 100%.
    pub base_acceleration: f32,
    pub terminal_velocity: Option<f32>,
}

impl Default for GravityConfig {
    fn default() -> Self {
        Self {
            default_percent: 100.0,
            base_acceleration: 1.0,
            terminal_velocity: None,
        }
    }
}

impl GravityConfig {
    pub fn acceleration(&self, percent: f32) -> f32 {
        self.base_acceleration * percent / 100.0
    }
}

#[derive(Debug, Clone)]
enum Support {
    Floor,
    Sprite { platform: WeakSprite, top: f32 },
}

#[derive(Debug, Clone, Default)]
pub struct Mass {
    vertical_velocity: f32,
    on_ground: bool,
    gravity_percent: Option<f32>,
    air_jump: bool,
    support: Option<Support>,
}

impl Mass {
    pub fn vertical_velocity(&self) -> f32 {
        self.vertical_velocity
    }

    pub fn is_on_ground(&self) -> bool {
        self.on_ground
    }

    pub fn gravity_percent(&self) -> Option<f32> {
        self.gravity_percent
    }
}

impl Sprite {
    pub fn is_mass(&self) -> bool {
        self.mass.is_some()
    }

    pub fn mass(&self) -> Option<&Mass> {
        self.mass.as_ref()
    }

    pub fn is_on_ground(&self) -> bool {
        self.mass.as_ref().is_some_and(|mass| mass.on_ground)
    }

    pub fn vertical_velocity(&self) -> f32 {
        self.mass
            .as_ref()
            .map_or(0.0, |mass| mass.vertical_velocity)
    }

    pub fn set_vertical_velocity(&mut self, velocity: f32) {
        if let Some(mass) = self.mass.as_mut() {
            mass.vertical_velocity = velocity;
        }
    }

    pub fn set_gravity_percent(&mut self, percent: f32) {
        if let Some(mass) = self.mass.as_mut() {
            mass.gravity_percent = Some(percent);
        }
    }

    pub fn allow_air_jump(&mut self, allowed: bool) {
        if let Some(mass) = self.mass.as_mut() {
            mass.air_jump = allowed;
        }
    }

    pub fn jump(&mut self, impulse: f32) -> bool {
        let Some(mass) = self.mass.as_mut() else {
            return false;
        };
        if !mass.on_ground && !mass.air_jump {
            return false;
        }
        mass.vertical_velocity = -impulse.abs();
        mass.on_ground = false;
        mass.support = None;
        true
    }

    pub fn stop_jump(&mut self) {
        self.set_vertical_velocity(0.0);
    }
}

/// The frame driver calls [`Gravity::step`] once per tick, before the game's
/// own logic runs. Grounded masses ride along with the sprite they stand on.
#[derive(Debug, Default)]
pub struct Gravity {
    config: GravityConfig,
    ground: Group,
    masses: RefCell<Vec<WeakSprite>>,
}

impl Gravity {
    pub fn new(config: GravityConfig) -> Self {
        Self {
            config,
            ground: Group::new(),
            masses: RefCell::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &GravityConfig {
        &self.config
    }

    pub fn ground(&self) -> &Group {
        &self.ground
    }

    pub fn add_mass(&self, sprite: &SpriteRef) {
        {
            let mut borrowed = sprite.borrow_mut();
            if borrowed.mass.is_none() {
                borrowed.mass = Some(Mass::default());
            }
        }
        let mut masses = self.masses.borrow_mut();
        if !masses
            .iter()
            .filter_map(WeakSprite::upgrade)
            .any(|known| known.ptr_eq(sprite))
        {
            masses.push(sprite.downgrade());
        }
    }

    pub fn mass_count(&self) -> usize {
        self.masses
            .borrow()
            .iter()
            .filter(|mass| mass.is_alive())
            .count()
    }

    pub fn step(&self) {
        let ground: Vec<(SpriteRef, Area)> = self
            .ground
            .get_all()
            .into_iter()
            .filter_map(|platform| {
                let area = {
                    let borrowed = platform.try_borrow()?;
                    if borrowed.is_removal_pending() {
                        return None;
                    }
                    borrowed.bounds()
                };
                (!area.is_empty()).then_some((platform, area))
            })
            .collect();

        let live: Vec<SpriteRef> = {
            let mut masses = self.masses.borrow_mut();
            masses.retain(WeakSprite::is_alive);
            masses.iter().filter_map(WeakSprite::upgrade).collect()
        };

        for sprite in &live {
            self.step_mass(sprite, &ground);
        }
    }

    fn step_mass(&self, handle: &SpriteRef, ground: &[(SpriteRef, Area)]) {
        let Some(mut sprite) = handle.try_borrow_mut() else {
            return;
        };
        let Some(mut mass) = sprite.mass.take() else {
            return;
        };
        let height = sprite.height();

        if mass.on_ground {
            if let Some(top) = supported_top(&sprite, &mass, ground) {
                if let Some(Support::Sprite { top: last_top, .. }) = mass.support.as_mut() {
                    *last_top = top;
                }
                sprite.set_y(top - height);
                mass.vertical_velocity = 0.0;
                sprite.mass = Some(mass);
                return;
            }
            mass.on_ground = false;
            mass.support = None;
        }

        let percent = mass
            .gravity_percent
            .unwrap_or(self.config.default_percent);
        let mut velocity = mass.vertical_velocity + self.config.acceleration(percent);
        if let Some(terminal) = self.config.terminal_velocity {
            velocity = velocity.min(terminal.abs());
        }
        mass.vertical_velocity = velocity;

        let previous_bottom = sprite.bounds().bottom();
        sprite.translate(Position::new(0.0, velocity));

        if velocity >= 0.0 {
            if let Some((top, support)) = landing(&sprite, handle, previous_bottom, ground) {
                sprite.set_y(top - height);
                mass.vertical_velocity = 0.0;
                mass.on_ground = true;
                mass.support = Some(support);
                trace!(top, "mass_landed");
            }
        }

        sprite.mass = Some(mass);
    }
}

/// Same emptiness rule as `Area::intersects`: a zero-sized box touches no platform.
fn overlaps_horizontally(a: &Area, b: &Area) -> bool {
    !a.is_empty() && !b.is_empty() && a.left() <= b.right() && b.left() <= a.right()
}

fn supported_top(sprite: &Sprite, mass: &Mass, ground: &[(SpriteRef, Area)]) -> Option<f32> {
    let bounds = sprite.bounds();
    let touching = |top: f32| (bounds.bottom() - top).abs() <= RIDE_TOLERANCE;
    match mass.support.as_ref()? {
        Support::Floor => sprite
            .movement_area()
            .map(|area| area.bottom())
            .filter(|floor| touching(*floor)),
        Support::Sprite { platform, top } => {
            let platform = platform.upgrade()?;
            let (_, area) = ground.iter().find(|(known, _)| known.ptr_eq(&platform))?;
            let still_touching = touching(*top) || touching(area.top());
            (still_touching && overlaps_horizontally(&bounds, area)).then(|| area.top())
        }
    }
}

fn landing(
    sprite: &Sprite,
    handle: &SpriteRef,
    previous_bottom: f32,
    ground: &[(SpriteRef, Area)],
) -> Option<(f32, Support)> {
    let bounds = sprite.bounds();
    let mut best: Option<(f32, Support)> = None;

    for (platform, area) in ground {
        if platform.ptr_eq(handle) || !overlaps_horizontally(&bounds, area) {
            continue;
        }
        let top = area.top();
        let crossed =
            previous_bottom <= top + CONTACT_EPSILON && bounds.bottom() >= top - CONTACT_EPSILON;
        if crossed && best.as_ref().map_or(true, |(current, _)| top < *current) {
            best = Some((
                top,
                Support::Sprite {
                    platform: platform.downgrade(),
                    top,
                },
            ));
        }
    }

    if let Some(area) = sprite.movement_area() {
        let floor = area.bottom();
        if bounds.bottom() >= floor - CONTACT_EPSILON
            && best.as_ref().map_or(true, |(current, _)| floor < *current)
        {
            best = Some((floor, Support::Floor));
        }
    }

    best
}
