use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::warn;

use crate::animation::Animation;
use crate::geometry::{
    angle_delta, normalize_angle, unit_vector, Area, Direction, Position, Rotation, Size,
};
use crate::gravity::Mass;
use crate::painter::Painter;
use crate::raster::Image;
use crate::script::Script;

pub const DEFAULT_SPEED: f32 = 5.0;
pub const DEFAULT_TURN_SPEED: f32 = 5.0;

thread_local! {
    // (open depth, serial of the outermost open pass)
    static PASS: Cell<(u32, u64)> = const { Cell::new((0, 0)) };
}

/// Open while a processing pass runs. Script and animation replacements made
/// inside a pass are staged and adopted when the sprite next updates in a
/// later pass.
pub(crate) struct PassGuard(());

impl PassGuard {
    pub(crate) fn enter() -> Self {
        PASS.with(|pass| {
            let (depth, serial) = pass.get();
            let serial = if depth == 0 {
                serial.wrapping_add(1)
            } else {
                serial
            };
            pass.set((depth + 1, serial));
        });
        Self(())
    }
}

impl Drop for PassGuard {
    fn drop(&mut self) {
        PASS.with(|pass| {
            let (depth, serial) = pass.get();
            pass.set((depth.saturating_sub(1), serial));
        });
    }
}

fn open_pass() -> Option<u64> {
    PASS.with(|pass| {
        let (depth, serial) = pass.get();
        (depth > 0).then_some(serial)
    })
}

struct Staged<T> {
    value: T,
    pass: u64,
}

impl<T> Staged<T> {
    fn take_due(slot: &mut Option<Self>, pass: Option<u64>) -> Option<T> {
        let due = slot.as_ref().is_some_and(|staged| Some(staged.pass) != pass);
        if due {
            slot.take().map(|staged| staged.value)
        } else {
            None
        }
    }
}

/// `position` is the top-left corner of the bounding box. Angles are degrees,
/// 0 is east and values grow clockwise on screen (90 is south). The bounding
/// box used for collisions ignores rotation.
pub struct Sprite {
    image: Image,
    position: Position,
    size: Size,
    angle: f32,
    speed: f32,
    turn_speed: f32,
    relational_movement: bool,
    animation: Option<Animation>,
    staged_animation: Option<Staged<Animation>>,
    script: Option<Box<dyn Script>>,
    staged_script: Option<Staged<Box<dyn Script>>>,
    script_generation: u64,
    movement_area: Option<Area>,
    removal_pending: bool,
    pub(crate) mass: Option<Mass>,
}

impl Sprite {
    pub fn new(image: Image) -> Self {
        Self::at(Position::ZERO, image)
    }

    pub fn at(position: Position, image: Image) -> Self {
        Self {
            size: image.size(),
            image,
            position,
            angle: 0.0,
            speed: DEFAULT_SPEED,
            turn_speed: DEFAULT_TURN_SPEED,
            relational_movement: false,
            animation: None,
            staged_animation: None,
            script: None,
            staged_script: None,
            script_generation: 0,
            movement_area: None,
            removal_pending: false,
            mass: None,
        }
    }

    pub fn image(&self) -> &Image {
        &self.image
    }

    pub fn set_image(&mut self, image: Image) {
        if self.animation.is_none() {
            self.size = image.size();
        }
        self.image = image;
        self.apply_movement_lock();
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn x(&self) -> f32 {
        self.position.x
    }

    pub fn y(&self) -> f32 {
        self.position.y
    }

    pub fn set_x(&mut self, x: f32) {
        self.set_position(Position::new(x, self.position.y));
    }

    pub fn set_y(&mut self, y: f32) {
        self.set_position(Position::new(self.position.x, y));
    }

    pub fn set_position(&mut self, position: Position) {
        self.position = position;
        self.apply_movement_lock();
    }

    pub fn translate(&mut self, delta: Position) {
        self.set_position(self.position + delta);
    }

    pub fn center_on<T: Bearing + ?Sized>(&mut self, target: &T) {
        let Some(point) = target.bearing_point() else {
            return;
        };
        self.set_position(Position::new(
            point.x - self.size.width() * 0.5,
            point.y - self.size.height() * 0.5,
        ));
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn width(&self) -> f32 {
        self.size.width()
    }

    pub fn height(&self) -> f32 {
        self.size.height()
    }

    pub fn bounds(&self) -> Area {
        Area::new(self.position, self.size)
    }

    pub fn center(&self) -> Position {
        self.bounds().center()
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn set_angle(&mut self, degrees: f32) {
        self.angle = normalize_angle(degrees);
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    pub fn turn_speed(&self) -> f32 {
        self.turn_speed
    }

    pub fn set_turn_speed(&mut self, degrees_per_tick: f32) {
        self.turn_speed = degrees_per_tick.abs();
    }

    pub fn relational_movement(&self) -> bool {
        self.relational_movement
    }

    pub fn set_relational_movement(&mut self, enabled: bool) {
        self.relational_movement = enabled;
    }

    pub fn move_in(&mut self, direction: Direction) {
        let heading = if self.relational_movement {
            self.angle + direction.degrees()
        } else {
            direction.degrees()
        };
        self.translate(unit_vector(heading).scaled(self.speed));
    }

    pub fn move_by(&mut self, horizontal: i32, vertical: i32) {
        if let Some(direction) = Direction::from_components(horizontal, vertical) {
            self.move_in(direction);
        }
    }

    pub fn turn(&mut self, rotation: Rotation) {
        self.set_angle(self.angle + rotation.sign() * self.turn_speed);
    }

    pub fn face<T: Bearing + ?Sized>(&mut self, target: &T) {
        if let Some(point) = target.bearing_point() {
            self.set_angle(self.center().angle_to(point));
        }
    }

    /// Rotates toward the target by at most `turn_speed`, along the shorter arc.
    /// A target exactly behind turns clockwise.
    pub fn turn_to<T: Bearing + ?Sized>(&mut self, target: &T) {
        let Some(point) = target.bearing_point() else {
            return;
        };
        let desired = self.center().angle_to(point);
        let delta = angle_delta(self.angle, desired);
        if delta.abs() <= self.turn_speed {
            self.set_angle(desired);
        } else {
            self.set_angle(self.angle + delta.signum() * self.turn_speed);
        }
    }

    pub fn lock_movement_area(&mut self, area: Area) {
        self.movement_area = Some(area);
        self.apply_movement_lock();
    }

    pub fn movement_area(&self) -> Option<Area> {
        self.movement_area
    }

    fn apply_movement_lock(&mut self) {
        if let Some(area) = self.movement_area {
            self.position = area.clamp_box(self.position, self.size);
        }
    }

    pub fn animation(&self) -> Option<&Animation> {
        self.animation.as_ref()
    }

    pub fn animation_mut(&mut self) -> Option<&mut Animation> {
        self.animation.as_mut()
    }

    pub fn set_animation(&mut self, animation: Animation) {
        match open_pass() {
            Some(pass) => {
                self.staged_animation = Some(Staged {
                    value: animation,
                    pass,
                })
            }
            None => {
                self.staged_animation = None;
                self.adopt_animation(animation);
            }
        }
    }

    fn adopt_animation(&mut self, mut animation: Animation) {
        animation.reset();
        if let Some(size) = animation.frame_size() {
            self.size = size;
        }
        self.animation = Some(animation);
        self.apply_movement_lock();
    }

    pub fn clear_animation(&mut self) {
        self.staged_animation = None;
        self.animation = None;
        self.size = self.image.size();
        self.apply_movement_lock();
    }

    pub fn set_script<S: Script + 'static>(&mut self, script: S) {
        let script: Box<dyn Script> = Box::new(script);
        match open_pass() {
            Some(pass) => {
                self.staged_script = Some(Staged {
                    value: script,
                    pass,
                })
            }
            None => {
                self.staged_script = None;
                self.adopt_script(Some(script));
            }
        }
    }

    pub fn clear_script(&mut self) {
        self.staged_script = None;
        self.adopt_script(None);
    }

    fn adopt_script(&mut self, script: Option<Box<dyn Script>>) {
        self.script = script;
        self.script_generation = self.script_generation.wrapping_add(1);
    }

    pub fn has_script(&self) -> bool {
        self.script.is_some() || self.staged_script.is_some()
    }

    fn adopt_staged(&mut self) {
        let pass = open_pass();
        if let Some(animation) = Staged::take_due(&mut self.staged_animation, pass) {
            self.adopt_animation(animation);
        }
        if let Some(script) = Staged::take_due(&mut self.staged_script, pass) {
            self.adopt_script(Some(script));
        }
    }

    pub fn remove(&mut self, flag: bool) {
        self.removal_pending = flag;
    }

    pub fn is_removal_pending(&self) -> bool {
        self.removal_pending
    }

    pub fn draw(&mut self, painter: &mut dyn Painter) {
        if let Some(animation) = self.animation.as_mut() {
            animation.advance();
        }
        let image = self
            .animation
            .as_ref()
            .and_then(Animation::current_frame)
            .unwrap_or(&self.image);
        painter.draw_image(image, self.position, self.angle);
    }
}

impl fmt::Debug for Sprite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sprite")
            .field("position", &self.position)
            .field("size", &self.size)
            .field("angle", &self.angle)
            .field("speed", &self.speed)
            .field("relational_movement", &self.relational_movement)
            .field("animation", &self.animation)
            .field("has_script", &self.script.is_some())
            .field("movement_area", &self.movement_area)
            .field("removal_pending", &self.removal_pending)
            .field("mass", &self.mass)
            .finish()
    }
}

pub trait Bearing {
    fn bearing_point(&self) -> Option<Position>;
}

impl Bearing for Position {
    fn bearing_point(&self) -> Option<Position> {
        Some(*self)
    }
}

impl Bearing for Area {
    fn bearing_point(&self) -> Option<Position> {
        Some(self.center())
    }
}

impl Bearing for Sprite {
    fn bearing_point(&self) -> Option<Position> {
        Some(self.center())
    }
}

impl Bearing for SpriteRef {
    fn bearing_point(&self) -> Option<Position> {
        self.inner.try_borrow().ok().map(|sprite| sprite.center())
    }
}

#[derive(Clone)]
pub struct SpriteRef {
    inner: Rc<RefCell<Sprite>>,
}

impl SpriteRef {
    pub fn new(sprite: Sprite) -> Self {
        Self {
            inner: Rc::new(RefCell::new(sprite)),
        }
    }

    pub fn borrow(&self) -> Ref<'_, Sprite> {
        self.inner.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Sprite> {
        self.inner.borrow_mut()
    }

    pub fn ptr_eq(&self, other: &SpriteRef) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn downgrade(&self) -> WeakSprite {
        WeakSprite {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn try_bounds(&self) -> Option<Area> {
        self.inner.try_borrow().ok().map(|sprite| sprite.bounds())
    }

    pub(crate) fn try_borrow(&self) -> Option<Ref<'_, Sprite>> {
        self.inner.try_borrow().ok()
    }

    pub(crate) fn try_borrow_mut(&self) -> Option<RefMut<'_, Sprite>> {
        self.inner.try_borrow_mut().ok()
    }

    pub fn set_script<S: Script + 'static>(&self, script: S) {
        self.inner.borrow_mut().set_script(script);
    }

    /// Adopts replacements staged by an earlier pass, then runs the bound
    /// script once. The script is detached while it runs; it is put back
    /// afterwards unless it was replaced or cleared in the meantime.
    pub fn update(&self) {
        let (mut script, generation) = {
            let Ok(mut sprite) = self.inner.try_borrow_mut() else {
                warn!("sprite_busy_script_skipped");
                return;
            };
            sprite.adopt_staged();
            let Some(script) = sprite.script.take() else {
                return;
            };
            (script, sprite.script_generation)
        };

        script.update(self);

        if let Ok(mut sprite) = self.inner.try_borrow_mut() {
            if sprite.script_generation == generation && sprite.script.is_none() {
                sprite.script = Some(script);
            }
        }
    }

    pub fn draw(&self, painter: &mut dyn Painter) {
        let _pass = PassGuard::enter();
        self.update();
        match self.inner.try_borrow_mut() {
            Ok(mut sprite) => sprite.draw(painter),
            Err(_) => warn!("sprite_busy_draw_skipped"),
        }
    }
}

impl From<Sprite> for SpriteRef {
    fn from(sprite: Sprite) -> Self {
        Self::new(sprite)
    }
}

impl PartialEq for SpriteRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for SpriteRef {}

impl fmt::Debug for SpriteRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(sprite) => fmt::Debug::fmt(&*sprite, f),
            Err(_) => f.write_str("Sprite(<borrowed>)"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WeakSprite {
    inner: Weak<RefCell<Sprite>>,
}

impl WeakSprite {
    pub fn upgrade(&self) -> Option<SpriteRef> {
        self.inner.upgrade().map(|inner| SpriteRef { inner })
    }

    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl Bearing for WeakSprite {
    fn bearing_point(&self) -> Option<Position> {
        self.upgrade()?.bearing_point()
    }
}
