use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::geometry::{Area, Position};
use crate::painter::Painter;
use crate::sprite::{PassGuard, Sprite, SpriteRef, WeakSprite};

#[derive(Debug, Clone)]
pub struct TargetBox {
    pub area: Area,
    source: Option<SpriteRef>,
}

impl TargetBox {
    pub fn new(area: Area) -> Self {
        Self { area, source: None }
    }

    fn from_sprite(sprite: &SpriteRef) -> Option<Self> {
        let borrowed = sprite.try_borrow()?;
        if borrowed.is_removal_pending() {
            return None;
        }
        Some(Self {
            area: borrowed.bounds(),
            source: Some(sprite.clone()),
        })
    }

    fn is_source(&self, sprite: &SpriteRef) -> bool {
        self.source
            .as_ref()
            .is_some_and(|source| source.ptr_eq(sprite))
    }
}

pub trait CollisionTarget {
    fn target_boxes(&self) -> Vec<TargetBox>;
}

impl CollisionTarget for Area {
    fn target_boxes(&self) -> Vec<TargetBox> {
        vec![TargetBox::new(*self)]
    }
}

impl CollisionTarget for Sprite {
    fn target_boxes(&self) -> Vec<TargetBox> {
        if self.is_removal_pending() {
            return Vec::new();
        }
        vec![TargetBox::new(self.bounds())]
    }
}

impl CollisionTarget for SpriteRef {
    fn target_boxes(&self) -> Vec<TargetBox> {
        TargetBox::from_sprite(self).into_iter().collect()
    }
}

impl CollisionTarget for WeakSprite {
    fn target_boxes(&self) -> Vec<TargetBox> {
        self.upgrade()
            .map(|sprite| sprite.target_boxes())
            .unwrap_or_default()
    }
}

impl CollisionTarget for [SpriteRef] {
    fn target_boxes(&self) -> Vec<TargetBox> {
        self.iter().filter_map(TargetBox::from_sprite).collect()
    }
}

impl CollisionTarget for Vec<SpriteRef> {
    fn target_boxes(&self) -> Vec<TargetBox> {
        self.as_slice().target_boxes()
    }
}

impl CollisionTarget for Group {
    fn target_boxes(&self) -> Vec<TargetBox> {
        self.get_all().target_boxes()
    }
}

#[derive(Default)]
struct GroupState {
    members: Vec<SpriteRef>,
    evict_off_screen: bool,
    pass_depth: u32,
}

/// Sprites flagged with [`Sprite::remove`] stay listed until a purge point:
/// the end of [`Group::draw_all`], or the end of any other mutating call made
/// outside a pass.
#[derive(Clone, Default)]
pub struct Group {
    state: Rc<RefCell<GroupState>>,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ptr_eq(&self, other: &Group) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    pub fn add(&self, sprite: SpriteRef) {
        self.state.borrow_mut().members.push(sprite);
        self.purge_flagged();
    }

    pub fn spawn(&self, sprite: Sprite) -> SpriteRef {
        let sprite = SpriteRef::new(sprite);
        self.add(sprite.clone());
        sprite
    }

    pub fn insert(&self, index: usize, sprite: SpriteRef) {
        {
            let mut state = self.state.borrow_mut();
            let index = index.min(state.members.len());
            state.members.insert(index, sprite);
        }
        self.purge_flagged();
    }

    pub fn add_all<I>(&self, sprites: I)
    where
        I: IntoIterator<Item = SpriteRef>,
    {
        self.state.borrow_mut().members.extend(sprites);
        self.purge_flagged();
    }

    pub fn remove(&self, sprite: &SpriteRef) {
        self.state
            .borrow_mut()
            .members
            .retain(|member| !member.ptr_eq(sprite));
        self.purge_flagged();
    }

    pub fn remove_all<'a, I>(&self, sprites: I)
    where
        I: IntoIterator<Item = &'a SpriteRef>,
    {
        let doomed: Vec<&SpriteRef> = sprites.into_iter().collect();
        self.state
            .borrow_mut()
            .members
            .retain(|member| !doomed.iter().any(|sprite| member.ptr_eq(sprite)));
        self.purge_flagged();
    }

    pub fn clear(&self) {
        self.state.borrow_mut().members.clear();
    }

    pub fn len(&self) -> usize {
        self.state.borrow().members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().members.is_empty()
    }

    pub fn contains(&self, sprite: &SpriteRef) -> bool {
        self.state
            .borrow()
            .members
            .iter()
            .any(|member| member.ptr_eq(sprite))
    }

    pub fn get(&self, index: usize) -> Option<SpriteRef> {
        self.state.borrow().members.get(index).cloned()
    }

    pub fn get_all(&self) -> Vec<SpriteRef> {
        self.state.borrow().members.clone()
    }

    /// Overlap is closed-interval (touching edges collide) and ignores rotation.
    /// A sprite never matches itself, sprites flagged for removal take no part,
    /// and a member that is mutably borrowed by the caller is skipped.
    pub fn get_all_within<T>(&self, other: &T) -> Vec<SpriteRef>
    where
        T: CollisionTarget + ?Sized,
    {
        let targets = other.target_boxes();
        if targets.is_empty() {
            return Vec::new();
        }

        self.get_all()
            .into_iter()
            .filter(|member| {
                let Some(sprite) = member.try_borrow() else {
                    return false;
                };
                if sprite.is_removal_pending() {
                    return false;
                }
                let bounds = sprite.bounds();
                targets
                    .iter()
                    .any(|target| !target.is_source(member) && bounds.intersects(&target.area))
            })
            .collect()
    }

    pub fn remove_when_off_screen(&self) {
        self.state.borrow_mut().evict_off_screen = true;
    }

    pub fn evicts_off_screen(&self) -> bool {
        self.state.borrow().evict_off_screen
    }

    pub fn translate(&self, delta: Position) {
        for member in self.get_all() {
            if let Some(mut sprite) = member.try_borrow_mut() {
                sprite.translate(delta);
            }
        }
        self.purge_flagged();
    }

    /// The pass works on a snapshot. Sprites added during the pass are first
    /// processed next pass, as are scripts and animations replaced during it.
    pub fn draw_all(&self, painter: &mut dyn Painter) {
        let members = {
            let mut state = self.state.borrow_mut();
            state.pass_depth += 1;
            state.members.clone()
        };

        {
            let _pass = PassGuard::enter();
            for member in &members {
                member.draw(painter);
            }
        }

        let area = painter.area();
        let evict_off_screen = {
            let mut state = self.state.borrow_mut();
            state.pass_depth = state.pass_depth.saturating_sub(1);
            if state.pass_depth > 0 {
                return;
            }
            state.evict_off_screen
        };
        self.purge(evict_off_screen.then_some(area));
    }

    fn purge_flagged(&self) {
        if self.state.borrow().pass_depth > 0 {
            return;
        }
        self.purge(None);
    }

    fn purge(&self, play_area: Option<Area>) {
        let mut state = self.state.borrow_mut();
        let before = state.members.len();
        let mut evicted = 0usize;
        state.members.retain(|member| {
            let Some(sprite) = member.try_borrow() else {
                return true;
            };
            if sprite.is_removal_pending() {
                return false;
            }
            match play_area {
                Some(area) if area.is_fully_outside(&sprite.bounds()) => {
                    evicted += 1;
                    false
                }
                _ => true,
            }
        });
        let removed = before - state.members.len();
        if removed > 0 {
            debug!(
                flagged = removed - evicted,
                evicted,
                remaining = state.members.len(),
                "group_purged"
            );
        }
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state.try_borrow() {
            Ok(state) => f
                .debug_struct("Group")
                .field("len", &state.members.len())
                .field("evict_off_screen", &state.evict_off_screen)
                .finish(),
            Err(_) => f.write_str("Group(<borrowed>)"),
        }
    }
}
