use crate::sprite::SpriteRef;

/// While `update` runs, the script is detached from its sprite, so the sprite
/// handle can be borrowed freely. Binding a new script from inside `update`
/// replaces this one from the next pass on.
pub trait Script {
    fn update(&mut self, sprite: &SpriteRef);
}

impl<F> Script for F
where
    F: FnMut(&SpriteRef),
{
    fn update(&mut self, sprite: &SpriteRef) {
        self(sprite)
    }
}
