use crate::geometry::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    W,
    A,
    S,
    D,
    Space,
    Enter,
    Escape,
}

const KEY_COUNT: usize = 11;

impl Key {
    pub const ALL: [Key; KEY_COUNT] = [
        Key::Up,
        Key::Down,
        Key::Left,
        Key::Right,
        Key::W,
        Key::A,
        Key::S,
        Key::D,
        Key::Space,
        Key::Enter,
        Key::Escape,
    ];

    const fn index(self) -> usize {
        match self {
            Key::Up => 0,
            Key::Down => 1,
            Key::Left => 2,
            Key::Right => 3,
            Key::W => 4,
            Key::A => 5,
            Key::S => 6,
            Key::D => 7,
            Key::Space => 8,
            Key::Enter => 9,
            Key::Escape => 10,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct KeyStates {
    down: [bool; KEY_COUNT],
}

impl KeyStates {
    pub(crate) fn set(&mut self, key: Key, is_down: bool) {
        self.down[key.index()] = is_down;
    }

    pub(crate) fn is_down(&self, key: Key) -> bool {
        self.down[key.index()]
    }

    pub(crate) fn clear(&mut self) {
        self.down = [false; KEY_COUNT];
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSnapshot {
    held: KeyStates,
    pressed: KeyStates,
    mouse_down: bool,
    mouse_pressed: bool,
    mouse_position: Option<Position>,
}

impl InputSnapshot {
    pub(crate) fn new(
        held: KeyStates,
        pressed: KeyStates,
        mouse_down: bool,
        mouse_pressed: bool,
        mouse_position: Option<Position>,
    ) -> Self {
        Self {
            held,
            pressed,
            mouse_down,
            mouse_pressed,
            mouse_position,
        }
    }

    pub fn is_down(&self, key: Key) -> bool {
        self.held.is_down(key)
    }

    pub fn was_pressed(&self, key: Key) -> bool {
        self.pressed.is_down(key)
    }

    pub fn mouse_down(&self) -> bool {
        self.mouse_down
    }

    pub fn mouse_pressed(&self) -> bool {
        self.mouse_pressed
    }

    pub fn mouse_position(&self) -> Option<Position> {
        self.mouse_position
    }

    pub fn with_key_down(mut self, key: Key) -> Self {
        self.held.set(key, true);
        self.pressed.set(key, true);
        self
    }

    pub fn with_mouse_at(mut self, position: Position) -> Self {
        self.mouse_position = Some(position);
        self
    }

    pub fn with_mouse_pressed(mut self) -> Self {
        self.mouse_down = true;
        self.mouse_pressed = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_indices_are_unique() {
        let mut seen = [false; KEY_COUNT];
        for key in Key::ALL {
            assert!(!seen[key.index()]);
            seen[key.index()] = true;
        }
    }

    #[test]
    fn scripted_snapshot_reports_held_and_pressed() {
        let snapshot = InputSnapshot::default()
            .with_key_down(Key::Space)
            .with_mouse_at(Position::new(3.0, 4.0))
            .with_mouse_pressed();

        assert!(snapshot.is_down(Key::Space));
        assert!(snapshot.was_pressed(Key::Space));
        assert!(!snapshot.is_down(Key::W));
        assert!(snapshot.mouse_pressed());
        assert_eq!(snapshot.mouse_position(), Some(Position::new(3.0, 4.0)));
    }
}
