use std::ops::{Add, Neg, Sub};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const ZERO: Position = Position { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn translated(self, delta: Position) -> Self {
        self + delta
    }

    pub fn scaled(self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    pub fn distance_to(self, other: Position) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn angle_to(self, other: Position) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        if dx == 0.0 && dy == 0.0 {
            return 0.0;
        }
        normalize_angle(dy.atan2(dx).to_degrees())
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, rhs: Position) -> Position {
        Position::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Position {
    type Output = Position;

    fn neg(self) -> Position {
        Position::new(-self.x, -self.y)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: non_negative(width),
            height: non_negative(height),
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

fn non_negative(value: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Area {
    pub position: Position,
    pub size: Size,
}

impl Area {
    pub fn new(position: Position, size: Size) -> Self {
        Self { position, size }
    }

    pub fn from_origin(width: f32, height: f32) -> Self {
        Self::new(Position::ZERO, Size::new(width, height))
    }

    pub fn left(&self) -> f32 {
        self.position.x
    }

    pub fn top(&self) -> f32 {
        self.position.y
    }

    pub fn right(&self) -> f32 {
        self.position.x + self.size.width()
    }

    pub fn bottom(&self) -> f32 {
        self.position.y + self.size.height()
    }

    pub fn width(&self) -> f32 {
        self.size.width()
    }

    pub fn height(&self) -> f32 {
        self.size.height()
    }

    pub fn center(&self) -> Position {
        Position::new(
            self.position.x + self.size.width() * 0.5,
            self.position.y + self.size.height() * 0.5,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.size.is_empty()
    }

    /// Closed-interval overlap: boxes that share an edge intersect.
    /// A zero-sized box never intersects anything.
    pub fn intersects(&self, other: &Area) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.left() <= other.right()
            && other.left() <= self.right()
            && self.top() <= other.bottom()
            && other.top() <= self.bottom()
    }

    pub fn contains(&self, point: Position) -> bool {
        point.x >= self.left()
            && point.x <= self.right()
            && point.y >= self.top()
            && point.y <= self.bottom()
    }

    pub fn is_fully_outside(&self, other: &Area) -> bool {
        if other.is_empty() {
            return !self.contains(other.position);
        }
        !self.intersects(other)
    }

    pub fn clamp_box(&self, position: Position, size: Size) -> Position {
        Position::new(
            clamp_axis(position.x, size.width(), self.left(), self.right()),
            clamp_axis(position.y, size.height(), self.top(), self.bottom()),
        )
    }

    pub fn translated(&self, delta: Position) -> Area {
        Area::new(self.position + delta, self.size)
    }
}

fn clamp_axis(start: f32, extent: f32, min: f32, max: f32) -> f32 {
    let upper = max - extent;
    if upper < min {
        return min;
    }
    start.clamp(min, upper)
}

pub fn normalize_angle(degrees: f32) -> f32 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let normalized = degrees.rem_euclid(360.0);
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

pub fn angle_delta(from: f32, to: f32) -> f32 {
    let delta = normalize_angle(to - from);
    if delta > 180.0 {
        delta - 360.0
    } else {
        delta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
    North,
    NorthEast,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
        Direction::North,
        Direction::NorthEast,
    ];

    pub const fn degrees(self) -> f32 {
        match self {
            Direction::East => 0.0,
            Direction::SouthEast => 45.0,
            Direction::South => 90.0,
            Direction::SouthWest => 135.0,
            Direction::West => 180.0,
            Direction::NorthWest => 225.0,
            Direction::North => 270.0,
            Direction::NorthEast => 315.0,
        }
    }

    /// Only the sign of each component matters; positive `vertical` is north.
    pub fn from_components(horizontal: i32, vertical: i32) -> Option<Direction> {
        match (horizontal.signum(), vertical.signum()) {
            (1, 0) => Some(Direction::East),
            (1, -1) => Some(Direction::SouthEast),
            (0, -1) => Some(Direction::South),
            (-1, -1) => Some(Direction::SouthWest),
            (-1, 0) => Some(Direction::West),
            (-1, 1) => Some(Direction::NorthWest),
            (0, 1) => Some(Direction::North),
            (1, 1) => Some(Direction::NorthEast),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
}

impl Rotation {
    pub const fn sign(self) -> f32 {
        match self {
            Rotation::Clockwise => 1.0,
            Rotation::CounterClockwise => -1.0,
        }
    }
}

pub fn unit_vector(degrees: f32) -> Position {
    let radians = degrees.to_radians();
    Position::new(radians.cos(), radians.sin())
}
