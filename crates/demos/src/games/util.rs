use fastrand::Rng;
use gametools::{Area, Position, Size};

pub(crate) fn random_position(rng: &mut Rng, area: Area, size: Size) -> Position {
    let free_x = (area.width() - size.width()).max(0.0);
    let free_y = (area.height() - size.height()).max(0.0);
    Position::new(
        area.left() + rng.f32() * free_x,
        area.top() + rng.f32() * free_y,
    )
}

pub(crate) fn random_below(rng: &mut Rng, bound: f32) -> f32 {
    if bound < 1.0 {
        return 0.0;
    }
    rng.u32(0..bound as u32) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_positions_stay_inside_area() {
        let mut rng = Rng::with_seed(7);
        let area = Area::new(Position::new(10.0, 20.0), Size::new(100.0, 50.0));
        let size = Size::new(30.0, 10.0);
        for _ in 0..200 {
            let position = random_position(&mut rng, area, size);
            assert!(position.x >= 10.0 && position.x + 30.0 <= 110.0);
            assert!(position.y >= 20.0 && position.y + 10.0 <= 70.0);
        }
    }

    #[test]
    fn oversized_box_pins_to_corner() {
        let mut rng = Rng::with_seed(1);
        let position = random_position(&mut rng, Area::from_origin(10.0, 10.0), Size::new(20.0, 20.0));
        assert_eq!(position, Position::new(0.0, 0.0));
    }

    #[test]
    fn random_below_handles_empty_range() {
        let mut rng = Rng::with_seed(3);
        assert_eq!(random_below(&mut rng, 0.5), 0.0);
        for _ in 0..50 {
            assert!(random_below(&mut rng, 4.0) < 4.0);
        }
    }
}
