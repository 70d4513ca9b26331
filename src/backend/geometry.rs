// src/backend/geometry.rs - Distance calculation

use crate::backend::types::Point;

/// Euclidean distance between two pixel coordinates.
///
/// Pure and symmetric; `distance(p, p) == 0.0`.
pub fn distance(p1: Point, p2: Point) -> f64 {
    distance_f64((p1.x as f64, p1.y as f64), (p2.x as f64, p2.y as f64))
}

/// Euclidean distance over raw float coordinates
pub fn distance_f64(p1: (f64, f64), p2: (f64, f64)) -> f64 {
    let dx = p2.0 - p1.0;
    let dy = p2.1 - p1.1;
    (dx * dx + dy * dy).sqrt()
}

/// Integer midpoint, rounding toward the origin
pub fn midpoint(p1: Point, p2: Point) -> Point {
    Point::new(
        ((p1.x as u64 + p2.x as u64) / 2) as u32,
        ((p1.y as u64 + p2.y as u64) / 2) as u32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_distance_literal_cases() {
        let d = distance(Point::new(0, 0), Point::new(3, 4));
        assert_eq!(format!("{:.2}", d), "5.00");

        let d = distance(Point::new(10, 10), Point::new(10, 10));
        assert_eq!(format!("{:.2}", d), "0.00");

        let d = distance(Point::new(2, 3), Point::new(8, 3));
        assert_eq!(format!("{:.2}", d), "6.00");
    }

    #[test]
    fn test_midpoint() {
        assert_eq!(midpoint(Point::new(2, 3), Point::new(8, 3)), Point::new(5, 3));
        assert_eq!(midpoint(Point::new(0, 0), Point::new(3, 4)), Point::new(1, 2));
        assert_eq!(
            midpoint(Point::new(u32::MAX, 0), Point::new(u32::MAX, 0)),
            Point::new(u32::MAX, 0)
        );
    }

    #[test]
    fn test_distance_f64_handles_negative_coordinates() {
        assert_eq!(distance_f64((-3.0, 0.0), (0.0, 4.0)), 5.0);
    }

    proptest! {
        #[test]
        fn test_distance_is_symmetric(x1 in 0u32..100_000, y1 in 0u32..100_000,
                                      x2 in 0u32..100_000, y2 in 0u32..100_000) {
            let a = Point::new(x1, y1);
            let b = Point::new(x2, y2);
            prop_assert_eq!(distance(a, b), distance(b, a));
            prop_assert!(distance(a, b) >= 0.0);
        }

        #[test]
        fn test_distance_to_self_is_zero(x in any::<u32>(), y in any::<u32>()) {
            let p = Point::new(x, y);
            prop_assert_eq!(distance(p, p), 0.0);
        }

        #[test]
        fn test_distance_f64_symmetric(ax in -1e6f64..1e6, ay in -1e6f64..1e6,
                                       bx in -1e6f64..1e6, by in -1e6f64..1e6) {
            prop_assert_eq!(distance_f64((ax, ay), (bx, by)), distance_f64((bx, by), (ax, ay)));
        }
    }
}
