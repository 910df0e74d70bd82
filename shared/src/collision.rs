//! Circle-vs-AABB and circle-vs-circle collision resolution.
//!
//! Both routines return a minimum translation vector (MTV): the shortest
//! displacement that separates the two shapes, expressed as a displacement
//! to apply to the *second* argument (the circle).

use crate::vec2::Vec2;

#[derive(Debug, Clone, Copy, Default)]
pub struct Collision {
    pub colliding: bool,
    pub resolve: Vec2,
}

impl Collision {
    fn none() -> Self {
        Collision {
            colliding: false,
            resolve: Vec2::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Aabb {
    pub pos: Vec2,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct Circle {
    pub pos: Vec2,
    pub radius: f32,
}

fn clamp(x: f32, a: f32, b: f32) -> f32 {
    x.max(a).min(b)
}

pub fn collide_circle_circle(a: Circle, b: Circle) -> Collision {
    let radius_sum = a.radius + b.radius;
    let center_diff = b.pos.sub(a.pos);
    let center_diff_len2 = center_diff.len2();

    if center_diff_len2 > radius_sum * radius_sum {
        return Collision::none();
    }

    let center_diff_len = center_diff_len2.sqrt();
    let overlap = radius_sum - center_diff_len;

    Collision {
        colliding: true,
        resolve: center_diff.scale(overlap / center_diff_len),
    }
}

pub fn collide_aabb_circle(rect: Aabb, circle: Circle) -> Collision {
    let nearest = Vec2::new(
        clamp(circle.pos.x, rect.pos.x, rect.pos.x + rect.width),
        clamp(circle.pos.y, rect.pos.y, rect.pos.y + rect.height),
    );

    let nearest = nearest.sub(circle.pos);
    let dist2 = nearest.len2();

    if circle.radius * circle.radius < dist2 {
        return Collision::none();
    }

    let dist = dist2.sqrt();
    Collision {
        colliding: true,
        resolve: nearest.scale(-(circle.radius - dist) / dist),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_overlapping_circles_do_not_collide() {
        let a = Circle {
            pos: Vec2::ZERO,
            radius: 1.0,
        };
        let b = Circle {
            pos: Vec2::new(5.0, 0.0),
            radius: 1.0,
        };
        assert!(!collide_circle_circle(a, b).colliding);
    }

    #[test]
    fn overlapping_circles_resolve_along_center_line() {
        let a = Circle {
            pos: Vec2::ZERO,
            radius: 1.0,
        };
        let b = Circle {
            pos: Vec2::new(1.0, 0.0),
            radius: 1.0,
        };
        let result = collide_circle_circle(a, b);
        assert!(result.colliding);
        assert!(result.resolve.x > 0.0);
        assert!(result.resolve.y.abs() < 1e-4);
    }

    #[test]
    fn circle_outside_aabb_does_not_collide() {
        let rect = Aabb {
            pos: Vec2::ZERO,
            width: 1.0,
            height: 1.0,
        };
        let circle = Circle {
            pos: Vec2::new(5.0, 5.0),
            radius: 0.25,
        };
        assert!(!collide_aabb_circle(rect, circle).colliding);
    }

    #[test]
    fn circle_penetrating_aabb_edge_resolves_outward() {
        let rect = Aabb {
            pos: Vec2::new(0.0, 0.0),
            width: 1.0,
            height: 1.0,
        };
        let circle = Circle {
            pos: Vec2::new(-0.1, 0.5),
            radius: 0.25,
        };
        let result = collide_aabb_circle(rect, circle);
        assert!(result.colliding);
        assert!(result.resolve.x < 0.0);

        let resolved_pos = circle.pos.add(result.resolve);
        let post = collide_aabb_circle(rect, Circle { pos: resolved_pos, radius: circle.radius });
        assert!(!post.colliding);
    }

    #[test]
    fn circle_overlapping_top_edge_resolves_upward() {
        let rect = Aabb {
            pos: Vec2::new(0.0, 0.0),
            width: 2.0,
            height: 2.0,
        };
        let circle = Circle {
            pos: Vec2::new(1.0, -0.1),
            radius: 0.5,
        };
        let result = collide_aabb_circle(rect, circle);
        assert!(result.colliding);
        assert!(result.resolve.y < 0.0);
    }
}
