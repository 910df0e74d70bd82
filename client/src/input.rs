//! Local input capture.
//!
//! Samples keyboard and mouse state once per simulation tick and packages it
//! as a `shared::game::Input`. Aim is a twin-stick direction from screen
//! center to the cursor; everything else is a direct key/button read.

use macroquad::prelude::*;
use shared::game::Input;
use shared::Vec2;

pub struct InputManager;

impl InputManager {
    pub fn new() -> Self {
        InputManager
    }

    pub fn capture(&self) -> Input {
        let move_up = is_key_down(KeyCode::W) || is_key_down(KeyCode::Up);
        let move_down = is_key_down(KeyCode::S) || is_key_down(KeyCode::Down);
        let move_left = is_key_down(KeyCode::A) || is_key_down(KeyCode::Left);
        let move_right = is_key_down(KeyCode::D) || is_key_down(KeyCode::Right);
        let dodge = is_key_down(KeyCode::LeftShift) || is_key_down(KeyCode::Space);
        let shoot = is_mouse_button_down(MouseButton::Left);
        let quit = is_key_pressed(KeyCode::Escape);

        let aim = resolve_aim(mouse_position(), (screen_width(), screen_height()));

        Input {
            aim,
            move_up,
            move_down,
            move_left,
            move_right,
            dodge,
            shoot,
            quit,
        }
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Direction from screen center to the cursor, defaulting to `(1, 0)` when
/// the cursor sits exactly on center (mirrors the zero-aim rule in
/// `shared::game::step`).
fn resolve_aim(mouse: (f32, f32), screen: (f32, f32)) -> Vec2 {
    let raw = Vec2::new(mouse.0 - screen.0 / 2.0, mouse.1 - screen.1 / 2.0);
    if raw.is_zero() {
        Vec2::new(1.0, 0.0)
    } else {
        raw.normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aim_points_from_center_to_cursor() {
        let aim = resolve_aim((900.0, 200.0), (800.0, 600.0));
        assert!(aim.x > 0.0);
        assert!(aim.y < 0.0);
    }

    #[test]
    fn aim_defaults_to_positive_x_when_cursor_is_centered() {
        let aim = resolve_aim((400.0, 300.0), (800.0, 600.0));
        assert!(aim.approx_eq(Vec2::new(1.0, 0.0)));
    }

    #[test]
    fn aim_is_normalized() {
        let aim = resolve_aim((900.0, 700.0), (800.0, 600.0));
        assert!((aim.len() - 1.0).abs() < 1e-4);
    }
}
