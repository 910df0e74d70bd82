//! Draws the tile map and every occupied player slot, camera centered on
//! the local player.

use macroquad::prelude::*;
use shared::game::{Player, PlayerState};
use shared::map::{Map, TILE_STONE};

const PIXELS_PER_UNIT: f32 = 40.0;
const PLAYER_RADIUS_UNITS: f32 = 0.25;

pub struct RenderConfig {
    pub local_peer_index: Option<usize>,
    pub connected: bool,
    pub adjustment_amount: i8,
}

pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Renderer
    }

    pub fn render(&mut self, map: &Map, players: &[Player], config: &RenderConfig) {
        clear_background(Color::from_rgba(18, 18, 18, 255));

        let camera_center = config
            .local_peer_index
            .map(|i| players[i].pos)
            .unwrap_or(shared::Vec2::ZERO);

        let origin_x = screen_width() / 2.0 - camera_center.x * PIXELS_PER_UNIT;
        let origin_y = screen_height() / 2.0 - camera_center.y * PIXELS_PER_UNIT;

        self.draw_map(map, origin_x, origin_y);

        for (index, player) in players.iter().enumerate() {
            if !player.occupied {
                continue;
            }
            let is_local = Some(index) == config.local_peer_index;
            self.draw_player(player, is_local, origin_x, origin_y);
        }

        self.draw_hud(config);
    }

    fn draw_map(&self, map: &Map, origin_x: f32, origin_y: f32) {
        for j in 0..map.height {
            for i in 0..map.width {
                let tile = map.data[(j * map.width + i) as usize];
                if tile != TILE_STONE {
                    continue;
                }
                let x = origin_x + (map.origin.x + i as f32 * map.tile_size) * PIXELS_PER_UNIT;
                let y = origin_y + (map.origin.y + j as f32 * map.tile_size) * PIXELS_PER_UNIT;
                let size = map.tile_size * PIXELS_PER_UNIT;
                draw_rectangle(x, y, size, size, Color::from_rgba(90, 90, 100, 255));
            }
        }
    }

    fn draw_player(&self, player: &Player, is_local: bool, origin_x: f32, origin_y: f32) {
        let x = origin_x + player.pos.x * PIXELS_PER_UNIT;
        let y = origin_y + player.pos.y * PIXELS_PER_UNIT;
        let radius = PLAYER_RADIUS_UNITS * PIXELS_PER_UNIT;

        let color = hue_to_rgb(player.hue);
        draw_circle(x, y, radius, color);
        draw_circle_lines(x, y, radius, 2.0, if is_local { WHITE } else { BLACK });

        let look_end_x = x + player.look.x * radius * 1.5;
        let look_end_y = y + player.look.y * radius * 1.5;
        draw_line(x, y, look_end_x, look_end_y, 2.0, WHITE);

        if player.state == PlayerState::Sliding {
            draw_circle_lines(x, y, radius + 3.0, 1.5, YELLOW);
        }
    }

    fn draw_hud(&self, config: &RenderConfig) {
        let (status, color) = if config.connected {
            ("CONNECTED", GREEN)
        } else {
            ("CONNECTING", RED)
        };
        draw_text(status, 10.0, 20.0, 20.0, color);
        draw_text(
            &format!("adjustment: {}", config.adjustment_amount),
            10.0,
            40.0,
            16.0,
            WHITE,
        );
        draw_text("[G] toggle network graph", 10.0, 60.0, 14.0, GRAY);
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps a hue in degrees to an RGB color at full saturation/value, used to
/// tell players apart without per-player identity in the render path.
fn hue_to_rgb(hue: f32) -> Color {
    let h = hue.rem_euclid(360.0) / 60.0;
    let c = 1.0;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as i32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    Color::new(r, g, b, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hue_zero_is_red() {
        let c = hue_to_rgb(0.0);
        assert!((c.r - 1.0).abs() < 1e-4);
        assert!(c.g.abs() < 1e-4);
        assert!(c.b.abs() < 1e-4);
    }

    #[test]
    fn hue_is_periodic() {
        let a = hue_to_rgb(20.0);
        let b = hue_to_rgb(380.0);
        assert!((a.r - b.r).abs() < 1e-4);
        assert!((a.g - b.g).abs() < 1e-4);
        assert!((a.b - b.b).abs() < 1e-4);
    }
}
