//! The deterministic per-tick simulation step shared by client and server.
//!
//! [`step`] must be a pure function of its arguments: same `Game` (read-only
//! here), same starting `Player`, same `Input`, same `dt` always yields the
//! same ending `Player`, bit-identical, on any machine. The client's
//! reconciliation loop and the server's authoritative loop both call this
//! same function; if it ever depends on wall-clock time, unseeded randomness
//! or iteration order, reconciliation silently breaks.

use crate::collision::{collide_aabb_circle, Aabb, Circle};
use crate::map::{Map, TILE_STONE};
use crate::vec2::Vec2;
use crate::{MAX_CLIENTS, MAX_DODGE_SPEED, MAX_MOVE_SPEED};

const DODGE_TIME: f32 = 0.10;
const DODGE_DELAY_TIME: f32 = 1.0;
const PLAYER_RADIUS: f32 = 0.25;

/// One frame of captured intent. The aim direction must be non-zero; callers
/// substitute `(1, 0)` when the input collaborator reports a zero vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Input {
    pub aim: Vec2,
    pub move_up: bool,
    pub move_down: bool,
    pub move_left: bool,
    pub move_right: bool,
    pub dodge: bool,
    pub shoot: bool,
    pub quit: bool,
}

impl Default for Input {
    fn default() -> Self {
        Input {
            aim: Vec2::new(1.0, 0.0),
            move_up: false,
            move_down: false,
            move_left: false,
            move_right: false,
            dodge: false,
            shoot: false,
            quit: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerState {
    #[default]
    Default,
    Sliding,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Player {
    pub occupied: bool,

    pub pos: Vec2,
    pub velocity: Vec2,

    pub dodge: Vec2,
    pub look: Vec2,

    pub time_left_in_dodge: f32,
    pub time_left_in_dodge_delay: f32,
    pub time_left_in_shoot_delay: f32,

    pub hue: f32,
    pub health: f32,

    pub state: PlayerState,
}

impl Default for Player {
    fn default() -> Self {
        Player {
            occupied: false,
            pos: Vec2::ZERO,
            velocity: Vec2::ZERO,
            dodge: Vec2::ZERO,
            look: Vec2::new(1.0, 0.0),
            time_left_in_dodge: 0.0,
            time_left_in_dodge_delay: 0.0,
            time_left_in_shoot_delay: 0.0,
            hue: 0.0,
            health: 0.0,
            state: PlayerState::Default,
        }
    }
}

impl Player {
    /// Resets a slot to the state a freshly connected player spawns into.
    pub fn spawn() -> Self {
        Player {
            occupied: true,
            hue: 20.0,
            health: 100.0,
            ..Player::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Game {
    pub map: Map,
    pub players: [Player; MAX_CLIENTS],
}

impl Default for Game {
    fn default() -> Self {
        Game {
            map: Map::default_arena(),
            players: [Player::default(); MAX_CLIENTS],
        }
    }
}

impl Game {
    pub fn new(map: Map) -> Self {
        Game {
            map,
            players: [Player::default(); MAX_CLIENTS],
        }
    }

    /// First unoccupied player slot, if any.
    pub fn first_free_slot(&self) -> Option<usize> {
        self.players.iter().position(|p| !p.occupied)
    }
}

const TILE_OFFSETS: [Vec2; 8] = [
    Vec2 { x: 1.0, y: 0.0 },
    Vec2 { x: 1.0, y: -1.0 },
    Vec2 { x: 0.0, y: -1.0 },
    Vec2 { x: -1.0, y: -1.0 },
    Vec2 { x: -1.0, y: 0.0 },
    Vec2 { x: -1.0, y: 1.0 },
    Vec2 { x: 0.0, y: 1.0 },
    Vec2 { x: 1.0, y: 1.0 },
];

/// Advances `player` by one simulation tick given `input`.
///
/// Takes `&Map` rather than `&Game`: the step only ever needs tile lookups,
/// and calling it as `step(&game.map, &mut game.players[i], ...)` lets
/// callers that store the player inside the same `Game` borrow both fields
/// disjointly instead of aliasing a whole-struct borrow against one of its
/// own fields.
///
/// `replaying` gates side effects that must not repeat during client
/// reconciliation replay; it has no observable effect today since shooting
/// is stubbed out, but future side-effecting actions must check it.
pub fn step(map: &Map, player: &mut Player, input: &Input, dt: f32, replaying: bool) {
    let _ = replaying;

    let move_acceleration = 0.5 / dt;
    let dodge_acceleration = 1.0 / dt;
    let dodge_deceleration = 0.10 / dt;

    player.look = input.aim.normalize();

    if player.time_left_in_shoot_delay > 0.0 {
        player.time_left_in_shoot_delay = (player.time_left_in_shoot_delay - dt).max(0.0);
    }
    if player.time_left_in_dodge_delay > 0.0 {
        player.time_left_in_dodge_delay = (player.time_left_in_dodge_delay - dt).max(0.0);
    }

    let in_dodge_delay = player.time_left_in_dodge_delay > 0.0;
    let was_sliding = player.state == PlayerState::Sliding;
    if !in_dodge_delay && !was_sliding && input.dodge {
        player.dodge = player.look;
        player.time_left_in_dodge = DODGE_TIME;
        player.state = PlayerState::Sliding;

        let speed = player.velocity.len();
        player.velocity = player.dodge.scale(speed);
    }

    let mut has_moved = false;

    if player.state == PlayerState::Sliding {
        if player.time_left_in_dodge > 0.0 {
            player.velocity = player
                .velocity
                .add(player.dodge.scale(dt * dodge_acceleration));
            let speed = player.velocity.len();
            if speed > MAX_DODGE_SPEED {
                player.velocity = player.velocity.normalize().scale(MAX_DODGE_SPEED);
            }
            has_moved = true;

            player.time_left_in_dodge = (player.time_left_in_dodge - dt).max(0.0);
        } else {
            let speed = player.velocity.len();
            if speed > 0.0 {
                let slowdown_dir = player.velocity.normalize().neg();
                let slowdown = (dt * dodge_deceleration).min(speed);
                if speed < dt * dodge_deceleration {
                    player.state = PlayerState::Default;
                    player.time_left_in_dodge_delay = DODGE_DELAY_TIME;
                }
                player.velocity = player.velocity.add(slowdown_dir.scale(slowdown));
            }
        }
    }

    let dx = (input.move_right as i32 - input.move_left as i32) as f32;
    let dy = (input.move_down as i32 - input.move_up as i32) as f32;
    let dv = Vec2::new(dx, dy);
    let len2 = dv.len2();

    if player.state == PlayerState::Sliding && player.time_left_in_dodge == 0.0 {
        let speed = player.velocity.len();
        if speed <= MAX_MOVE_SPEED && len2 > 0.0 {
            player.state = PlayerState::Default;
            player.time_left_in_dodge_delay = DODGE_DELAY_TIME;
        }
    }

    if player.state != PlayerState::Sliding {
        if len2 > 0.0 {
            let len = len2.sqrt();
            player.velocity = player
                .velocity
                .add(dv.scale(dt * move_acceleration / len));
            let speed = player.velocity.len();
            if speed > MAX_MOVE_SPEED {
                player.velocity = player.velocity.normalize().scale(MAX_MOVE_SPEED);
            }
        } else {
            let speed = player.velocity.len();
            if speed > 0.0 {
                let slowdown_dir = player.velocity.normalize().neg();
                let slowdown = (dt * move_acceleration).min(speed);
                player.velocity = player.velocity.add(slowdown_dir.scale(slowdown));
            }
        }
    }

    if !player.velocity.is_zero() {
        player.pos = player.pos.add(player.velocity.scale(dt));
        has_moved = true;
    }

    if !has_moved {
        return;
    }

    for offset in TILE_OFFSETS {
        let at = player.pos.add(offset.scale(map.tile_size));
        if map.tile_at(at) != TILE_STONE {
            continue;
        }

        let (i, j) = map.coord_of(at);
        let tile_origin = Vec2::new(
            map.origin.x + i as f32 * map.tile_size,
            map.origin.y + j as f32 * map.tile_size,
        );

        let result = collide_aabb_circle(
            Aabb {
                pos: tile_origin,
                width: map.tile_size,
                height: map.tile_size,
            },
            Circle {
                pos: player.pos,
                radius: PLAYER_RADIUS,
            },
        );

        if !result.colliding || result.resolve.is_zero() {
            continue;
        }

        player.pos = player.pos.add(result.resolve);

        if was_sliding {
            let dot = player.dodge.dot(result.resolve.normalize());
            // Resolve and dodge point roughly opposite when the player rammed
            // the wall head-on; -0.6 gives a bit of slack over the strict
            // -0.5 (90+45deg) threshold.
            if dot <= -0.6 {
                player.state = PlayerState::Default;
                player.time_left_in_dodge = 0.0;
                player.time_left_in_dodge_delay = DODGE_DELAY_TIME;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FPS;
    use assert_approx_eq::assert_approx_eq;

    fn dt() -> f32 {
        1.0 / FPS as f32
    }

    #[test]
    fn determinism_same_inputs_same_result() {
        let game = Game::default();
        let mut p1 = Player::spawn();
        let mut p2 = Player::spawn();

        let input = Input {
            move_right: true,
            ..Input::default()
        };

        for _ in 0..30 {
            step(&game.map, &mut p1, &input, dt(), false);
            step(&game.map, &mut p2, &input, dt(), false);
        }

        assert!(p1.pos.approx_eq(p2.pos));
        assert!(p1.velocity.approx_eq(p2.velocity));
    }

    #[test]
    fn walking_accelerates_up_to_cap() {
        let game = Game::default();
        let mut p = Player::spawn();
        let input = Input {
            move_right: true,
            ..Input::default()
        };
        for _ in 0..600 {
            step(&game.map, &mut p, &input, dt(), false);
        }
        assert_approx_eq!(p.velocity.len(), MAX_MOVE_SPEED, 1e-3);
    }

    #[test]
    fn releasing_input_decelerates_to_rest() {
        let game = Game::default();
        let mut p = Player::spawn();
        let moving = Input {
            move_right: true,
            ..Input::default()
        };
        for _ in 0..60 {
            step(&game.map, &mut p, &moving, dt(), false);
        }
        let idle = Input::default();
        for _ in 0..60 {
            step(&game.map, &mut p, &idle, dt(), false);
        }
        assert_approx_eq!(p.velocity.len(), 0.0, 1e-3);
    }

    #[test]
    fn dodge_initiation_sets_sliding_state() {
        let game = Game::default();
        let mut p = Player::spawn();
        let input = Input {
            dodge: true,
            ..Input::default()
        };
        step(&game.map, &mut p, &input, dt(), false);
        assert_eq!(p.state, PlayerState::Sliding);
        assert_approx_eq!(p.time_left_in_dodge, 0.10 - dt(), 1e-4);
    }

    #[test]
    fn dodge_into_wall_cancels_slide() {
        let game = Game::default();
        let mut p = Player::spawn();
        p.pos = Vec2::new(-6.8, 0.0);
        let input = Input {
            aim: Vec2::new(-1.0, 0.0),
            move_left: true,
            dodge: true,
            ..Input::default()
        };
        for _ in 0..10 {
            step(&game.map, &mut p, &input, dt(), false);
        }
        assert_eq!(p.state, PlayerState::Default);
        assert_approx_eq!(p.time_left_in_dodge, 0.0, 1e-4);
        assert_approx_eq!(p.time_left_in_dodge_delay, 1.0, 1e-4);
    }

    #[test]
    fn wall_stop_keeps_player_outside_wall() {
        let game = Game::default();
        let mut p = Player::spawn();
        p.pos = Vec2::new(-6.5, 0.0);
        p.velocity = Vec2::new(-6.0, 0.0);
        let input = Input::default();
        for _ in 0..5 {
            step(&game.map, &mut p, &input, dt(), false);
        }
        assert!(p.pos.x >= -7.0 + 0.25 - 1e-2);
    }

    #[test]
    fn zero_aim_defaults_handled_by_caller() {
        let game = Game::default();
        let mut p = Player::spawn();
        let input = Input {
            aim: Vec2::new(1.0, 0.0),
            ..Input::default()
        };
        step(&game.map, &mut p, &input, dt(), false);
        assert!(p.look.approx_eq(Vec2::new(1.0, 0.0)));
    }

    #[test]
    fn replaying_flag_does_not_change_result() {
        let game = Game::default();
        let mut p1 = Player::spawn();
        let mut p2 = Player::spawn();
        let input = Input {
            move_up: true,
            ..Input::default()
        };
        for _ in 0..10 {
            step(&game.map, &mut p1, &input, dt(), false);
            step(&game.map, &mut p2, &input, dt(), true);
        }
        assert!(p1.pos.approx_eq(p2.pos));
    }
}
