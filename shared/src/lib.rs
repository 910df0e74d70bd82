//! Shared simulation, collision, protocol and error types used by both the
//! client and the server binary.
//!
//! This crate is the deterministic core: everything in it must behave
//! identically regardless of which side calls it, since the client's
//! reconciliation loop and the server's authoritative loop both run the same
//! [`game::step`] against the same [`map::Map`].

pub mod collision;
pub mod error;
pub mod game;
pub mod map;
pub mod protocol;
pub mod ring;
pub mod vec2;

pub use error::NetcodeError;
pub use game::{Game, Input, Player, PlayerState};
pub use map::Map;
pub use vec2::Vec2;

/// Maximum number of simultaneously connected clients; also the size of the
/// player slot array. Peer identity is the index into that array.
pub const MAX_CLIENTS: usize = 128;

/// Simulation rate in ticks per second.
pub const FPS: u32 = 60;

/// Nominal timestep, always passed to [`game::step`] regardless of measured
/// frame time, so the simulation stays deterministic.
pub const DT_NOMINAL: f32 = 1.0 / FPS as f32;

/// Simulation ticks per network tick; network I/O only happens when
/// `simulation_tick % NET_PER_SIM_TICKS == 0`.
pub const NET_PER_SIM_TICKS: u64 = 2;

/// Width of the server's acceptance window for a client's advertised
/// network tick, in network ticks.
pub const VALID_TICK_WINDOW: i64 = 2;

/// Network ticks a freshly connected client seeds itself ahead of the
/// server by, so it starts inside the valid window immediately.
pub const INITIAL_SERVER_NETWORK_TICK_OFFSET: u64 = 5;

/// Capacity of the client's input ring and the server's per-peer update log.
pub const RING_CAPACITY: usize = 512;

/// Float equality tolerance used throughout the simulation and its tests.
pub const EPSILON: f32 = 1e-4;

pub const MAX_MOVE_SPEED: f32 = 5.0;
pub const MAX_DODGE_SPEED: f32 = 10.0;

/// Per-peer outbound buffer cap, in bytes, before a protocol sizing bug is
/// assumed.
pub const SERVER_OUTPUT_BUFFER_SIZE: usize = 32_000;
pub const CLIENT_OUTPUT_BUFFER_SIZE: usize = 2_048;

/// Connection is considered dead after this many seconds without a packet.
pub const CONNECTION_TIMEOUT_SECS: u64 = 5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_tick_boundary_matches_simulation_tick_invariant() {
        for sim_tick in 0u64..20 {
            let network_tick = sim_tick / NET_PER_SIM_TICKS;
            let k = sim_tick - network_tick * NET_PER_SIM_TICKS;
            assert!(k < NET_PER_SIM_TICKS);
        }
    }
}
