//! # Game Server Library
//!
//! The authoritative server for the networked multiplayer game. It runs the
//! canonical simulation, schedules buffered client input onto the matching
//! simulation tick, and broadcasts authoritative state back to every peer.
//!
//! ## Architecture
//!
//! ### Single-Threaded Event Loop
//! The server is single-threaded and event-driven: one loop polls the
//! socket, schedules input, advances the simulation and flushes outgoing
//! batches, strictly in that order, every tick. No simulation state is
//! shared across threads and nothing is locked — see [`network::Server`].
//!
//! ### Slot-Based Identity
//! Peer and player identity are both the same array index. A peer's
//! `connected` flag is the liveness bit; there is no client ID beyond the
//! slot index, and slots are reused once a peer disconnects.
//!
//! ## Module Organization
//!
//! - [`peer`]: per-connection state — update log, outbound batch builder,
//!   timeout bookkeeping.
//! - [`game`]: the player slot table and the tick-matched input scheduling
//!   step.
//! - [`network`]: socket I/O, the tick-sync adjustment algorithm, session
//!   management, and the fixed-timestep scheduler loop.

pub mod game;
pub mod network;
pub mod peer;
