//! Client-side library: prediction/reconciliation state, local input
//! capture, the UDP network loop and scheduler, and rendering.
//!
//! The client runs the same deterministic [`shared::game::step`] the server
//! does, predicting the local player ahead of the network and correcting it
//! against authoritative snapshots as they arrive (see [`game::ClientState`]).

pub mod game;
pub mod input;
pub mod network;
pub mod network_graph;
pub mod rendering;
