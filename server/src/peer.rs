//! Per-connection server-side state: the update log, the outbound batch
//! builder, and the bookkeeping needed for timeout detection and tick-sync.

use shared::game::Input;
use shared::protocol::ServerBatchBuilder;
use shared::ring::RingBuffer;
use shared::RING_CAPACITY;
use std::net::SocketAddr;
use std::time::Instant;

#[derive(Debug, Clone, Copy)]
pub struct UpdateLogEntry {
    pub client_sim_tick: u64,
    pub server_net_tick_received: u64,
    pub input: Input,
}

/// One connected client's server-side state. Identity is the slot index in
/// [`crate::game::ServerState::peers`], which doubles as the player slot
/// index — both arrays are indexed by the same peer index.
#[derive(Default)]
pub struct Peer {
    pub connected: bool,
    pub addr: Option<SocketAddr>,
    pub last_seen: Option<Instant>,
    pub update_processed: bool,
    pub update_log: RingBuffer<UpdateLogEntry, RING_CAPACITY>,
    pub adjustment_amount: i8,
    pub adjustment_iteration: u8,
    pub output: ServerBatchBuilder,
}

impl Peer {
    pub fn reset(&mut self) {
        *self = Peer::default();
    }

    pub fn is_timed_out(&self, now: Instant, timeout: std::time::Duration) -> bool {
        match self.last_seen {
            Some(last_seen) => now.duration_since(last_seen) > timeout,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_peer_is_not_timed_out() {
        let peer = Peer::default();
        assert!(!peer.is_timed_out(Instant::now(), std::time::Duration::from_secs(5)));
    }

    #[test]
    fn reset_clears_connection_state() {
        let mut peer = Peer::default();
        peer.connected = true;
        peer.update_processed = true;
        peer.reset();
        assert!(!peer.connected);
        assert!(!peer.update_processed);
    }
}
