//! Client-side prediction and reconciliation.
//!
//! The local player is advanced immediately, every simulation tick, from
//! locally captured input — never waiting on the network. When an
//! authoritative snapshot for a past tick arrives, the inputs captured since
//! that tick are replayed on a scratch copy of the player to check whether
//! the client would have reached the same place; if not, the live player is
//! snapped to the authoritative state rather than the replay result, so
//! divergence is visible instead of hidden.

use shared::game::{step, Input, Player};
use shared::ring::RingBuffer;
use shared::{Game, Map, MAX_CLIENTS, RING_CAPACITY};

/// The client's mirror of the shared game state, plus the rolling input
/// history needed to replay predictions against late-arriving snapshots.
pub struct ClientState {
    pub game: Game,
    pub local_peer_index: Option<usize>,
    input_ring: RingBuffer<Input, RING_CAPACITY>,
    last_predicted_tick: Option<u64>,
}

impl ClientState {
    pub fn new(map: Map) -> Self {
        ClientState {
            game: Game::new(map),
            local_peer_index: None,
            input_ring: RingBuffer::new(),
            last_predicted_tick: None,
        }
    }

    pub fn local_player(&self) -> Option<&Player> {
        self.local_peer_index.map(|i| &self.game.players[i])
    }

    /// Records `input` for `simulation_tick` into the input ring and
    /// advances the local player by one step. The ring behaves as a rolling
    /// window: once full, the oldest entry is discarded to make room rather
    /// than growing without bound.
    pub fn predict(&mut self, simulation_tick: u64, input: Input) {
        if self.input_ring.is_full() {
            self.input_ring.pop_front();
        }
        self.input_ring.push(input);
        self.last_predicted_tick = Some(simulation_tick);

        if let Some(peer_index) = self.local_peer_index {
            step(
                &self.game.map,
                &mut self.game.players[peer_index],
                &input,
                shared::DT_NOMINAL,
                false,
            );
        }
    }

    /// Applies an `AUTH` snapshot for the local player captured at
    /// `auth_tick`. Replays the inputs captured since on a scratch player;
    /// if the replay disagrees with the live prediction, the live player is
    /// overwritten with `player_state` (not the replay result) so the pop is
    /// visible rather than masked.
    pub fn reconcile(&mut self, auth_tick: u64, player_state: Player) {
        let Some(peer_index) = self.local_peer_index else {
            return;
        };
        let Some(current_tick) = self.last_predicted_tick else {
            return;
        };

        assert!(
            auth_tick <= current_tick,
            "AUTH tick {auth_tick} is ahead of the last predicted tick {current_tick}"
        );
        let age = current_tick - auth_tick;
        assert!(
            (age as usize) < RING_CAPACITY,
            "reconciliation replay window of {age} ticks exceeds the input ring's capacity"
        );

        let mut scratch = player_state;
        for offset in (0..age).rev() {
            let input = self
                .input_ring
                .get_back(offset as usize)
                .copied()
                .unwrap_or_default();
            step(&self.game.map, &mut scratch, &input, shared::DT_NOMINAL, true);
        }

        let live = &self.game.players[peer_index];
        if !scratch.pos.approx_eq(live.pos) {
            self.game.players[peer_index] = player_state;
        }
    }

    /// Applies a `PEER_AUTH` snapshot verbatim, with no replay — remote
    /// players are never predicted.
    pub fn apply_peer_auth(&mut self, peer_index: usize, player_state: Player) {
        if peer_index < MAX_CLIENTS {
            self.game.players[peer_index] = player_state;
        }
    }

    pub fn on_peer_connected(&mut self, peer_index: usize, player: Player) {
        if peer_index < MAX_CLIENTS {
            self.game.players[peer_index] = player;
        }
    }

    pub fn on_peer_disconnected(&mut self, peer_index: usize) {
        if peer_index < MAX_CLIENTS {
            self.game.players[peer_index] = Player::default();
        }
    }
}
