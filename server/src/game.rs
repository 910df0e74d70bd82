//! Server-authoritative game state: the player slot table plus, per peer,
//! the update log that buffers inputs until their matching simulation tick.

use crate::peer::{Peer, UpdateLogEntry};
use shared::game::{step, Input, Player};
use shared::{Game, Map, MAX_CLIENTS};

/// One peer's input was applied this tick and produced an AUTH; carries the
/// data the session/network layer needs to build the AUTH/PEER_AUTH packets.
pub struct Applied {
    pub peer_index: usize,
    pub simulation_tick: u64,
}

pub struct ServerState {
    pub game: Game,
    pub peers: [Peer; MAX_CLIENTS],
}

impl ServerState {
    pub fn new(map: Map) -> Self {
        ServerState {
            game: Game::new(map),
            peers: std::array::from_fn(|_| Peer::default()),
        }
    }

    pub fn first_free_peer_slot(&self) -> Option<usize> {
        self.peers.iter().position(|p| !p.connected)
    }

    /// Occupies a peer/player slot for a newly connected client.
    pub fn connect(&mut self, peer_index: usize) {
        self.peers[peer_index].connected = true;
        self.game.players[peer_index] = Player::spawn();
    }

    /// Frees a peer/player slot on disconnect or timeout.
    pub fn disconnect(&mut self, peer_index: usize) {
        self.game.players[peer_index] = Player::default();
        self.peers[peer_index].reset();
    }

    pub fn record_input(&mut self, peer_index: usize, entry: UpdateLogEntry) {
        self.peers[peer_index].update_log.push(entry);
    }

    /// Runs the input-scheduling step for one server simulation tick.
    ///
    /// For every connected peer: apply the oldest logged input if it matches
    /// this tick, discard it if it's late, or leave it queued if the client
    /// is running ahead as intended. Peers with no matching input this tick
    /// still advance through the simulation step with an empty input, so
    /// passive physics (deceleration, timer decay) keeps ticking.
    pub fn advance_tick(&mut self, simulation_tick: u64) -> Vec<Applied> {
        let mut applied = Vec::new();

        for peer_index in 0..MAX_CLIENTS {
            if !self.peers[peer_index].connected {
                continue;
            }

            loop {
                let Some(entry) = self.peers[peer_index].update_log.peek_front().copied() else {
                    break;
                };

                if entry.client_sim_tick < simulation_tick {
                    log::info!(
                        "peer {peer_index}: dropping late input for tick {} (server at {simulation_tick})",
                        entry.client_sim_tick
                    );
                    self.peers[peer_index].update_log.pop_front();
                    continue;
                }

                if entry.client_sim_tick == simulation_tick {
                    self.peers[peer_index].update_log.pop_front();
                    step(
                        &self.game.map,
                        &mut self.game.players[peer_index],
                        &entry.input,
                        shared::DT_NOMINAL,
                        false,
                    );
                    self.peers[peer_index].update_processed = true;
                    applied.push(Applied {
                        peer_index,
                        simulation_tick,
                    });
                }

                break;
            }
        }

        for peer_index in 0..MAX_CLIENTS {
            if !self.peers[peer_index].connected {
                continue;
            }
            if self.peers[peer_index].update_processed {
                self.peers[peer_index].update_processed = false;
                continue;
            }
            step(
                &self.game.map,
                &mut self.game.players[peer_index],
                &Input::default(),
                shared::DT_NOMINAL,
                false,
            );
        }

        applied
    }
}
