//! # Server Network Layer
//!
//! Polls a non-blocking UDP socket in a single-threaded loop, admits and
//! drops peers, runs the tick-sync adjustment algorithm on every inbound
//! batch, and paces the simulation at a fixed 60Hz rate.
//!
//! There is no spawned task and no lock anywhere in this module: the peer
//! table, the update logs and the outbound buffers are owned exclusively by
//! the thread running [`Server::run`].

use crate::game::ServerState;
use crate::peer::UpdateLogEntry;
use shared::protocol::{decode_client_batch, ClientPacket, ServerPacket};
use shared::{
    Map, NetcodeError, FPS, NET_PER_SIM_TICKS, SERVER_OUTPUT_BUFFER_SIZE, VALID_TICK_WINDOW,
};
use std::collections::HashMap;
use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

const CONNECTION_TIMEOUT: Duration = Duration::from_secs(shared::CONNECTION_TIMEOUT_SECS);

pub struct Server {
    socket: UdpSocket,
    state: ServerState,
    addr_to_peer: HashMap<SocketAddr, usize>,
    simulation_tick: u64,
    network_tick: u64,
}

impl Server {
    pub fn bind(port: u16) -> Result<Self, NetcodeError> {
        let addr = format!("0.0.0.0:{port}");
        let socket = UdpSocket::bind(&addr).map_err(|source| NetcodeError::Bind {
            addr: addr.clone(),
            source,
        })?;
        socket.set_nonblocking(true)?;
        log::info!("server listening on {addr}");

        Ok(Server {
            socket,
            state: ServerState::new(Map::default_arena()),
            addr_to_peer: HashMap::new(),
            simulation_tick: 0,
            network_tick: 0,
        })
    }

    /// The address the server's socket is actually bound to; useful for
    /// tests that bind to port 0 and need the ephemeral port back.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn run(&mut self) -> Result<(), NetcodeError> {
        let frame_desired = Duration::from_secs_f64(1.0 / FPS as f64);

        loop {
            let frame_start = Instant::now();
            let run_network_tick = self.simulation_tick % NET_PER_SIM_TICKS == 0;

            if run_network_tick {
                self.drain_network()?;
                self.check_timeouts();
            }

            let applied = self.state.advance_tick(self.simulation_tick);
            self.enqueue_auth_packets(applied);

            if run_network_tick {
                self.flush_outputs()?;
            }

            let elapsed = frame_start.elapsed();
            if elapsed < frame_desired {
                std::thread::sleep(frame_desired - elapsed);
            }

            if run_network_tick {
                self.network_tick += 1;
            }
            self.simulation_tick += 1;
        }
    }

    fn drain_network(&mut self) -> Result<(), NetcodeError> {
        let mut buf = [0u8; 4096];
        loop {
            match self.socket.recv_from(&mut buf) {
                Ok((len, addr)) => self.handle_datagram(addr, &buf[..len]),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn handle_datagram(&mut self, addr: SocketAddr, bytes: &[u8]) {
        if bytes.is_empty() {
            if let Some(&peer_index) = self.addr_to_peer.get(&addr) {
                self.handle_disconnect(peer_index, "graceful disconnect");
            }
            return;
        }

        let peer_index = match self.addr_to_peer.get(&addr) {
            Some(&idx) => idx,
            None => match self.admit(addr) {
                Some(idx) => idx,
                None => {
                    log::warn!("peer slot exhaustion, refusing connection from {addr}");
                    return;
                }
            },
        };

        self.state.peers[peer_index].last_seen = Some(Instant::now());
        self.handle_batch(peer_index, bytes);
    }

    /// Admits a newly seen address: allocates a peer/player slot and sends
    /// the `CONNECTED`/`PEER_CONNECTED` greeting packets.
    fn admit(&mut self, addr: SocketAddr) -> Option<usize> {
        let peer_index = self.state.first_free_peer_slot()?;
        self.state.connect(peer_index);
        self.addr_to_peer.insert(addr, peer_index);
        self.state.peers[peer_index].addr = Some(addr);

        log::info!("peer {peer_index} connected from {addr}");

        for other in 0..shared::MAX_CLIENTS {
            if other == peer_index || !self.state.peers[other].connected {
                continue;
            }
            self.push(
                peer_index,
                ServerPacket::PeerConnected {
                    player: self.state.game.players[other],
                    peer_index: other as u8,
                },
            );
        }

        self.push(
            peer_index,
            ServerPacket::Connected {
                player: self.state.game.players[peer_index],
                network_tick: self.network_tick,
                peer_index: peer_index as u8,
            },
        );

        for other in 0..shared::MAX_CLIENTS {
            if other == peer_index || !self.state.peers[other].connected {
                continue;
            }
            self.push(
                other,
                ServerPacket::PeerConnected {
                    player: self.state.game.players[peer_index],
                    peer_index: peer_index as u8,
                },
            );
        }

        Some(peer_index)
    }

    fn handle_disconnect(&mut self, peer_index: usize, reason: &str) {
        log::info!("peer {peer_index} disconnected: {reason}");

        for other in 0..shared::MAX_CLIENTS {
            if other == peer_index || !self.state.peers[other].connected {
                continue;
            }
            self.push(
                other,
                ServerPacket::PeerDisconnected {
                    peer_index: peer_index as u8,
                },
            );
        }

        if let Some(addr) = self.state.peers[peer_index].addr {
            self.addr_to_peer.remove(&addr);
        }
        self.state.disconnect(peer_index);
    }

    fn check_timeouts(&mut self) {
        let now = Instant::now();
        let timed_out: Vec<usize> = (0..shared::MAX_CLIENTS)
            .filter(|&i| {
                self.state.peers[i].connected && self.state.peers[i].is_timed_out(now, CONNECTION_TIMEOUT)
            })
            .collect();
        for peer_index in timed_out {
            self.handle_disconnect(peer_index, "timeout");
        }
    }

    /// Runs the tick-sync adjustment algorithm and schedules any
    /// `UPDATE` packets in the batch onto the peer's update log.
    fn handle_batch(&mut self, peer_index: usize, bytes: &[u8]) {
        let (header, packets) = decode_client_batch(bytes);

        let c = header.network_tick as i64;
        let s = self.network_tick as i64;
        let diff = s + (VALID_TICK_WINDOW - 1) - c;

        // `diff > 0` means the client is trailing the target window (behind,
        // must speed up); `diff` very negative means it is far past it
        // (ahead, must slow down). `Adjustment::amount` uses the opposite
        // sign convention (positive = ahead = slow down), so the value sent
        // over the wire is the negation of `diff`, not `diff` itself.
        if diff < i8::MIN as i64 || diff > i8::MAX as i64 || -diff > i8::MAX as i64 {
            log::error!(
                "peer {peer_index}: network tick diff {diff} outside adjustment range, dropping batch"
            );
            return;
        }

        let mut adjustment: i8 = 0;
        if diff < -(VALID_TICK_WINDOW - 1) || diff > 0 {
            adjustment = -diff as i8;
        }
        self.state.peers[peer_index].adjustment_amount = adjustment;
        self.state.peers[peer_index].adjustment_iteration = header.adjustment_iteration;

        if c < s {
            log::info!(
                "peer {peer_index}: dropping batch, too early: net_tick {c}, should be >= {s}"
            );
            self.push(peer_index, ServerPacket::Dropped);
            return;
        }
        if diff < -(VALID_TICK_WINDOW - 1) {
            log::info!(
                "peer {peer_index}: allowing packet, too late: net_tick {c}, should be >= {s}"
            );
        }

        for packet in packets {
            match packet {
                ClientPacket::Update {
                    simulation_tick,
                    input,
                } => {
                    self.state.record_input(
                        peer_index,
                        UpdateLogEntry {
                            client_sim_tick: simulation_tick,
                            server_net_tick_received: self.network_tick,
                            input,
                        },
                    );
                }
            }
        }
    }

    fn enqueue_auth_packets(&mut self, applied: Vec<crate::game::Applied>) {
        for entry in applied {
            let player = self.state.game.players[entry.peer_index];
            self.push(
                entry.peer_index,
                ServerPacket::Auth {
                    player,
                    simulation_tick: entry.simulation_tick,
                },
            );
            for other in 0..shared::MAX_CLIENTS {
                if other == entry.peer_index || !self.state.peers[other].connected {
                    continue;
                }
                self.push(
                    other,
                    ServerPacket::PeerAuth {
                        player,
                        simulation_tick: entry.simulation_tick,
                        peer_index: entry.peer_index as u8,
                    },
                );
            }
        }
    }

    fn push(&mut self, peer_index: usize, packet: ServerPacket) {
        let peer = &mut self.state.peers[peer_index];
        assert!(
            peer.output.len() < SERVER_OUTPUT_BUFFER_SIZE,
            "peer {peer_index}: outbound buffer overflow"
        );
        peer.output.push(&packet);
    }

    fn flush_outputs(&mut self) -> Result<(), NetcodeError> {
        for peer_index in 0..shared::MAX_CLIENTS {
            if !self.state.peers[peer_index].connected {
                continue;
            }
            if self.state.peers[peer_index].output.is_empty() {
                continue;
            }
            let Some(addr) = self.state.peers[peer_index].addr else {
                continue;
            };

            let adjustment_amount = self.state.peers[peer_index].adjustment_amount;
            let adjustment_iteration = self.state.peers[peer_index].adjustment_iteration;
            let builder = std::mem::take(&mut self.state.peers[peer_index].output);
            let bytes = builder.finish(adjustment_amount, adjustment_iteration);
            self.socket.send_to(&bytes, addr)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::protocol::ClientBatchBuilder;

    #[test]
    fn bind_to_ephemeral_port_succeeds() {
        let server = Server::bind(0);
        assert!(server.is_ok());
    }

    #[test]
    fn bind_twice_to_same_explicit_port_fails() {
        let server = Server::bind(0).unwrap();
        let port = server.socket.local_addr().unwrap().port();
        let second = Server::bind(port);
        assert!(second.is_err());
    }

    fn server_with_peer() -> (Server, usize) {
        let mut server = Server::bind(0).unwrap();
        let addr: SocketAddr = "127.0.0.1:9".parse().unwrap();
        let peer_index = server.admit(addr).unwrap();
        (server, peer_index)
    }

    fn batch_at(network_tick: u64) -> Vec<u8> {
        ClientBatchBuilder::new().finish(network_tick, 0)
    }

    #[test]
    fn batch_inside_window_gets_zero_adjustment() {
        let (mut server, peer_index) = server_with_peer();
        server.network_tick = 10;
        let bytes = batch_at(11);
        server.handle_batch(peer_index, &bytes);
        assert_eq!(server.state.peers[peer_index].adjustment_amount, 0);
    }

    #[test]
    fn trailing_client_gets_negative_speedup_amount() {
        let (mut server, peer_index) = server_with_peer();
        server.network_tick = 10;
        // target window is [10, 11]; a client reporting tick 9 is trailing.
        let bytes = batch_at(9);
        server.handle_batch(peer_index, &bytes);
        assert!(server.state.peers[peer_index].adjustment_amount < 0);
    }

    #[test]
    fn leading_client_gets_positive_slowdown_amount() {
        let (mut server, peer_index) = server_with_peer();
        server.network_tick = 10;
        // far enough past the window's top (11) to trip the "too far ahead" branch.
        let bytes = batch_at(20);
        server.handle_batch(peer_index, &bytes);
        assert!(server.state.peers[peer_index].adjustment_amount > 0);
    }
}
