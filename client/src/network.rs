//! Client-side network layer: transport, the fixed-timestep scheduler with
//! its clock-adjustment hook, and the solo-connect session handshake.
//!
//! Like the server, this is a single non-blocking `UdpSocket` polled from a
//! single thread every frame — no tokio, no lock, no spawned task.

use crate::game::ClientState;
use crate::input::InputManager;
use crate::network_graph::NetworkGraph;
use crate::rendering::{RenderConfig, Renderer};
use log::{error, info, warn};
use macroquad::prelude::*;
use shared::protocol::{decode_server_batch, ClientBatchBuilder, ClientPacket, ServerPacket};
use shared::{
    Map, NetcodeError, CLIENT_OUTPUT_BUFFER_SIZE, FPS, INITIAL_SERVER_NETWORK_TICK_OFFSET,
    NET_PER_SIM_TICKS,
};
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::{Duration, Instant};

const HANDSHAKE_TIMEOUT: Duration = Duration::from_millis(500);
const HANDSHAKE_POLL_INTERVAL: Duration = Duration::from_millis(5);
const DISCONNECT_DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

/// The adjustment amount/iteration pair echoed back and forth with the
/// server, same shape as `server::peer::Peer`'s fields for the same purpose.
#[derive(Default, Clone, Copy)]
struct Adjustment {
    amount: i8,
    iteration: u8,
}

pub struct Client {
    socket: UdpSocket,
    server_addr: SocketAddr,
    state: ClientState,
    input: InputManager,
    renderer: Renderer,
    graph: NetworkGraph,

    simulation_tick: u64,
    network_tick: u64,
    adjustment: Adjustment,

    connected: bool,
    fake_ping_ms: u64,
}

impl Client {
    /// Resolves `server`, binds an ephemeral local socket and runs the
    /// solo-connect handshake to completion before returning.
    pub fn connect(server: &str, fake_ping_ms: u64) -> Result<Self, NetcodeError> {
        let server_addr = resolve(server)?;
        let socket = UdpSocket::bind("0.0.0.0:0").map_err(|source| NetcodeError::Bind {
            addr: "0.0.0.0:0".to_string(),
            source,
        })?;
        socket.set_nonblocking(true)?;

        let mut client = Client {
            socket,
            server_addr,
            state: ClientState::new(Map::default_arena()),
            input: InputManager::new(),
            renderer: Renderer::new(),
            graph: NetworkGraph::new(),
            simulation_tick: 0,
            network_tick: 0,
            adjustment: Adjustment::default(),
            connected: false,
            fake_ping_ms,
        };
        client.handshake()?;
        Ok(client)
    }

    /// Sends an empty batch to announce ourselves, then waits for the
    /// server's `CONNECTED` packet and seeds our clocks from it: a freshly
    /// connected client starts `INITIAL_SERVER_NETWORK_TICK_OFFSET` network
    /// ticks ahead of what the server reports, so its first real batch lands
    /// inside the server's acceptance window immediately.
    fn handshake(&mut self) -> Result<(), NetcodeError> {
        let handshake_bytes = ClientBatchBuilder::new().finish(0, 0);
        self.socket.send_to(&handshake_bytes, self.server_addr)?;

        let deadline = Instant::now() + HANDSHAKE_TIMEOUT;
        let mut buf = [0u8; 4096];
        while Instant::now() < deadline {
            match self.socket.recv_from(&mut buf) {
                Ok((len, from)) if from == self.server_addr => {
                    let (_, packets) = decode_server_batch(&buf[..len]);
                    for packet in packets {
                        if let ServerPacket::Connected {
                            player,
                            network_tick,
                            peer_index,
                        } = packet
                        {
                            self.network_tick = network_tick + INITIAL_SERVER_NETWORK_TICK_OFFSET;
                            self.simulation_tick = self.network_tick * NET_PER_SIM_TICKS;
                            self.state.local_peer_index = Some(peer_index as usize);
                            self.state.on_peer_connected(peer_index as usize, player);
                            self.connected = true;
                            info!(
                                "connected as peer {peer_index}, starting at network tick {}",
                                self.network_tick
                            );
                            return Ok(());
                        }
                    }
                }
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    std::thread::sleep(HANDSHAKE_POLL_INTERVAL);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(NetcodeError::ConnectionTimedOut)
    }

    /// Runs the fixed-timestep loop until the window closes or the local
    /// player requests to quit.
    pub async fn run(&mut self) -> Result<(), NetcodeError> {
        let frame_desired = Duration::from_secs_f64(1.0 / FPS as f64);

        loop {
            if is_quit_requested() {
                self.disconnect();
                return Ok(());
            }

            let frame_start = Instant::now();

            if self.apply_stall_hook() {
                self.render();
                next_frame().await;
                continue;
            }

            let run_network_tick = self.simulation_tick % NET_PER_SIM_TICKS == 0;

            if run_network_tick {
                self.drain_network();
            }

            if is_key_pressed(KeyCode::G) {
                self.graph.toggle_visibility();
            }

            let input = self.input.capture();
            if input.quit {
                self.disconnect();
                return Ok(());
            }

            self.state.predict(self.simulation_tick, input);

            if run_network_tick {
                let mut batch = ClientBatchBuilder::new();
                batch.push(&ClientPacket::Update {
                    simulation_tick: self.simulation_tick,
                    input,
                });
                assert!(
                    batch.len() < CLIENT_OUTPUT_BUFFER_SIZE,
                    "client outbound batch overflow"
                );
                let bytes = batch.finish(self.network_tick, self.adjustment.iteration);
                if self.fake_ping_ms > 0 {
                    std::thread::sleep(Duration::from_millis(self.fake_ping_ms));
                }
                self.socket.send_to(&bytes, self.server_addr)?;
            }

            self.graph.record(self.adjustment.amount);
            self.render();

            // Negative amount: the server says we're behind, so this tick
            // skips the end-of-frame sleep instead (a speedup) and nudges
            // the outstanding adjustment back toward zero.
            if self.adjustment.amount < 0 {
                self.adjustment.amount += 1;
            } else {
                let elapsed = frame_start.elapsed();
                if elapsed < frame_desired {
                    std::thread::sleep(frame_desired - elapsed);
                }
            }

            if run_network_tick {
                self.network_tick += 1;
            }
            self.simulation_tick += 1;

            next_frame().await;
        }
    }

    /// Clock-adjustment hook: if the server last told us we're
    /// running ahead, burn one network-tick's worth of wall time without
    /// advancing simulation or sending anything, consuming one unit of the
    /// outstanding adjustment. Returns true on a stalled tick.
    fn apply_stall_hook(&mut self) -> bool {
        if self.adjustment.amount > 0 {
            std::thread::sleep(Duration::from_secs_f64(
                NET_PER_SIM_TICKS as f64 / FPS as f64,
            ));
            self.adjustment.amount -= 1;
            true
        } else {
            false
        }
    }

    fn drain_network(&mut self) {
        let mut buf = [0u8; 4096];
        loop {
            match self.socket.recv_from(&mut buf) {
                Ok((len, from)) if from == self.server_addr => self.handle_batch(&buf[..len]),
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    error!("client socket error: {e}");
                    break;
                }
            }
        }
    }

    fn handle_batch(&mut self, bytes: &[u8]) {
        let (header, packets) = decode_server_batch(bytes);
        if header.adjustment_iteration == self.adjustment.iteration {
            self.adjustment.amount = header.adjustment_amount;
            self.adjustment.iteration = self.adjustment.iteration.wrapping_add(1);
        }

        for packet in packets {
            match packet {
                ServerPacket::Connected { .. } => {
                    warn!("received CONNECTED after the handshake completed, ignoring");
                }
                ServerPacket::PeerConnected { player, peer_index } => {
                    self.state.on_peer_connected(peer_index as usize, player);
                }
                ServerPacket::Dropped => {
                    info!("server dropped our last batch as outside the valid tick window");
                }
                ServerPacket::Auth {
                    player,
                    simulation_tick,
                } => {
                    self.state.reconcile(simulation_tick, player);
                }
                ServerPacket::PeerAuth {
                    player, peer_index, ..
                } => {
                    self.state.apply_peer_auth(peer_index as usize, player);
                }
                ServerPacket::PeerDisconnected { peer_index } => {
                    self.state.on_peer_disconnected(peer_index as usize);
                }
            }
        }
    }

    fn render(&mut self) {
        let config = RenderConfig {
            local_peer_index: self.state.local_peer_index,
            connected: self.connected,
            adjustment_amount: self.adjustment.amount,
        };
        self.renderer
            .render(&self.state.game.map, &self.state.game.players, &config);
        self.graph.render();
    }

    /// Sends the empty-datagram disconnect signal the server treats as a
    /// graceful close, then drains any in-flight replies for a bounded time
    /// before returning.
    fn disconnect(&mut self) {
        let _ = self.socket.send_to(&[], self.server_addr);
        let deadline = Instant::now() + DISCONNECT_DRAIN_TIMEOUT;
        let mut buf = [0u8; 64];
        while Instant::now() < deadline {
            match self.socket.recv_from(&mut buf) {
                Ok(_) => continue,
                Err(_) => break,
            }
        }
    }
}

fn resolve(addr: &str) -> Result<SocketAddr, NetcodeError> {
    if let Ok(direct) = addr.parse() {
        return Ok(direct);
    }
    addr.to_socket_addrs()
        .map_err(|source| NetcodeError::Connect {
            addr: addr.to_string(),
            source,
        })?
        .next()
        .ok_or_else(|| NetcodeError::UnresolvedAddress(addr.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_accepts_ip_and_port() {
        let addr = resolve("127.0.0.1:9000").unwrap();
        assert_eq!(addr.port(), 9000);
    }

    #[test]
    fn resolve_accepts_localhost_hostname() {
        let addr = resolve("localhost:9000").unwrap();
        assert_eq!(addr.port(), 9000);
    }

    #[test]
    fn resolve_rejects_garbage() {
        assert!(resolve("not-an-address").is_err());
    }
}
