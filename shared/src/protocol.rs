//! Binary batched packet protocol.
//!
//! The codec is append-only writes of fixed-layout records into a linear
//! byte buffer; decoding is a pointer advance. Every batch begins with a
//! header that is back-patched with the final packet count and (server to
//! client) the adjustment fields, once the whole batch is known.
//!
//! Deliberately not `serde`/`bincode`: every field is written individually
//! via explicit little-endian conversions, so the layout is exactly what
//! this file says it is and does not depend on a derive macro's choices or
//! on `#[repr(packed)]` field-reference soundness.

use crate::game::{Input, Player, PlayerState};
use crate::vec2::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ServerPacketType {
    Connected = 0,
    PeerConnected = 1,
    Dropped = 2,
    Auth = 3,
    PeerAuth = 4,
    PeerDisconnected = 5,
}

impl ServerPacketType {
    fn from_u32(v: u32) -> Option<Self> {
        match v {
            0 => Some(Self::Connected),
            1 => Some(Self::PeerConnected),
            2 => Some(Self::Dropped),
            3 => Some(Self::Auth),
            4 => Some(Self::PeerAuth),
            5 => Some(Self::PeerDisconnected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ClientPacketType {
    Update = 0,
}

impl ClientPacketType {
    fn from_u32(v: u32) -> Option<Self> {
        match v {
            0 => Some(Self::Update),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ServerBatchHeader {
    pub num_packets: u16,
    pub adjustment_amount: i8,
    pub adjustment_iteration: u8,
}

pub const SERVER_BATCH_HEADER_SIZE: usize = 2 + 1 + 1;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClientBatchHeader {
    pub network_tick: u64,
    pub num_packets: u16,
    pub adjustment_iteration: u8,
}

pub const CLIENT_BATCH_HEADER_SIZE: usize = 8 + 2 + 1;

#[derive(Debug, Clone, PartialEq)]
pub enum ServerPacket {
    Connected {
        player: Player,
        network_tick: u64,
        peer_index: u8,
    },
    PeerConnected {
        player: Player,
        peer_index: u8,
    },
    Dropped,
    Auth {
        player: Player,
        simulation_tick: u64,
    },
    PeerAuth {
        player: Player,
        simulation_tick: u64,
        peer_index: u8,
    },
    PeerDisconnected {
        peer_index: u8,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClientPacket {
    Update { simulation_tick: u64, input: Input },
}

fn write_player(buf: &mut Vec<u8>, player: &Player) {
    buf.push(player.occupied as u8);
    write_vec2(buf, player.pos);
    write_vec2(buf, player.velocity);
    write_vec2(buf, player.dodge);
    write_vec2(buf, player.look);
    buf.extend_from_slice(&player.time_left_in_dodge.to_le_bytes());
    buf.extend_from_slice(&player.time_left_in_dodge_delay.to_le_bytes());
    buf.extend_from_slice(&player.time_left_in_shoot_delay.to_le_bytes());
    buf.extend_from_slice(&player.hue.to_le_bytes());
    buf.extend_from_slice(&player.health.to_le_bytes());
    buf.push(match player.state {
        PlayerState::Default => 0,
        PlayerState::Sliding => 1,
    });
}

fn write_vec2(buf: &mut Vec<u8>, v: Vec2) {
    buf.extend_from_slice(&v.x.to_le_bytes());
    buf.extend_from_slice(&v.y.to_le_bytes());
}

fn write_input(buf: &mut Vec<u8>, input: &Input) {
    write_vec2(buf, input.aim);
    buf.push(input.move_up as u8);
    buf.push(input.move_down as u8);
    buf.push(input.move_left as u8);
    buf.push(input.move_right as u8);
    buf.push(input.dodge as u8);
    buf.push(input.shoot as u8);
    buf.push(input.quit as u8);
}

/// A cursor over a received byte slice. Every `read_*` call panics on
/// truncated input — a truncated packet from a reliable transport is a
/// protocol bug, not a recoverable condition.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Reader { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> &'a [u8] {
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        slice
    }

    fn u8(&mut self) -> u8 {
        self.take(1)[0]
    }

    fn i8(&mut self) -> i8 {
        self.u8() as i8
    }

    fn bool(&mut self) -> bool {
        self.u8() != 0
    }

    fn u16(&mut self) -> u16 {
        u16::from_le_bytes(self.take(2).try_into().unwrap())
    }

    fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.take(4).try_into().unwrap())
    }

    fn u64(&mut self) -> u64 {
        u64::from_le_bytes(self.take(8).try_into().unwrap())
    }

    fn f32(&mut self) -> f32 {
        f32::from_le_bytes(self.take(4).try_into().unwrap())
    }

    fn vec2(&mut self) -> Vec2 {
        Vec2::new(self.f32(), self.f32())
    }

    fn player(&mut self) -> Player {
        let occupied = self.bool();
        let pos = self.vec2();
        let velocity = self.vec2();
        let dodge = self.vec2();
        let look = self.vec2();
        let time_left_in_dodge = self.f32();
        let time_left_in_dodge_delay = self.f32();
        let time_left_in_shoot_delay = self.f32();
        let hue = self.f32();
        let health = self.f32();
        let state = if self.u8() == 1 {
            PlayerState::Sliding
        } else {
            PlayerState::Default
        };
        Player {
            occupied,
            pos,
            velocity,
            dodge,
            look,
            time_left_in_dodge,
            time_left_in_dodge_delay,
            time_left_in_shoot_delay,
            hue,
            health,
            state,
        }
    }

    fn input(&mut self) -> Input {
        Input {
            aim: self.vec2(),
            move_up: self.bool(),
            move_down: self.bool(),
            move_left: self.bool(),
            move_right: self.bool(),
            dodge: self.bool(),
            shoot: self.bool(),
            quit: self.bool(),
        }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }
}

/// Builds one outgoing server batch: a placeholder header, followed by
/// appended packets, finished by back-patching the header in place.
pub struct ServerBatchBuilder {
    buf: Vec<u8>,
    num_packets: u16,
}

impl ServerBatchBuilder {
    pub fn new() -> Self {
        let mut buf = Vec::with_capacity(256);
        buf.resize(SERVER_BATCH_HEADER_SIZE, 0);
        ServerBatchBuilder { buf, num_packets: 0 }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_packets == 0
    }

    fn push_header(&mut self, ty: ServerPacketType) {
        assert!(
            self.num_packets < u16::MAX,
            "server batch packet count overflow"
        );
        self.buf
            .extend_from_slice(&(ty as u32).to_le_bytes());
        self.num_packets += 1;
    }

    pub fn push(&mut self, packet: &ServerPacket) {
        match packet {
            ServerPacket::Connected {
                player,
                network_tick,
                peer_index,
            } => {
                self.push_header(ServerPacketType::Connected);
                write_player(&mut self.buf, player);
                self.buf.extend_from_slice(&network_tick.to_le_bytes());
                self.buf.push(*peer_index);
            }
            ServerPacket::PeerConnected { player, peer_index } => {
                self.push_header(ServerPacketType::PeerConnected);
                write_player(&mut self.buf, player);
                self.buf.push(*peer_index);
            }
            ServerPacket::Dropped => {
                self.push_header(ServerPacketType::Dropped);
            }
            ServerPacket::Auth {
                player,
                simulation_tick,
            } => {
                self.push_header(ServerPacketType::Auth);
                write_player(&mut self.buf, player);
                self.buf.extend_from_slice(&simulation_tick.to_le_bytes());
            }
            ServerPacket::PeerAuth {
                player,
                simulation_tick,
                peer_index,
            } => {
                self.push_header(ServerPacketType::PeerAuth);
                write_player(&mut self.buf, player);
                self.buf.extend_from_slice(&simulation_tick.to_le_bytes());
                self.buf.push(*peer_index);
            }
            ServerPacket::PeerDisconnected { peer_index } => {
                self.push_header(ServerPacketType::PeerDisconnected);
                self.buf.push(*peer_index);
            }
        }
    }

    /// Back-patches the header with the final packet count and adjustment
    /// fields, and returns the finished batch bytes.
    pub fn finish(mut self, adjustment_amount: i8, adjustment_iteration: u8) -> Vec<u8> {
        self.buf[0..2].copy_from_slice(&self.num_packets.to_le_bytes());
        self.buf[2] = adjustment_amount as u8;
        self.buf[3] = adjustment_iteration;
        self.buf
    }
}

impl Default for ServerBatchBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds one outgoing client batch, back-patched the same way.
pub struct ClientBatchBuilder {
    buf: Vec<u8>,
    num_packets: u16,
}

impl ClientBatchBuilder {
    pub fn new() -> Self {
        let mut buf = Vec::with_capacity(64);
        buf.resize(CLIENT_BATCH_HEADER_SIZE, 0);
        ClientBatchBuilder { buf, num_packets: 0 }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_packets == 0
    }

    pub fn push(&mut self, packet: &ClientPacket) {
        assert!(
            self.num_packets < u16::MAX,
            "client batch packet count overflow"
        );
        match packet {
            ClientPacket::Update {
                simulation_tick,
                input,
            } => {
                self.buf
                    .extend_from_slice(&(ClientPacketType::Update as u32).to_le_bytes());
                self.buf.extend_from_slice(&simulation_tick.to_le_bytes());
                write_input(&mut self.buf, input);
            }
        }
        self.num_packets += 1;
    }

    pub fn finish(mut self, network_tick: u64, adjustment_iteration: u8) -> Vec<u8> {
        self.buf[0..8].copy_from_slice(&network_tick.to_le_bytes());
        self.buf[8..10].copy_from_slice(&self.num_packets.to_le_bytes());
        self.buf[10] = adjustment_iteration;
        self.buf
    }
}

impl Default for ClientBatchBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn decode_server_batch(bytes: &[u8]) -> (ServerBatchHeader, Vec<ServerPacket>) {
    let mut reader = Reader::new(bytes);
    let header = ServerBatchHeader {
        num_packets: reader.u16(),
        adjustment_amount: reader.i8(),
        adjustment_iteration: reader.u8(),
    };

    let mut packets = Vec::with_capacity(header.num_packets as usize);
    for _ in 0..header.num_packets {
        let ty = ServerPacketType::from_u32(reader.u32());
        let packet = match ty {
            Some(ServerPacketType::Connected) => ServerPacket::Connected {
                player: reader.player(),
                network_tick: reader.u64(),
                peer_index: reader.u8(),
            },
            Some(ServerPacketType::PeerConnected) => ServerPacket::PeerConnected {
                player: reader.player(),
                peer_index: reader.u8(),
            },
            Some(ServerPacketType::Dropped) => ServerPacket::Dropped,
            Some(ServerPacketType::Auth) => ServerPacket::Auth {
                player: reader.player(),
                simulation_tick: reader.u64(),
            },
            Some(ServerPacketType::PeerAuth) => ServerPacket::PeerAuth {
                player: reader.player(),
                simulation_tick: reader.u64(),
                peer_index: reader.u8(),
            },
            Some(ServerPacketType::PeerDisconnected) => ServerPacket::PeerDisconnected {
                peer_index: reader.u8(),
            },
            None => {
                log::warn!("received unknown server packet type, skipping rest of batch");
                break;
            }
        };
        packets.push(packet);
    }
    debug_assert_eq!(reader.remaining(), 0);

    (header, packets)
}

pub fn decode_client_batch(bytes: &[u8]) -> (ClientBatchHeader, Vec<ClientPacket>) {
    let mut reader = Reader::new(bytes);
    let header = ClientBatchHeader {
        network_tick: reader.u64(),
        num_packets: reader.u16(),
        adjustment_iteration: reader.u8(),
    };

    let mut packets = Vec::with_capacity(header.num_packets as usize);
    for _ in 0..header.num_packets {
        let ty = ClientPacketType::from_u32(reader.u32());
        let packet = match ty {
            Some(ClientPacketType::Update) => ClientPacket::Update {
                simulation_tick: reader.u64(),
                input: reader.input(),
            },
            None => {
                log::warn!("received unknown client packet type, skipping rest of batch");
                break;
            }
        };
        packets.push(packet);
    }
    debug_assert_eq!(reader.remaining(), 0);

    (header, packets)
}
