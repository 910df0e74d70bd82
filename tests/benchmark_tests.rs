//! Performance benchmarks for the hot paths that run every simulation tick:
//! collision resolution, the player step function, and packet encoding.
//! These aren't criterion-grade statistical benchmarks, just coarse
//! wall-clock budgets that catch an accidental O(n^2) or allocation-per-call
//! regression before it ships.

use shared::collision::{collide_aabb_circle, Aabb, Circle};
use shared::game::{step, Game, Input, Player};
use shared::protocol::{ClientBatchBuilder, ClientPacket, ServerBatchBuilder, ServerPacket};
use shared::Vec2;
use std::time::Instant;

/// AABB-vs-circle is called up to eight times per player per tick (one per
/// surrounding tile); it needs to be cheap.
#[test]
fn benchmark_collision_detection() {
    let tile = Aabb {
        pos: Vec2::new(0.0, 0.0),
        width: 1.0,
        height: 1.0,
    };
    let circle = Circle {
        pos: Vec2::new(0.9, 0.9),
        radius: 0.25,
    };

    let iterations = 100_000;
    let start = Instant::now();
    for _ in 0..iterations {
        let _ = collide_aabb_circle(tile, circle);
    }
    let duration = start.elapsed();

    println!(
        "collide_aabb_circle: {iterations} iterations in {duration:?} ({:.2} ns/iter)",
        duration.as_nanos() as f64 / iterations as f64
    );
    assert!(duration.as_millis() < 100);
}

/// The whole per-player step, including the eight-tile collision sweep.
/// With `MAX_CLIENTS` players this runs up to 128 times per simulation tick,
/// which itself must complete well inside the 16.67ms frame budget.
#[test]
fn benchmark_player_step() {
    let game = Game::default();
    let mut player = Player::spawn();
    let input = Input {
        move_right: true,
        ..Input::default()
    };

    let iterations = 100_000;
    let start = Instant::now();
    for _ in 0..iterations {
        step(&game.map, &mut player, &input, shared::DT_NOMINAL, false);
    }
    let duration = start.elapsed();

    println!(
        "game::step: {iterations} iterations in {duration:?} ({:.2} ns/iter)",
        duration.as_nanos() as f64 / iterations as f64
    );
    assert!(duration.as_millis() < 200);
}

/// A full tick's worth of players stepping at once, approximating a server
/// at the `MAX_CLIENTS` population cap.
#[test]
fn benchmark_full_population_tick() {
    let game = Game::default();
    let mut players = [Player::spawn(); shared::MAX_CLIENTS];
    let input = Input::default();

    let iterations: u32 = 1_000;
    let start = Instant::now();
    for _ in 0..iterations {
        for player in players.iter_mut() {
            step(&game.map, player, &input, shared::DT_NOMINAL, false);
        }
    }
    let duration = start.elapsed();
    let per_tick = duration / iterations;

    println!(
        "full {}-player tick: {iterations} ticks in {duration:?} ({per_tick:?}/tick)",
        shared::MAX_CLIENTS
    );
    assert!(per_tick.as_millis() < 16, "a full tick must fit in one frame budget");
}

/// Batch encode/decode happens twice per peer per network tick; it must stay
/// cheap even with a full player population's worth of AUTH packets.
#[test]
fn benchmark_server_batch_encoding() {
    let player = Player::spawn();

    let iterations = 10_000;
    let start = Instant::now();
    for _ in 0..iterations {
        let mut builder = ServerBatchBuilder::new();
        for peer_index in 0..shared::MAX_CLIENTS {
            builder.push(&ServerPacket::PeerAuth {
                player,
                simulation_tick: 1_000,
                peer_index: peer_index as u8,
            });
        }
        let bytes = builder.finish(0, 0);
        let _ = shared::protocol::decode_server_batch(&bytes);
    }
    let duration = start.elapsed();

    println!(
        "server batch encode+decode ({} packets): {iterations} iterations in {duration:?}",
        shared::MAX_CLIENTS
    );
    assert!(duration.as_millis() < 500);
}

/// A single client's outgoing `UPDATE` batch: this one runs on every network
/// tick on the client's main thread, so it must not show up as jank.
#[test]
fn benchmark_client_batch_encoding() {
    let input = Input {
        move_right: true,
        dodge: true,
        ..Input::default()
    };

    let iterations: u64 = 100_000;
    let start = Instant::now();
    for tick in 0..iterations {
        let mut builder = ClientBatchBuilder::new();
        builder.push(&ClientPacket::Update {
            simulation_tick: tick,
            input,
        });
        let bytes = builder.finish(tick / 2, 0);
        let _ = shared::protocol::decode_client_batch(&bytes);
    }
    let duration = start.elapsed();

    println!(
        "client batch encode+decode: {iterations} iterations in {duration:?} ({:.2} ns/iter)",
        duration.as_nanos() as f64 / iterations as f64
    );
    assert!(duration.as_millis() < 500);
}
