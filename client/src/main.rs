//! Client application entry point.

mod game;
mod input;
mod network;
mod network_graph;
mod rendering;

use clap::Parser;
use log::{error, info};
use macroquad::prelude::*;

/// Command-line arguments for client configuration.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to connect to
    ip: String,

    /// Server port to connect to
    port: u16,

    /// Artificial latency in milliseconds, for netcode testing
    #[arg(short = 'l', long, default_value_t = 0)]
    fake_ping: u64,
}

fn window_conf() -> Conf {
    Conf {
        window_title: "Netcode in Rust - Client".to_owned(),
        window_width: 960,
        window_height: 720,
        window_resizable: true,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            e.print().ok();
            std::process::exit(1);
        }
    };

    let server = format!("{}:{}", args.ip, args.port);
    info!("connecting to {server}");
    if args.fake_ping > 0 {
        info!("simulating {}ms of additional latency", args.fake_ping);
    }
    info!("move: WASD, dodge: Shift/Space, shoot: left click, quit: Escape");
    info!("press G to toggle the network graph");

    let mut client = match network::Client::connect(&server, args.fake_ping) {
        Ok(client) => client,
        Err(e) => {
            error!("failed to connect to {server}: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = client.run().await {
        error!("client exited with error: {e}");
        std::process::exit(1);
    }
}
