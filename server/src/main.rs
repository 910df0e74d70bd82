use clap::Parser;
use log::error;
use server::network::Server;

/// Authoritative game server.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Port to listen on
    port: u16,
}

fn main() {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("RUST_LOG not set; set RUST_LOG=info for server logs");
    }

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            e.print().ok();
            std::process::exit(1);
        }
    };

    let mut server = match Server::bind(args.port) {
        Ok(server) => server,
        Err(e) => {
            error!("failed to start server: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        error!("server exited with error: {e}");
        std::process::exit(1);
    }
}
