//! Interactive meshchat playground.
//!
//! Creates a room with you as its anchor and lets you add simulated peers
//! that join over an in-process network. Every peer keeps its own copy of
//! the message log and roster; the session ends after 15 minutes (by
//! default) without activity.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin meshchat-client -- --name Alice
//! cargo run --bin meshchat-client -- -n Bob --room room-demo --idle-minutes 2
//! ```

use clap::Parser;

use meshchat_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "meshchat-client")]
#[command(about = "Serverless peer-mesh chat playground", long_about = None)]
struct Args {
    /// Display name shown to other participants
    #[arg(short = 'n', long)]
    name: String,

    /// Room id to create (generated when omitted)
    #[arg(short = 'r', long)]
    room: Option<String>,

    /// Minutes without activity before the session expires
    #[arg(long, default_value_t = 15, value_parser = clap::value_parser!(u64).range(1..))]
    idle_minutes: u64,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    // Run the playground
    if let Err(e) = meshchat_client::run_client(args.name, args.room, args.idle_minutes).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
