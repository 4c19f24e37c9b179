use clap::Parser;
use log::info;
use server::bridge::SimulationBridge;
use server::registry::SessionRegistry;
use shared::MessageQueue;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "60000")]
    port: u16,

    /// Simulation ticks per second
    #[arg(short, long, default_value_t = shared::TICK_RATE)]
    tick_rate: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let incoming = Arc::new(MessageQueue::new());
    let registry = Arc::new(SessionRegistry::new(Arc::clone(&incoming)));

    let listener = TcpListener::bind((args.host.as_str(), args.port)).await?;
    info!("Server listening on {}:{}", args.host, args.port);
    tokio::spawn(Arc::clone(&registry).accept_loop(listener));

    // The simulation gets its own thread; it talks to the I/O side only
    // through the registry and the incoming queue.
    let bridge = SimulationBridge::new(registry, incoming, args.tick_rate);
    let _simulation = std::thread::spawn(move || bridge.run());
    info!("Simulation running at {} ticks/s", args.tick_rate);

    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl+C, shutting down");

    Ok(())
}
