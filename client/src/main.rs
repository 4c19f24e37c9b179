use clap::Parser;
use client::network::GameClient;
use log::info;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:60000")]
    server: String,

    /// Local frame rate for polling snapshots
    #[arg(short, long, default_value_t = shared::TICK_RATE)]
    frame_rate: u32,
}

/// Headless client: connects, polls snapshots at the frame rate and logs
/// them. A renderer and an input layer would replace the logging here.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    info!("Connecting to {}", args.server);
    let game_client = GameClient::connect(&args.server).await?;

    let mut frames = tokio::time::interval(Duration::from_secs_f64(1.0 / args.frame_rate as f64));
    while game_client.is_connected() {
        frames.tick().await;

        if let Some(snapshot) = game_client.latest_snapshot() {
            for player in snapshot.players.values() {
                info!(
                    "player {}: ({:.0}, {:.0}) angle {:.0} bullets {}",
                    player.id,
                    player.x,
                    player.y,
                    player.angle,
                    player.bullets.len()
                );
            }
        }
    }

    info!("Connection to server lost, exiting");
    Ok(())
}
