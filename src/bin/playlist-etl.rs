use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use playlist_etl::{Credentials, Extractor, LocalBlobStore, SpotifyApi, Transformer};
use tracing::{info, warn};

/// Playlist extracted when none is given.
const DEFAULT_PLAYLIST: &str = "https://open.spotify.com/playlist/34NbomaTu7YuOYnky8nLXL";

#[derive(Parser)]
#[command(name = "playlist-etl")]
#[command(about = "Spotify playlist ETL: extract raw JSON, transform to CSV tables", long_about = None)]
struct Cli {
    /// Directory used as the blob store bucket
    #[arg(long, env = "ETL_STORE_ROOT", default_value = "bucket")]
    store_root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a playlist and store it as a pending raw batch
    Extract {
        /// Spotify client ID
        #[arg(long, env = "SPOTIFY_CLIENT_ID")]
        client_id: String,

        /// Spotify client secret
        #[arg(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
        client_secret: String,

        /// Playlist URL, URI or ID
        #[arg(long, env = "PLAYLIST_LINK", default_value = DEFAULT_PLAYLIST)]
        playlist: String,
    },
    /// Transform every pending raw batch into CSV tables and archive it
    Transform,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let store = Arc::new(LocalBlobStore::new(&cli.store_root));
    info!("Using store at {}", store.root().display());

    match cli.command {
        Commands::Extract {
            client_id,
            client_secret,
            playlist,
        } => {
            let api = SpotifyApi::new(Credentials::new(client_id, client_secret))?;
            let result = Extractor::new(Arc::new(api), store).run(&playlist).await?;
            println!(
                "Extracted {} items from playlist {} to {}",
                result.item_count, result.playlist_id, result.key
            );
        }
        Commands::Transform => {
            let result = Transformer::new(store).run().await?;
            println!(
                "Archived {}/{} batches",
                result.processed.len(),
                result.total()
            );
            for batch in &result.processed {
                println!(
                    "   {} -> {} albums, {} artists, {} songs",
                    batch.source_key, batch.albums, batch.artists, batch.songs
                );
                if batch.dangling_refs > 0 {
                    warn!(
                        "{} has {} songs with unresolved album/artist references",
                        batch.source_key, batch.dangling_refs
                    );
                }
            }

            if !result.all_successful() {
                println!("   Failed batches:");
                for failed in &result.failed {
                    println!("   - {} ({:?}): {}", failed.key, failed.stage, failed.error);
                }
                return Err(format!("{} batches failed", result.failed.len()).into());
            }
        }
    }

    Ok(())
}
