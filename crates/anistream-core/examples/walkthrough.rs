//! Walks a provider end to end: search, episodes, first episode's sources
//!
//! Usage: `cargo run --example walkthrough -- <hanime|yhdm> <query>`
//! Set `RUST_LOG=anistream_core=debug` to trace each heuristic.

use anistream_core::{ProviderKind, SearchOptions};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (Some(kind), Some(query)) = (args.first(), args.get(1)) else {
        eprintln!("usage: walkthrough <hanime|yhdm> <query>");
        std::process::exit(2);
    };

    let provider = kind.parse::<ProviderKind>()?.build()?;
    println!("Searching {} for '{}'...\n", provider.name(), query);

    let results = provider.search(&SearchOptions::query(query.as_str())).await?;
    println!("{}", serde_json::to_string_pretty(&results)?);

    let Some(first) = results.first() else {
        println!("No results");
        return Ok(());
    };

    let episodes = provider.find_episodes(&first.id).await?;
    println!("\n=== {} episodes of {} ===\n", episodes.len(), first.title);
    println!("{}", serde_json::to_string_pretty(&episodes)?);

    if let Some(episode) = episodes.first() {
        let server = provider.settings().episode_servers.first().cloned().unwrap_or_default();
        let resolved = provider.find_episode_server(episode, &server).await?;
        println!("\n=== Sources for episode {} ===\n", episode.number);
        println!("{}", serde_json::to_string_pretty(&resolved)?);
    }

    println!("\n{}", serde_json::to_string_pretty(&provider.info())?);
    Ok(())
}
