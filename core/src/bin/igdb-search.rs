//! Search IGDB games from the command line, following scroll pages.
//!
//! Usage: `cargo run -p igdb-core --features cli --bin igdb-search -- <term> [max-pages]`
//! with `IGDB_BASE_URL` and `IGDB_API_KEY` set.

use anyhow::{bail, Context};
use igdb_core::{Game, IgdbClient, IgdbConfig, IgdbError, ParameterBuilder};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_MAX_PAGES: usize = 5;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let mut args = std::env::args().skip(1);
    let Some(term) = args.next() else {
        bail!("usage: igdb-search <term> [max-pages]");
    };
    let max_pages = match args.next() {
        Some(raw) => raw
            .parse::<usize>()
            .with_context(|| format!("invalid max-pages `{raw}`"))?,
        None => DEFAULT_MAX_PAGES,
    };

    let config = IgdbConfig::from_env().context("loading IGDB configuration")?;
    let client = IgdbClient::from_config(config).context("building IGDB client")?;

    let params = ParameterBuilder::new()
        .fields("name,slug,cover")
        .enable_scroll();
    let mut page = client
        .search(&term, "games", params)
        .context("searching games")?;

    match client.scroll_count(&page) {
        Ok(total) => info!(%term, total, "search matched"),
        Err(err) => warn!(error = %err, "no result count in response"),
    }

    for number in 1..=max_pages {
        for game in page.items::<Game>().context("decoding games")? {
            let cover = game.cover_url("t_thumb").unwrap_or_default();
            println!("{}\t{}\t{}", game.slug, game.name, cover);
        }
        if number == max_pages {
            break;
        }
        page = match client.scroll(&page) {
            Ok(next) => next,
            Err(IgdbError::ScrollHeaderNotFound { .. }) => break,
            Err(err) => return Err(err).context("fetching next page"),
        };
    }

    Ok(())
}

/// Log to stderr so stdout stays machine-readable.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
