use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use marquee::app::{run_shell, Browser, Command, Route};
use marquee::config::Config;
use marquee::models::Category;
use marquee::tmdb::{parse_tmdb_id, TmdbApi, TmdbClient};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "marquee")]
#[command(about = "Browse TMDB movie lists and detail pages from the terminal", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Popular, top rated, upcoming and now playing rows
    Home,
    /// One category of movies
    List {
        category: Category,
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// Detail page for a TMDB movie id
    Movie { id: String },
    /// Interactive browser (default)
    Browse {
        /// Route to open first, e.g. `movie 550`
        #[arg(num_args = 0..)]
        start: Vec<String>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("marquee=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let dotenv_result = dotenv();
    init_tracing();
    match dotenv_result {
        Ok(path) => info!("Loaded environment from {:?}", path),
        Err(e) => warn!("No .env file loaded ({}) - relying on environment", e),
    }

    let args = Args::parse();
    let config = Config::from_env();
    let image_base = config.image_base.clone();
    let tmdb: Arc<dyn TmdbApi> = Arc::new(TmdbClient::new(config)?);
    let mut browser = Browser::new(tmdb, image_base);

    let route = match args.command.unwrap_or(Cmd::Browse { start: vec![] }) {
        Cmd::Home => Route::Home,
        Cmd::List { category, page } => Route::List {
            category,
            page: page.max(1),
        },
        Cmd::Movie { id } => {
            let id = parse_tmdb_id(&id).with_context(|| format!("'{}' is not a TMDB movie id", id))?;
            Route::Movie(id)
        }
        Cmd::Browse { start } => {
            let start = if start.is_empty() {
                Route::Home
            } else {
                match start.join(" ").parse::<Command>()? {
                    Command::Go(route) => route,
                    other => anyhow::bail!("cannot start the browser with {:?}", other),
                }
            };
            run_shell(browser, start).await?;
            return Ok(ExitCode::SUCCESS);
        }
    };

    browser.navigate(route);
    browser.settle().await;
    print!("{}", browser.render());
    if browser.shows_failure() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
