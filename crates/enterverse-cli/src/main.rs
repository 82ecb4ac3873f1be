mod format;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use enterverse_api::MediaType;
use enterverse_core::config::AppConfig;
use enterverse_runtime::{
    open_trailer, DetailOutcome, DetailRequest, Runtime, RuntimeError, TrailerAction,
};

#[derive(Parser)]
#[command(name = "enterverse", version, about = "Films, books and games in one catalog")]
struct Cli {
    /// Print JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search one catalog. An empty query lists popular entries.
    Search {
        media_type: MediaType,
        #[arg(default_value = "")]
        query: String,
        /// Number of pages to fetch.
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Show the full details of one entry.
    Detail { media_type: MediaType, id: String },
    /// Open a film's trailer in the browser.
    Trailer {
        id: String,
        /// Print the link instead of opening it.
        #[arg(long)]
        print: bool,
    },
    /// Manage favorites.
    #[command(subcommand)]
    Favorites(FavoritesCommand),
    /// Show the signed-in user's profile.
    Profile,
    /// First page of every catalog.
    Home,
    /// Show the active configuration.
    Config {
        /// Print the config file location only.
        #[arg(long)]
        path: bool,
    },
}

#[derive(Subcommand)]
enum FavoritesCommand {
    List,
    Add { media_type: MediaType, id: String },
    Remove {
        id: String,
        /// Only remove the entry of this type.
        #[arg(long = "type")]
        media_type: Option<MediaType>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };

    let _log_guard = match enterverse_runtime::logging::init_logging(
        &AppConfig::data_dir(),
        Some(&config.general.log_level),
    ) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("warning: file logging disabled: {e}");
            None
        }
    };

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("error: {e}");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli, config: AppConfig) -> Result<(), RuntimeError> {
    match cli.command {
        // Needs no database.
        Command::Config { path } => show_config(&config, path),
        command => run_with_runtime(command, &Runtime::open(config)?, cli.json).await,
    }
}

async fn run_with_runtime(
    command: Command,
    runtime: &Runtime,
    json: bool,
) -> Result<(), RuntimeError> {
    match command {
        Command::Search {
            media_type,
            query,
            pages,
        } => {
            let snapshot = runtime.browse(media_type, &query, pages.max(1)).await?;
            if json {
                print_json(&snapshot.items)?;
            } else {
                for item in &snapshot.unique_items {
                    println!("{}", format::item_line(item, &[]));
                }
                if snapshot.duplicate_count > 0 {
                    eprintln!("({} repeated entries hidden)", snapshot.duplicate_count);
                }
                if let Some(ref err) = snapshot.last_error {
                    eprintln!("(stopped early: {err})");
                } else if !snapshot.exhausted {
                    eprintln!("(more available with --pages {})", pages.max(1) + 1);
                }
            }
        }
        Command::Detail { media_type, id } => {
            let model = load_detail(runtime, DetailRequest::new(id, media_type)).await?;
            if json {
                print_json(&model)?;
            } else {
                let favorite = runtime
                    .favorites()
                    .is_member(model.id.clone(), Some(media_type))
                    .await?;
                println!("{}", format::detail_block(&model, favorite));
            }
        }
        Command::Trailer { id, print } => {
            let model = load_detail(runtime, DetailRequest::new(id, MediaType::Movie)).await?;
            match open_trailer(model.trailer_video_id()) {
                TrailerAction::Open(url) if print => println!("{url}"),
                TrailerAction::Open(url) => {
                    tracing::info!(%url, "Opening trailer");
                    open::that(url.as_str())
                        .map_err(|e| RuntimeError::Api(format!("failed to open browser: {e}")))?;
                }
                TrailerAction::NotAvailable => println!("Trailer not available."),
            }
        }
        Command::Favorites(cmd) => run_favorites(runtime, cmd, json).await?,
        Command::Profile => {
            let profile = runtime.profile().await?;
            if json {
                print_json(&profile)?;
            } else {
                println!("{} <{}>", profile.display_name(), profile.email);
            }
        }
        Command::Home => {
            let feed = runtime.home_feed().await;
            let sections = [
                ("Popular films", &feed.movies),
                ("Books", &feed.books),
                ("Games", &feed.games),
            ];
            for (heading, section) in sections {
                println!("== {heading} ==");
                if let Some(ref err) = section.error {
                    println!("  unavailable: {err}");
                }
                for item in section.items.iter().take(10) {
                    println!("  {}", format::item_line(item, &feed.movie_genres(item)));
                }
            }
        }
        Command::Config { path } => show_config(&runtime.get_config().await, path)?,
    }
    Ok(())
}

async fn run_favorites(
    runtime: &Runtime,
    cmd: FavoritesCommand,
    json: bool,
) -> Result<(), RuntimeError> {
    let favorites = runtime.favorites();
    let outcome = match cmd {
        FavoritesCommand::List => {
            let all = favorites.all().await?;
            if json {
                print_json(&all)?;
            } else if all.is_empty() {
                println!("No favorites yet.");
            } else {
                for record in &all {
                    println!("{}", format::favorite_line(record));
                }
            }
            return Ok(());
        }
        FavoritesCommand::Add { media_type, id } => {
            let model = load_detail(runtime, DetailRequest::new(id, media_type)).await?;
            favorites.add(model).await?
        }
        FavoritesCommand::Remove { id, media_type } => favorites.remove(id, media_type).await?,
    };

    if let Some(err) = outcome.error {
        eprintln!("warning: favorites not saved: {err}");
    }
    println!(
        "{} ({} favorites)",
        if outcome.changed { "Updated" } else { "No change" },
        outcome.favorites.len()
    );
    Ok(())
}

async fn load_detail(
    runtime: &Runtime,
    request: DetailRequest,
) -> Result<enterverse_api::DetailModel, RuntimeError> {
    match runtime.detail(&request).await {
        DetailOutcome::Ready(model) => Ok(model),
        DetailOutcome::Unavailable { reason } => Err(RuntimeError::NotFound(format!(
            "{} {} details unavailable: {reason}",
            request.media_type, request.id
        ))),
    }
}

fn show_config(config: &AppConfig, path_only: bool) -> Result<(), RuntimeError> {
    if path_only {
        println!("{}", AppConfig::config_path().display());
        return Ok(());
    }
    let rendered =
        toml::to_string_pretty(config).map_err(|e| RuntimeError::Config(e.to_string()))?;
    println!("# {}", AppConfig::config_path().display());
    println!("{rendered}");
    Ok(())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), RuntimeError> {
    let out = serde_json::to_string_pretty(value).map_err(|e| RuntimeError::Api(e.to_string()))?;
    println!("{out}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_search() {
        let cli = Cli::try_parse_from(["enterverse", "search", "film", "dune", "--pages", "2"]).unwrap();
        let Command::Search {
            media_type,
            query,
            pages,
        } = cli.command
        else {
            panic!("expected search");
        };
        assert_eq!(media_type, MediaType::Movie);
        assert_eq!(query, "dune");
        assert_eq!(pages, 2);
    }

    #[test]
    fn test_parse_favorites_remove_with_type() {
        let cli =
            Cli::try_parse_from(["enterverse", "--json", "favorites", "remove", "42", "--type", "game"])
                .unwrap();
        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Command::Favorites(FavoritesCommand::Remove {
                media_type: Some(MediaType::Game),
                ..
            })
        ));
    }
}
