use std::{error::Error, path::Path, process, sync::Arc};

use clap::{command, Parser, ValueHint};
use log::{debug, error, info, warn, LevelFilter};

use djqueue::{
    api_key::ApiKey,
    config::{Config, Settings},
    context::Context,
    id::Link,
    playlist::Playlist,
    queue::MemoryQueue,
    song::Song,
};

/// Profile to display when not built in release mode.
#[cfg(debug_assertions)]
const BUILD_PROFILE: &str = "debug";
/// Profile to display when not built release mode.
#[cfg(not(debug_assertions))]
const BUILD_PROFILE: &str = "release";

/// Group name for mutually exclusive logging options.
const ARGS_GROUP_LOGGING: &str = "logging";

/// Settings file read when `--config` is not given.
const DEFAULT_CONFIG_FILE: &str = "djqueue.toml";

/// Command line arguments as parsed by `clap`.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Links to YouTube videos or playlists
    #[arg(required = true, value_name = "LINK", value_hint = ValueHint::Url)]
    links: Vec<String>,

    /// Settings file
    ///
    /// [default: djqueue.toml, if present]
    #[arg(short, long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    config: Option<String>,

    /// YouTube Data API key
    ///
    /// Keep this key private: requests made with it count against your
    /// quota.
    #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true)]
    api_key: ApiKey,

    /// Name to submit the links as
    #[arg(short, long, env = "USER", default_value = "djqueue")]
    user: String,

    /// Download every queued song into the cache
    #[arg(short, long, default_value_t = false)]
    download: bool,

    /// Delete expired songs from the cache before submitting
    #[arg(long, default_value_t = false)]
    prune: bool,

    /// Suppresses all output except warnings and errors.
    #[arg(short, long, default_value_t = false, group = ARGS_GROUP_LOGGING)]
    quiet: bool,

    /// Enable verbose logging
    ///
    /// Specify twice for trace logging.
    #[arg(short, long, action = clap::ArgAction::Count, group = ARGS_GROUP_LOGGING)]
    verbose: u8,
}

/// Initializes the logger facade.
///
/// The logging level is determined as follows, in order of precedence from
/// highest to lowest:
/// 1. Command line arguments
/// 2. `RUST_LOG` environment variable
/// 3. Hard coded default
///
/// # Panics
///
/// Panics when a logger facade is already initialized.
fn init_logger(config: &Args) {
    let mut logger = env_logger::Builder::from_env(
        // Note: if you change the default logging level here, then you should
        // probably also change the verbosity levels below.
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    if config.quiet || config.verbose > 0 {
        let level = match config.verbose {
            0 => {
                // Quiet and verbose are mutually exclusive, and `verbose` is 0
                // by default. So this arm means: quiet mode.
                LevelFilter::Warn
            }
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };

        // Filter log messages of external crates.
        logger.filter_module("djqueue", level);
    }

    logger.init();
}

/// Loads the settings file.
///
/// An explicitly given file must exist. Without one, `djqueue.toml` is read
/// if present and the defaults apply otherwise.
fn load_settings(file: Option<&str>) -> djqueue::error::Result<Settings> {
    match file {
        Some(file) => Settings::from_file(file),
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Settings::from_file(DEFAULT_CONFIG_FILE),
        None => {
            debug!("no {DEFAULT_CONFIG_FILE} found, using defaults");
            Ok(Settings::default())
        }
    }
}

/// Submits one link on behalf of `user`.
async fn submit(
    ctx: &Context,
    queue: &MemoryQueue,
    user: &str,
    link: &str,
) -> djqueue::error::Result<()> {
    match link.parse::<Link>()? {
        Link::Video(id) => {
            Song::new(ctx, queue, user, &id, None).await?;
        }
        Link::Playlist(id) => {
            let playlist = Playlist::new(ctx, queue, user, &id).await?;
            if playlist.accepted() == 0 {
                warn!("no songs of playlist \"{}\" could be queued", playlist.title());
            }
        }
    }

    Ok(())
}

/// Submits all links, then downloads the queue if asked to.
///
/// A failing link or download is logged and does not stop the others.
async fn fill(ctx: &Context, queue: &MemoryQueue, args: &Args) -> djqueue::error::Result<()> {
    for link in &args.links {
        if let Err(e) = submit(ctx, queue, &args.user, link).await {
            error!("{link}: {e}");
        }
    }

    if args.download {
        for song in queue.songs()? {
            if let Err(e) = song.download(ctx).await {
                error!("{song}: {e}");
            }
        }
    }

    Ok(())
}

/// Prints the queue to standard output.
fn print_queue(ctx: &Context, queue: &MemoryQueue) -> djqueue::error::Result<()> {
    let songs = queue.songs()?;
    if songs.is_empty() {
        info!("queue is empty");
        return Ok(());
    }

    for (position, song) in songs.iter().enumerate() {
        let announcement = song.announcement(ctx)?;
        println!("{:>3}. {announcement}", position + 1);
    }

    Ok(())
}

/// Main application flow.
///
/// # Errors
///
/// Returns error if the configuration is invalid or the queue cannot be
/// read. Failures of single submissions are logged instead.
async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let settings = load_settings(args.config.as_deref())?;
    let config = Config::new(args.api_key.clone(), settings)?;

    let ctx = Arc::new(Context::new(config)?);
    let queue = MemoryQueue::new(Arc::clone(&ctx));

    if args.prune {
        let deleted = ctx.cache().delete_expired().await?;
        info!("pruned {deleted} expired songs from cache");
    }

    tokio::select! {
        // Prioritize shutdown signals.
        biased;

        _ = tokio::signal::ctrl_c() => {
            info!("interrupted, shutting down");
        }

        result = fill(&ctx, &queue, &args) => result?,
    }

    print_queue(&ctx, &queue)?;

    let removed = queue.clear()?;
    debug!("cleared {removed} songs from queue");
    drop(queue);

    match Arc::try_unwrap(ctx) {
        Ok(ctx) => {
            let leaked = ctx.shutdown();
            if leaked > 0 {
                warn!("{leaked} playlist vote sets leaked");
            }
        }
        Err(_) => warn!("context still in use at shutdown"),
    }

    Ok(())
}

/// Main entry point of the application.
///
/// This function initializes the logger facade, parses the command line
/// arguments, and runs the application.
#[tokio::main]
async fn main() {
    // `clap` handles our command line arguments and help text.
    let args = Args::parse();
    init_logger(&args);

    // Dump command line arguments before we do anything more.
    // This aids in debugging of whatever comes next.
    debug!("Command {:#?}", args);

    let cmd = command!();
    let name = cmd.get_name().to_string();
    let version = cmd.get_version().unwrap_or("UNKNOWN").to_string();

    info!("starting {name}/{version}; {BUILD_PROFILE}");

    if let Err(e) = run(args).await {
        error!("{e}");
        process::exit(1);
    }
}
