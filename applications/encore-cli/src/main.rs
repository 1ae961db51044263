/// Encore CLI - preview shuffles and simulate listening sessions
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use encore_cli::{
    build_manager, load_queue, resolve_config, save_queue, shuffle_scope, simulate, CliSettings,
    JsonFileStore, JsonLibrary,
};
use encore_core::{load_catalog, KeyValueStore, PlaylistId};
use encore_playback::{Personality, ShuffleConfig};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "encore-cli")]
#[command(about = "Adaptive shuffle and play-queue engine", long_about = None)]
struct Cli {
    /// Configuration file path (default: ./encore.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Library JSON file, overrides the configured one
    #[arg(short, long, global = true, env = "ENCORE_LIBRARY")]
    library: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a freshly shuffled queue
    Shuffle {
        #[command(flatten)]
        scope: ScopeArgs,

        /// How many entries to print
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },
    /// Play a session headlessly and report on repeats
    Simulate {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Number of tracks to play
        #[arg(short, long, default_value_t = 50)]
        plays: usize,

        /// Continue the queue saved by the last simulation
        #[arg(long)]
        resume: bool,
    },
    /// List shuffle personalities
    Personalities,
}

#[derive(Args)]
struct ScopeArgs {
    /// Shuffle personality (default, explorer, consistent)
    #[arg(short = 'P', long)]
    personality: Option<Personality>,

    /// Restrict the shuffle to one playlist
    #[arg(long)]
    playlist: Option<String>,

    /// RNG seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = CliSettings::load(cli.config.as_deref())?;
    if let Some(library) = cli.library {
        settings.library_path = library;
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log_filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Shuffle { scope, limit } => shuffle(&settings, &scope, limit),
        Commands::Simulate {
            scope,
            plays,
            resume,
        } => run_simulation(&settings, &scope, plays, resume),
        Commands::Personalities => {
            list_personalities();
            Ok(())
        }
    }
}

fn open_store(settings: &CliSettings) -> anyhow::Result<Option<JsonFileStore>> {
    settings
        .state_path
        .as_ref()
        .map(|path| {
            JsonFileStore::open(path)
                .with_context(|| format!("Failed to open state file {}", path.display()))
        })
        .transpose()
}

fn prepare(
    settings: &CliSettings,
    scope: &ScopeArgs,
    store: Option<&dyn KeyValueStore>,
) -> anyhow::Result<(encore_core::Catalog, ShuffleConfig)> {
    let library = JsonLibrary::open(&settings.library_path).with_context(|| {
        format!(
            "Failed to read library {}",
            settings.library_path.display()
        )
    })?;
    let catalog = load_catalog(&library, &library)?;
    let config = resolve_config(settings, store, scope.personality)?;

    tracing::info!(
        "Loaded {} songs from {} ({} personality)",
        catalog.len(),
        library.path().display(),
        config.personality().label()
    );
    Ok((catalog, config))
}

fn shuffle(settings: &CliSettings, args: &ScopeArgs, limit: usize) -> anyhow::Result<()> {
    let store = open_store(settings)?;
    let store = store.as_ref().map(|s| s as &dyn KeyValueStore);
    let (catalog, config) = prepare(settings, args, store)?;

    let playlist = args.playlist.clone().map(PlaylistId::new);
    let (songs, is_restricted) = shuffle_scope(&catalog, playlist.as_ref())?;
    let mut manager = build_manager(settings, catalog, config, args.seed);
    manager
        .shuffle_and_play(&songs, is_restricted)
        .context("Nothing to shuffle")?;

    for (index, item) in manager.queue().items().iter().take(limit).enumerate() {
        let song = &item.song;
        let marker = if song.is_favorite { " *" } else { "" };
        println!(
            "{:>4}  {} - {} [{} plays]{}",
            index + 1,
            song.artist,
            song.title,
            song.play_count,
            marker
        );
    }
    if manager.queue().len() > limit {
        println!("      ... {} more", manager.queue().len() - limit);
    }
    Ok(())
}

fn run_simulation(
    settings: &CliSettings,
    args: &ScopeArgs,
    plays: usize,
    resume: bool,
) -> anyhow::Result<()> {
    let store = open_store(settings)?;
    let store = store.as_ref().map(|s| s as &dyn KeyValueStore);
    let (catalog, config) = prepare(settings, args, store)?;

    let saved = match (resume, store) {
        (true, Some(kv)) => load_queue(kv)?,
        (true, None) => anyhow::bail!("--resume needs state_path in the settings"),
        (false, _) => None,
    };

    let playlist = args.playlist.clone().map(PlaylistId::new);
    let (songs, is_restricted) = shuffle_scope(&catalog, playlist.as_ref())?;
    let manager = build_manager(settings, catalog.clone(), config, args.seed);
    let report = simulate(manager, &songs, is_restricted, plays.max(1), saved)?;

    for (step, id) in report.played.iter().enumerate() {
        let title = catalog.get(id).map_or("?", |song| song.title.as_str());
        println!("{:>4}  {}", step + 1, title);
    }
    println!();
    println!("Distinct songs:   {}", report.distinct);
    println!("Window:           {}", report.window);
    match report.min_gap {
        Some(gap) => println!("Closest repeat:   {gap} plays apart"),
        None => println!("Closest repeat:   none"),
    }
    println!("Early repeats:    {}", report.early_repeats);

    if let Some(kv) = store {
        save_queue(kv, &report.final_state)?;
    }
    Ok(())
}

fn list_personalities() {
    for personality in Personality::ALL {
        let bundle = personality.bundle();
        println!("{:<12} {}", personality.label(), personality.description());
        println!(
            "{:<12} least {:+} / most {:+} / playlists {:+}, favorites x{}, suggest-less x{}",
            "",
            bundle.least_played_weight,
            bundle.most_played_weight,
            bundle.playlist_songs_weight,
            bundle.favorite_multiplier,
            bundle.suggest_less_multiplier
        );
    }
}
