use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use logcount::{
    AnalysisConfig, CancellationToken, EncodingMode, FilterDocument, FilterSet, RunController,
    RunStatus,
};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

mod preferences;
mod report;

use preferences::Preferences;

const EXIT_FAILED: u8 = 1;
const EXIT_CANCELLED: u8 = 130;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Configuration file, layered over the global and local config files
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
struct CountArgs {
    /// Text or log file to analyse
    file: PathBuf,

    /// Literal filter to count (can be specified multiple times)
    #[arg(short = 'p', long = "pattern")]
    patterns: Vec<String>,

    /// Filter list to load; its filters come before any -p filters
    #[arg(short = 'f', long = "filters")]
    filter_file: Option<PathBuf>,

    /// Lines per batch
    #[arg(short = 'b', long)]
    buffer_size: Option<usize>,

    /// Number of counting threads
    #[arg(short = 'j', long)]
    threads: Option<NonZeroUsize>,

    /// How to handle invalid UTF-8 sequences (lossy|failfast)
    #[arg(long)]
    encoding: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Do not draw a progress bar
    #[arg(long)]
    no_progress: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Count filter occurrences in a file
    Count(Box<CountArgs>),

    /// Manage a saved filter list
    Filters {
        #[command(subcommand)]
        action: FilterAction,
    },
}

#[derive(Subcommand)]
enum FilterAction {
    /// Show the filters in a list
    List {
        /// Filter list file
        file: PathBuf,
    },

    /// Append filters to a list, creating it if needed
    Add {
        /// Filter list file
        file: PathBuf,

        /// Filters to append
        #[arg(required = true)]
        patterns: Vec<String>,
    },

    /// Remove filters by index; unknown indices are ignored
    Remove {
        /// Filter list file
        file: PathBuf,

        /// Zero-based positions, as shown by `list`
        #[arg(required = true)]
        indices: Vec<usize>,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = AnalysisConfig::load_from(cli.config.as_deref())
        .context("failed to load configuration")?;
    init_logging(cli.log_level.as_deref().unwrap_or(&config.log_level));

    let prefs_path = Preferences::default_path();
    let mut prefs = Preferences::load_or_default(prefs_path.as_deref());

    let code = match cli.command {
        Commands::Count(args) => count(*args, config, &mut prefs)?,
        Commands::Filters { action } => {
            manage_filters(action, &mut prefs)?;
            ExitCode::SUCCESS
        }
    };

    if let Some(path) = prefs_path {
        if let Err(e) = prefs.save(&path) {
            warn!("Could not save preferences: {:#}", e);
        }
    }
    Ok(code)
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_encoding(value: &str) -> Result<EncodingMode> {
    match value.to_lowercase().as_str() {
        "lossy" => Ok(EncodingMode::Lossy),
        "failfast" => Ok(EncodingMode::FailFast),
        other => bail!("unknown encoding mode {:?} (expected lossy or failfast)", other),
    }
}

/// Collects filters from `-f` then `-p`, falling back to the last used list
fn collect_filters(args: &CountArgs, prefs: &mut Preferences) -> Result<FilterSet> {
    let list = match &args.filter_file {
        Some(path) => Some(path.clone()),
        None if args.patterns.is_empty() => prefs.last_filter_file.clone().filter(|p| p.exists()),
        None => None,
    };

    let mut patterns = Vec::new();
    if let Some(path) = list {
        if args.filter_file.is_none() {
            eprintln!("Using last filter list {}", path.display());
        }
        let doc = FilterDocument::load(&path)
            .with_context(|| format!("failed to load filter list {}", path.display()))?;
        prefs.remember_filter_file(&path);
        patterns.extend(doc.filters);
    }
    patterns.extend(args.patterns.iter().cloned());

    FilterSet::from_patterns(patterns).context("invalid filter")
}

fn progress_bar(hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>3}%")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}

fn count(args: CountArgs, config: AnalysisConfig, prefs: &mut Preferences) -> Result<ExitCode> {
    let encoding = args.encoding.as_deref().map(parse_encoding).transpose()?;
    let config = config.merge_with_cli(args.buffer_size, args.threads, encoding, None);
    let filters = collect_filters(&args, prefs)?;
    let file = match prefs.fallback_for(&args.file) {
        Some(found) => {
            eprintln!("Using {} from the last opened directory", found.display());
            found
        }
        None => args.file.clone(),
    };

    let mut controller =
        RunController::with_filters(config, filters).context("failed to start analysis")?;

    let token = CancellationToken::new();
    let handler_token = token.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
        warn!("Ctrl-C handler unavailable: {}", e);
    }

    let bar = progress_bar(args.no_progress || args.json);
    let result = controller.run(
        &file,
        |pct| bar.set_position(u64::from(pct)),
        token.as_predicate(),
    );
    bar.finish_and_clear();
    debug!("Run ended: {}", result.status);

    if result.status != RunStatus::Failed || result.stats.lines_consumed > 0 {
        prefs.remember_file(&file);
    }

    match result.status {
        RunStatus::Completed => {
            if args.json {
                report::print_json(&file, &result)?;
            } else {
                report::print_counts(&file, &result);
            }
            Ok(ExitCode::SUCCESS)
        }
        RunStatus::Cancelled => {
            if args.json {
                report::print_json(&file, &result)?;
            }
            report::print_unfinished(&result);
            Ok(ExitCode::from(EXIT_CANCELLED))
        }
        _ => {
            if args.json {
                report::print_json(&file, &result)?;
            }
            report::print_unfinished(&result);
            Ok(ExitCode::from(EXIT_FAILED))
        }
    }
}

fn load_or_new(path: &Path) -> Result<FilterDocument> {
    if path.exists() {
        FilterDocument::load(path)
            .with_context(|| format!("failed to load filter list {}", path.display()))
    } else {
        Ok(FilterDocument::default())
    }
}

fn manage_filters(action: FilterAction, prefs: &mut Preferences) -> Result<()> {
    match action {
        FilterAction::List { file } => {
            let doc = FilterDocument::load(&file)
                .with_context(|| format!("failed to load filter list {}", file.display()))?;
            report::print_filter_list(&file, &doc);
        }
        FilterAction::Add { file, patterns } => {
            let mut set = load_or_new(&file)?.into_filter_set()?;
            for pattern in patterns {
                set.add(pattern).context("cannot add filter")?;
            }
            FilterDocument::from_filter_set(&set).save(&file)?;
            prefs.remember_filter_file(&file);
            println!("{} ({} filters)", "added filter".green(), set.len());
        }
        FilterAction::Remove { file, indices } => {
            let mut set = FilterDocument::load(&file)
                .with_context(|| format!("failed to load filter list {}", file.display()))?
                .into_filter_set()?;
            let before = set.len();
            set.remove_at(indices);
            FilterDocument::from_filter_set(&set).save(&file)?;
            prefs.remember_filter_file(&file);
            println!("removed {} filters ({} left)", before - set.len(), set.len());
        }
    }
    Ok(())
}
