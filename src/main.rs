use anyhow::Result;
use bit_history::HistoryFormat;
use bit_history::areas::repository::Repository;
use bit_history::artifacts::branch::ref_name::RefName;
use bit_history::artifacts::branch::{DEFAULT_LOCAL_REF, DEFAULT_REMOTE_REF};
use bit_history::artifacts::core::write_paged;
use bit_history::artifacts::history::format::{DEFAULT_DATE_FORMAT, DateDisplay, parse_utc_offset};
use bit_history::artifacts::history::reconcile::{HeadRefs, ReconcileOptions};
use bit_history::commands::porcelain::log::{LogOptions, load_history, write_history};
use bit_history::commands::porcelain::watch::{DEFAULT_POLL_INTERVAL_MS, WatchOptions, watch};
use chrono::{FixedOffset, Offset};
use clap::{Args, Parser, Subcommand};
use is_terminal::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "bit-history",
    version = "0.1.0",
    author = "Sami Barbut-Dica",
    about = "Show the history of a local branch reconciled with its remote-tracking branch",
    long_about = "Walks the commits reachable from a local branch tip and from its \
    remote-tracking counterpart, and lists them once each, newest first, \
    marking which commit each head points at.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
",
)]
struct Cli {
    #[arg(short, long, global = true, help = "Only report errors")]
    quiet: bool,
    #[arg(
        short,
        long,
        global = true,
        conflicts_with = "quiet",
        help = "Report debug diagnostics"
    )]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct HeadArgs {
    #[arg(
        index = 1,
        default_value = ".",
        help = "Work tree or git directory of the repository"
    )]
    path: PathBuf,
    #[arg(
        long,
        env = "BIT_HISTORY_LOCAL_REF",
        default_value = DEFAULT_LOCAL_REF,
        help = "Local branch tip"
    )]
    local: RefName,
    #[arg(
        long,
        env = "BIT_HISTORY_REMOTE_REF",
        default_value = DEFAULT_REMOTE_REF,
        help = "Remote-tracking counterpart of the local branch"
    )]
    remote: RefName,
}

impl HeadArgs {
    fn heads(&self) -> HeadRefs {
        HeadRefs::new(self.local.clone(), self.remote.clone())
    }
}

#[derive(Args, Debug, Clone)]
struct DisplayArgs {
    #[arg(short = 'n', long = "max-count", help = "Show at most this many commits")]
    max_count: Option<usize>,
    #[arg(long, help = "Shorthand for --format oneline")]
    oneline: bool,
    #[arg(long, value_enum, default_value_t = HistoryFormat::Table, help = "Output format")]
    format: HistoryFormat,
    #[arg(
        long,
        value_parser = parse_utc_offset,
        conflicts_with = "utc",
        help = "Show dates at this UTC offset (±HH:MM) instead of local time"
    )]
    timezone: Option<FixedOffset>,
    #[arg(long, help = "Show dates in UTC")]
    utc: bool,
    #[arg(
        long,
        env = "BIT_HISTORY_DATE_FORMAT",
        default_value = DEFAULT_DATE_FORMAT,
        help = "strftime-style date format"
    )]
    date_format: String,
}

impl DisplayArgs {
    fn log_options(&self, heads: &HeadArgs) -> Result<LogOptions> {
        let format = if self.oneline {
            HistoryFormat::Oneline
        } else {
            self.format
        };

        let offset = match (self.timezone, self.utc) {
            (Some(offset), _) => offset,
            (None, true) => chrono::Utc.fix(),
            (None, false) => DateDisplay::local().offset(),
        };

        Ok(LogOptions::new(
            ReconcileOptions::new(heads.heads(), self.max_count),
            format,
            DateDisplay::try_new(self.date_format.clone(), offset)?,
        ))
    }
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "log",
        about = "Show the reconciled history",
        long_about = "This command lists every commit reachable from the local or the remote head, \
        children before parents, and marks the commits the heads point at."
    )]
    Log {
        #[command(flatten)]
        heads: HeadArgs,
        #[command(flatten)]
        display: DisplayArgs,
    },
    #[command(
        name = "heads",
        about = "Show what the local and remote heads resolve to"
    )]
    Heads {
        #[command(flatten)]
        heads: HeadArgs,
    },
    #[command(
        name = "watch",
        about = "Show the history and show it again whenever a head moves",
        long_about = "This command prints the reconciled history, then polls both heads and \
        prints the history again each time one of them moves. Stop it with Ctrl-C."
    )]
    Watch {
        #[command(flatten)]
        heads: HeadArgs,
        #[command(flatten)]
        display: DisplayArgs,
        #[arg(
            long,
            default_value_t = DEFAULT_POLL_INTERVAL_MS,
            help = "Milliseconds between two polls of the heads"
        )]
        interval_ms: u64,
    },
}

fn init_tracing(quiet: bool, verbose: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.quiet, cli.verbose);
    if !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    match &cli.command {
        Commands::Log { heads, display } => {
            let options = display.log_options(heads)?;
            let history = load_history(&heads.path, &options.reconcile).await?;

            write_paged(|writer| write_history(&history, &options, writer))?
        }
        Commands::Heads { heads } => {
            let repository = Repository::open(&heads.path)?;

            write_paged(|writer| repository.heads(&heads.heads(), writer))?
        }
        Commands::Watch {
            heads,
            display,
            interval_ms,
        } => {
            let options = WatchOptions::new(
                display.log_options(heads)?,
                Duration::from_millis((*interval_ms).max(1)),
            );
            let stdout = std::io::stdout();

            watch(&heads.path, &options, &mut stdout.lock()).await?
        }
    }

    Ok(())
}
