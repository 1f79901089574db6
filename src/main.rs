/// ENS Attest - command line entry point
///
/// `lookup` resolves a single name; `watch` treats each stdin line as a change
/// of the search box and prints a report whenever the current session resolves.
use clap::{Parser, Subcommand};
use ens_attest::{
    config::AppConfig,
    context::AppContext,
    debounce::{DebounceState, SearchDebouncer},
    metrics,
    report::VerificationReport,
    session::{SessionId, SessionStatus},
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "ens-attest", version, about = "Check which ENS social handles are backed by verifiable credentials")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Print reports as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Print Prometheus metrics to stderr before exiting
    #[arg(long, global = true)]
    metrics: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve one name and print its report
    Lookup {
        /// Name to resolve (defaults to ATTEST_DEFAULT_NAME)
        name: Option<String>,
    },
    /// Read search input line by line from stdin
    Watch,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = AppConfig::from_env()?;

    // Initialize logging
    let filter = EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    let ctx = AppContext::new(config)?;

    match cli.command {
        Command::Lookup { name } => {
            let name = name.unwrap_or_else(|| ctx.config.search.default_name.clone());
            lookup(&ctx, &name, cli.json).await?;
        }
        Command::Watch => {
            print_banner();
            watch(&ctx, cli.json).await?;
        }
    }

    if cli.metrics {
        eprintln!("{}", metrics::render_metrics());
    }

    Ok(())
}

async fn lookup(ctx: &AppContext, name: &str, json: bool) -> anyhow::Result<()> {
    match ctx.coordinator.resolve(name).await? {
        Some(session) => print_report(&ctx.report(&session), json),
        None => anyhow::bail!("Session for {} was superseded", name),
    }
}

async fn watch(ctx: &AppContext, json: bool) -> anyhow::Result<()> {
    let (mut debouncer, mut commits) = SearchDebouncer::new(ctx.config.search.debounce);
    let mut updates = ctx.coordinator.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut input_closed = false;
    let mut last_printed: Option<SessionId> = None;

    loop {
        tokio::select! {
            line = lines.next_line(), if !input_closed => match line? {
                Some(line) => debouncer.input(&line),
                None => input_closed = true,
            },
            Some(name) = commits.recv() => {
                if let Err(e) = ctx.coordinator.begin(&name) {
                    warn!("Skipping search for {}: {}", name, e);
                }
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let session = updates.borrow_and_update().clone();
                if session.status == SessionStatus::Resolved && last_printed != Some(session.id) {
                    last_printed = Some(session.id);
                    print_report(&ctx.report(&session), json)?;
                }
            }
        }

        // After EOF, stay until the last committed search has been shown
        if input_closed
            && debouncer.state() == DebounceState::Idle
            && commits.is_empty()
            && ctx.coordinator.current().status != SessionStatus::Resolving
        {
            break;
        }
    }

    Ok(())
}

fn print_report(report: &VerificationReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{}\n", report);
    }
    Ok(())
}

fn print_banner() {
    eprintln!(
        "ENS Attest v{} - type a name per line, Ctrl-D to finish",
        env!("CARGO_PKG_VERSION")
    );
}
