use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use badgepress::{
    BadgeCompositor, BadgeConfig, BulkSession, DirSink, DispatchReporter, FsImageSource,
    HttpImageSource, ImageSource, Roster, SingleSession, build_fontdb, describe_attempt,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "badgepress", version)]
struct Cli {
    /// Configuration JSON. `BADGEPRESS_*` environment variables override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one attendee's badge.
    Render(RenderArgs),
    /// Render every attendee in the roster, optionally dispatching the batch.
    Bulk(BulkArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Roster JSON (`{ event, issuer?, attendees[] }`).
    #[arg(long)]
    roster: PathBuf,

    /// Attendee id.
    #[arg(long)]
    attendee: String,

    /// Output directory.
    #[arg(long)]
    out_dir: PathBuf,

    /// Print the layer layout as JSON.
    #[arg(long)]
    layout: bool,

    /// Also send the badge through the dispatch API.
    #[arg(long)]
    send: bool,
}

#[derive(Parser, Debug)]
struct BulkArgs {
    /// Roster JSON (`{ event, issuer?, attendees[] }`).
    #[arg(long)]
    roster: PathBuf,

    /// Output directory.
    #[arg(long)]
    out_dir: PathBuf,

    /// Dispatch the batch once every badge is generated.
    #[arg(long)]
    send: bool,

    /// Override the configured concurrency.
    #[arg(long)]
    max_in_flight: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = load_config(cli.config.as_deref())?;
    match cli.cmd {
        Command::Render(args) => cmd_render(&cfg, args).await,
        Command::Bulk(args) => cmd_bulk(&cfg, args).await,
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<BadgeConfig> {
    let mut cfg = match path {
        Some(p) => BadgeConfig::from_json_file(p)
            .with_context(|| format!("load config '{}'", p.display()))?,
        None => BadgeConfig::default(),
    };
    cfg.apply_env_overrides()?;
    cfg.validate()?;
    Ok(cfg)
}

fn read_roster(path: &Path) -> anyhow::Result<Roster> {
    let f = File::open(path).with_context(|| format!("open roster '{}'", path.display()))?;
    let roster: Roster =
        serde_json::from_reader(BufReader::new(f)).with_context(|| "parse roster JSON")?;
    roster.validate()?;
    Ok(roster)
}

fn make_compositor(cfg: &BadgeConfig) -> anyhow::Result<BadgeCompositor> {
    let images: Arc<dyn ImageSource> = match &cfg.assets_root {
        Some(root) => Arc::new(FsImageSource::new(root)),
        None => Arc::new(HttpImageSource::new(cfg.fetch_timeout())?.with_origin(&cfg.origin)),
    };
    let fontdb = build_fontdb(cfg.fonts_dir.as_deref());
    Ok(BadgeCompositor::new(cfg.compositor_opts(), images, fontdb)?)
}

fn make_reporter(cfg: &BadgeConfig) -> anyhow::Result<DispatchReporter> {
    Ok(DispatchReporter::new(
        cfg.dispatch_base_url(),
        cfg.dispatch_timeout(),
    )?)
}

async fn cmd_render(cfg: &BadgeConfig, args: RenderArgs) -> anyhow::Result<()> {
    let roster = read_roster(&args.roster)?;
    let attendee = roster
        .attendee(&args.attendee)
        .cloned()
        .with_context(|| format!("attendee '{}' is not in the roster", args.attendee))?;
    let compositor = make_compositor(cfg)?;

    let session = SingleSession::start(&compositor, attendee, roster.event, roster.issuer);
    let Some(artifact) = session.wait_ready().await else {
        anyhow::bail!(
            "badge was not generated: {}",
            session.failure().unwrap_or_else(|| "run abandoned".to_owned())
        );
    };
    for slot in artifact.skipped() {
        eprintln!("warning: {slot:?} layer skipped");
    }

    let path = session.save(&args.out_dir)?;
    eprintln!("wrote {}", path.display());

    if args.layout {
        println!("{}", serde_json::to_string_pretty(artifact.layout())?);
    }

    if args.send {
        let result = session.send(&make_reporter(cfg)?).await;
        eprintln!("{}", describe_attempt(&result));
        let report = result?;
        for f in &report.failed {
            eprintln!("failed: {} <{}>: {}", f.id, f.email, f.error);
        }
    }
    Ok(())
}

async fn cmd_bulk(cfg: &BadgeConfig, args: BulkArgs) -> anyhow::Result<()> {
    let roster = read_roster(&args.roster)?;
    let compositor = make_compositor(cfg)?;
    let max_in_flight = args.max_in_flight.unwrap_or(cfg.max_in_flight);

    let mut session = BulkSession::new(roster.event, roster.issuer, roster.attendees)?;
    let progress = session.generate(&compositor, max_in_flight).await?;
    eprintln!(
        "generated {} of {} badge(s)",
        progress.generated, progress.total
    );
    if !progress.is_complete() {
        for (id, reason) in session.generation_failures() {
            eprintln!("failed: {id}: {reason}");
        }
        anyhow::bail!("{} badge(s) could not be generated", progress.failed);
    }

    let mut sink = DirSink::new(&args.out_dir);
    session.export(&mut sink)?;
    eprintln!("wrote {} file(s) to {}", sink.written().len(), sink.dir().display());

    if args.send {
        let result = session.dispatch(&make_reporter(cfg)?).await;
        eprintln!("{}", describe_attempt(&result));
        let report = result?;
        for f in &report.failed {
            eprintln!("failed: {} <{}>: {}", f.id, f.email, f.error);
        }
    }
    Ok(())
}
