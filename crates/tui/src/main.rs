mod raster;
mod renderer;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result, bail};
use clap::Parser;
use heap_replay_core::{ReplayConfig, ReplaySession, svg::render_svg, views::CommandSurface};
use ratatui::layout::Rect;

#[derive(Parser)]
#[command(name = "heap-replay")]
#[command(author, version, about = "Replay priority-queue heap operations step by step", long_about = None)]
struct Cli {
    /// Engine payload: a dashboard snapshot, an operation response, or a bare step list
    snapshot: PathBuf,

    /// Config file (defaults to the per-user config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Playback speed multiplier
    #[arg(short, long)]
    speed: Option<f64>,

    /// Light palette
    #[arg(long)]
    light: bool,

    /// Start paused on the initial frame
    #[arg(long)]
    paused: bool,

    /// Write logs to this file while the terminal UI runs
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Render every frame as SVG into this directory instead of opening the UI
    #[arg(long, value_name = "DIR")]
    export_svg: Option<PathBuf>,

    /// SVG width in pixels
    #[arg(long, default_value_t = 960.0)]
    width: f64,

    /// SVG height in pixels
    #[arg(long, default_value_t = 640.0)]
    height: f64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli)?;

    let mut config = match &cli.config {
        Some(path) => {
            if !path.exists() {
                bail!("config file {} does not exist", path.display());
            }
            ReplayConfig::load_from(path)
        }
        None => ReplayConfig::load(),
    }
    .context("loading configuration")?;
    if let Some(speed) = cli.speed {
        config.playback.speed = speed;
    }
    if cli.light {
        config.view.dark = false;
    }
    if cli.paused {
        config.playback.autoplay = false;
    }
    config.validate().context("invalid configuration")?;

    if let Some(dir) = &cli.export_svg {
        return export_svg(&cli, config, dir);
    }

    let mut app = renderer::App::new(config, Some(cli.snapshot.clone()));
    let (width, height) = crossterm::terminal::size().context("querying terminal size")?;
    app.relayout(Rect::new(0, 0, width, height));
    app.reload()?;
    renderer::run(&mut app)
}

fn init_tracing(cli: &Cli) -> Result<()> {
    let filter = || -> Result<tracing_subscriber::EnvFilter> {
        Ok(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("heap_replay=info".parse()?))
    };
    if cli.export_svg.is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(filter()?)
            .with_writer(std::io::stderr)
            .init();
    } else if let Some(path) = &cli.log_file {
        // The terminal belongs to the UI; logs go to the file only.
        let file = File::create(path)
            .with_context(|| format!("creating log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter()?)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }
    Ok(())
}

fn export_svg(cli: &Cli, config: ReplayConfig, dir: &Path) -> Result<()> {
    let data = std::fs::read(&cli.snapshot)
        .with_context(|| format!("reading {}", cli.snapshot.display()))?;
    let dark = config.view.dark;
    let mut session = ReplaySession::new(CommandSurface::pixels(cli.width, cli.height), config);
    session
        .load_bytes(&data)
        .with_context(|| format!("parsing {}", cli.snapshot.display()))?;

    let total = session.frames().len();
    if total == 0 {
        bail!("{} contains no steps to replay", cli.snapshot.display());
    }
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    for i in 0..total {
        session.seek(i);
        let (width, height) = session.surface().extent();
        let svg = render_svg(&session.surface().commands(), width, height, dark);
        let path = dir.join(format!("frame-{i:03}.svg"));
        std::fs::write(&path, svg).with_context(|| format!("writing {}", path.display()))?;
    }
    tracing::info!(frames = total, dir = %dir.display(), "exported frames");
    Ok(())
}
