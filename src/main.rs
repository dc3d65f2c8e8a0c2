use clap::Parser;
use log::{error, info, warn};
use starglow::config::{self, OutputFormat};
use starglow::demo::{self, ScriptedCamera};
use starglow::overlay::OverlaySession;
use starglow::renderer::{JsonLinesSink, LogSink, RenderSink};
use std::io::{self, BufWriter};
use tokio::sync::mpsc;
use tokio::time::{self, Duration, Instant};

/// starglow - Camera-synchronized star field and glow for globe map views
#[derive(Parser, Debug)]
#[command(name = "starglow", version, about)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "~/.config/starglow/starglow.toml")]
    config: String,

    /// Run in verbose mode
    #[arg(short, long)]
    verbose: bool,

    /// Write frames as JSON lines to stdout instead of logging summaries
    #[arg(long)]
    json: bool,

    /// Override the number of stars
    #[arg(short, long)]
    stars: Option<usize>,

    /// Override the preview length in seconds (0 = until Ctrl+C)
    #[arg(short, long)]
    duration: Option<u64>,

    /// Override the frame rate
    #[arg(long)]
    fps: Option<u32>,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    info!("starglow v{} starting", env!("CARGO_PKG_VERSION"));

    // Load config
    let config_path = shellexpand(&cli.config);
    let mut cfg = match config::Config::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to load config from {}: {}", config_path, e);
            info!("Using default configuration");
            config::Config::default()
        }
    };

    if let Some(count) = cli.stars {
        cfg.stars.count = count;
    }
    if let Some(secs) = cli.duration {
        cfg.general.duration_secs = secs;
    }
    if let Some(fps) = cli.fps {
        cfg.general.fps = fps;
    }
    if cli.json {
        cfg.general.output = OutputFormat::Json;
    }

    // Everything runs on one thread: host events, twinkle timers and frames
    let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = rt.block_on(run_preview(cfg)) {
        error!("Preview stopped: {}", e);
        std::process::exit(1);
    }

    info!("starglow shutting down");
}

/// Attach an overlay to the scripted camera and render frames until done
async fn run_preview(cfg: config::Config) -> io::Result<()> {
    let fps = cfg.general.fps.max(1);
    let camera = ScriptedCamera::new(cfg.demo.clone());

    let mut session = OverlaySession::attach(
        &camera,
        cfg.visual(),
        cfg.stars.motion,
        cfg.viewport.stars,
        cfg.viewport.glow,
    );

    let mut sink: Box<dyn RenderSink> = match cfg.general.output {
        OutputFormat::Log => Box::new(LogSink::new(fps as u64)),
        OutputFormat::Json => Box::new(JsonLinesSink::new(BufWriter::new(io::stdout()))),
    };

    // Channel: scripted camera -> overlay session
    let (event_tx, mut event_rx) = mpsc::channel(64);
    let feed = tokio::spawn(demo::run_feed(
        camera,
        cfg.viewport,
        cfg.glow.intensity,
        fps,
        event_tx,
    ));

    let deadline = match cfg.general.duration_secs {
        0 => None,
        secs => Some(Instant::now() + Duration::from_secs(secs)),
    };
    let mut frames = time::interval(Duration::from_secs_f64(1.0 / fps as f64));

    info!(
        "Preview: {} stars at {} fps{}. Press Ctrl+C to exit.",
        cfg.stars.count,
        fps,
        match cfg.general.duration_secs {
            0 => String::new(),
            secs => format!(" for {}s", secs),
        }
    );

    let result = loop {
        tokio::select! {
            Some(event) = event_rx.recv() => session.handle(event),
            _ = frames.tick() => {
                let now = Instant::now();
                if let Err(e) = session.render(sink.as_mut(), now) {
                    break Err(e);
                }
                if deadline.is_some_and(|d| now >= d) {
                    break Ok(());
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break Ok(());
            }
        }
    };

    feed.abort();
    info!(
        "Final state: {} stars, glow r={} opacity={:.2}",
        session.field().len(),
        session.glow().radius,
        session.glow().opacity
    );
    drop(session);
    result
}

/// Expand ~ to home directory in paths
fn shellexpand(path: &str) -> String {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Ok(home) = std::env::var("HOME")
    {
        return format!("{}/{}", home, stripped);
    }
    path.to_string()
}
