use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context as _;
use clap::Parser;
use tokio::{
    io::{AsyncBufReadExt as _, BufReader},
    sync::mpsc,
};

use murale::{
    DisplayMode, EngineConfig, FsByteSource, HostEvent, HostLink, MuraleResult, Surface,
    SurfacePlan, TransitionKind, WallpaperEngine, run_bridge,
};

/// Interactive driver for the wallpaper engine: feeds host events from stdin
/// and logs every surface plan the engine produces.
#[derive(Parser, Debug)]
#[command(name = "murale", version)]
struct Cli {
    /// Initial display mode.
    #[arg(long, default_value = "fill")]
    mode: String,

    /// Initial transition kind.
    #[arg(long, default_value = "fade")]
    transition: String,

    /// Guard timeout in milliseconds.
    #[arg(long, default_value_t = 1400)]
    guard_ms: u64,

    /// Wallpaper to show on startup.
    image: Option<PathBuf>,
}

/// Logs plans instead of drawing them; frame ticks run at ~60 Hz.
struct TracingSurface;

impl Surface for TracingSurface {
    fn apply(&self, plan: &SurfacePlan) {
        tracing::info!(
            base = %describe(plan.base.source.as_deref()),
            top = %describe(plan.top.source.as_deref()),
            class = %plan.top.class,
            "surface"
        );
    }

    async fn next_frame(&self) {
        tokio::time::sleep(Duration::from_millis(16)).await;
    }
}

fn describe(source: Option<&str>) -> String {
    match source {
        None => "-".to_string(),
        Some(s) => format!("{}... ({} chars)", &s[..s.len().min(32)], s.len()),
    }
}

struct StdoutLink;

impl HostLink for StdoutLink {
    fn window_ready(&self) -> MuraleResult<()> {
        println!("ready");
        Ok(())
    }

    fn request_desktop_refresh(&self) {
        tracing::info!("desktop refresh requested");
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mode = DisplayMode::parse(&cli.mode).context("--mode")?;
    let kind = TransitionKind::parse(&cli.transition).context("--transition")?;

    let config = EngineConfig {
        guard_timeout: Duration::from_millis(cli.guard_ms),
        ..EngineConfig::default()
    };
    let engine = WallpaperEngine::with_config(FsByteSource, TracingSurface, config);
    engine.set_mode(mode);
    engine.set_transition(kind);

    let (tx, rx) = mpsc::channel(32);
    let bridge = tokio::spawn(run_bridge(Arc::clone(&engine), StdoutLink, rx));

    if let Some(image) = &cli.image {
        tx.send(HostEvent::UpdateImage(image.display().to_string()))
            .await?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (cmd, rest) = line.split_once(' ').unwrap_or((line, ""));
        let event = match cmd {
            "" => continue,
            "image" => HostEvent::UpdateImage(rest.to_string()),
            "mode" => match DisplayMode::parse(rest) {
                Ok(mode) => HostEvent::UpdateStyle(mode),
                Err(err) => {
                    eprintln!("{err}");
                    continue;
                }
            },
            "transition" => match TransitionKind::parse(rest) {
                Ok(kind) => HostEvent::UpdateTransition(kind),
                Err(err) => {
                    eprintln!("{err}");
                    continue;
                }
            },
            "end" => HostEvent::TransitionEnded {
                property: "opacity".to_string(),
            },
            "tap" => HostEvent::PointerDown,
            "snapshot" => {
                println!("{}", serde_json::to_string_pretty(&engine.snapshot())?);
                continue;
            }
            "quit" | "exit" => break,
            other => {
                eprintln!(
                    "unknown command '{other}' (image/mode/transition/end/tap/snapshot/quit)"
                );
                continue;
            }
        };
        tx.send(event).await?;
    }

    drop(tx);
    bridge.await?;
    Ok(())
}
