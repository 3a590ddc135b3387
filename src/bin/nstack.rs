use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Parser;
use nstack::common::config::{Config, config_file};
use nstack::common::geometry::Rect;
use nstack::common::log;
use nstack::layout_engine::{EventResponse, LayoutEngine};
use nstack::model::{Desktop, Window, WindowId, WorkspaceId};
use serde::Serialize;
use tracing::{debug, warn};

/// Tile a simulated monitor and print where every window ends up.
#[derive(Parser)]
#[command(name = "nstack")]
struct Cli {
    /// Configuration file. Defaults to ~/.nstack.toml, then the bundled defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Monitor size as WIDTHxHEIGHT.
    #[arg(long, default_value = "1920x1080", value_parser = parse_size)]
    monitor: (f64, f64),

    /// Number of windows to open.
    #[arg(long, default_value_t = 3)]
    windows: usize,

    /// Layout message sent to the focused window, e.g. "setstackcount +1".
    /// May be repeated; messages run in order.
    #[arg(long = "command", short = 'c')]
    commands: Vec<String>,

    /// Resize of the focused window as DX,DY, applied after the commands.
    #[arg(long = "resize", value_parser = parse_delta, allow_hyphen_values = true)]
    resizes: Vec<(f64, f64)>,

    /// Print the layout as a tree instead of JSON.
    #[arg(long)]
    tree: bool,

    /// Only check the configuration and report problems.
    #[arg(long)]
    validate: bool,
}

fn parse_pair(raw: &str, sep: char) -> Result<(f64, f64), String> {
    let (a, b) = raw.split_once(sep).ok_or_else(|| format!("expected A{sep}B, got {raw:?}"))?;
    let a = a.trim().parse().map_err(|e| format!("{a:?}: {e}"))?;
    let b = b.trim().parse().map_err(|e| format!("{b:?}: {e}"))?;
    Ok((a, b))
}

fn parse_size(raw: &str) -> Result<(f64, f64), String> { parse_pair(raw, 'x') }

fn parse_delta(raw: &str) -> Result<(f64, f64), String> { parse_pair(raw, ',') }

#[derive(Serialize)]
struct PlacedWindow {
    index: usize,
    master: bool,
    stack: usize,
    focused: bool,
    frame: Rect,
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    match path.or_else(|| config_file().filter(|p| p.exists())) {
        Some(path) => Config::read(&path),
        None => Config::bundled(),
    }
}

/// Applies `response` and feeds fullscreen transitions back to the engine,
/// the way a host would.
fn settle(engine: &mut LayoutEngine, desktop: &mut Desktop, response: EventResponse) {
    let fullscreen: Vec<WindowId> = response.fullscreen_changes.iter().map(|&(w, _)| w).collect();
    response.apply_to(desktop);
    for window in fullscreen {
        let follow_up = engine.fullscreen_changed(desktop, window);
        follow_up.apply_to(desktop);
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    log::init_logging();

    let mut config = load_config(cli.config).context("loading configuration")?;
    let issues = config.validate();
    if cli.validate {
        for issue in &issues {
            println!("{issue}");
        }
        if !issues.is_empty() {
            bail!("{} configuration problem(s)", issues.len());
        }
        return Ok(());
    }
    if !issues.is_empty() {
        let fixed = config.auto_fix_values();
        warn!(?issues, fixed, "configuration problems");
    }

    let workspace = WorkspaceId(1);
    let (width, height) = cli.monitor;
    let (mut desktop, monitor) =
        Desktop::single_monitor(Rect::new(0.0, 0.0, width, height), workspace);
    let mut engine = LayoutEngine::new(config);

    let mut windows = Vec::with_capacity(cli.windows);
    for _ in 0..cli.windows {
        let id = desktop.add_window(Window::new(workspace));
        match engine.add_window(&desktop, id) {
            Ok(response) => settle(&mut engine, &mut desktop, response),
            Err(err) => warn!(%err, "window left floating"),
        }
        desktop.focused = Some(id);
        windows.push(id);
    }

    for message in &cli.commands {
        debug!(message, "sending layout message");
        let response = engine.handle_message(&desktop, None, message);
        settle(&mut engine, &mut desktop, response);
    }
    for &delta in &cli.resizes {
        let response = engine.resize_window(&desktop, None, delta);
        settle(&mut engine, &mut desktop, response);
    }
    let response = engine.recalculate_monitor(&desktop, monitor);
    settle(&mut engine, &mut desktop, response);

    if cli.tree {
        print!("{}", engine.draw_tree(workspace));
        return Ok(());
    }

    let placed: Vec<PlacedWindow> = windows
        .iter()
        .enumerate()
        .filter_map(|(index, &id)| {
            let window = desktop.window(id)?;
            let node = engine.node(id);
            Some(PlacedWindow {
                index: index + 1,
                master: node.is_some_and(|n| n.is_master),
                stack: node.map_or(0, |n| n.stack_index),
                focused: desktop.focused == Some(id),
                frame: window.frame,
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&placed)?);
    Ok(())
}
