//! PhoneIoT daemon: runs the device engine on a host.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                     │
//! │                                                               │
//! │  HeadlessRenderer  LogEventSink  SettingsStore  SystemClock   │
//! │  (RenderSink)      (EventSink)   (StoragePort)  (Clock)       │
//! │  HttpPortResolver  JpegImageCodec  sim feed + microphone      │
//! │                                                               │
//! │  ─────────────── Port Trait Boundary ───────────────────      │
//! │                                                               │
//! │  ┌─────────────────────────────────────────────────────────┐  │
//! │  │                Engine (protocol core)                   │  │
//! │  │  rx · pipe · stream · sound   Registry · SensorHub      │  │
//! │  └─────────────────────────────────────────────────────────┘  │
//! │                                                               │
//! │  stdin console: engine commands and simulated touches         │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `phoneiot [config.json]`.  `RUST_LOG` overrides the default
//! `info` filter.

use std::io::{self, BufRead, Write as _};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use log::{info, warn};

use phoneiot::adapters::image_codec::JpegImageCodec;
use phoneiot::adapters::headless::HeadlessRenderer;
use phoneiot::adapters::log_sink::LogEventSink;
use phoneiot::adapters::resolver::HttpPortResolver;
use phoneiot::adapters::sim::{SimulatedMicrophone, spawn_sensor_feed};
use phoneiot::adapters::storage::SettingsStore;
use phoneiot::adapters::time::SystemClock;
use phoneiot::app::commands::EngineCommand;
use phoneiot::app::ports::StoragePort;
use phoneiot::app::service::{Collaborators, Engine};
use phoneiot::config::EngineConfig;
use phoneiot::controls::interaction::PendingInput;
use phoneiot::controls::widgets::Followup;
use phoneiot::rpc::auth::random_u64;
use phoneiot::rpc::image::Image;

/// Simulated screen, portrait.
const SCREEN_WIDTH: f32 = 720.0;
const SCREEN_HEIGHT: f32 = 1280.0;

// ── Console ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum ConsoleCommand {
    Engine(EngineCommand),
    Down(u32, f32, f32),
    Move(u32, f32, f32),
    Up(u32),
    Tap(f32, f32),
    Text(String),
    Image,
    Controls,
    Status,
    Help,
    Quit,
}

const HELP: &str = "\
commands:
  connect <host>        probe a server
  reset                 ask the server to reset the connection
  password              new session password
  pause | resume        background / foreground the app
  background on|off     keep sensors running while paused
  down <p> <x> <y>      pointer p pressed at pixel (x, y)
  move <p> <x> <y>      pointer p moved
  up <p>                pointer p lifted
  tap <x> <y>           down + up with pointer 0
  text <string>         answer a text field prompt
  image                 answer an image box prompt
  controls | status | help | quit";

fn parse_line(line: &str) -> Option<ConsoleCommand> {
    let line = line.trim();
    let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();
    let mut args = rest.split_whitespace();
    let mut num = || args.next()?.parse::<f32>().ok();

    Some(match word {
        "connect" if !rest.is_empty() => {
            ConsoleCommand::Engine(EngineCommand::Connect(rest.to_owned()))
        }
        "reset" => ConsoleCommand::Engine(EngineCommand::ResetConnection),
        "password" => ConsoleCommand::Engine(EngineCommand::RegeneratePassword),
        "pause" => ConsoleCommand::Engine(EngineCommand::Pause),
        "resume" => ConsoleCommand::Engine(EngineCommand::Resume),
        "background" => match rest {
            "on" => ConsoleCommand::Engine(EngineCommand::SetRunInBackground(true)),
            "off" => ConsoleCommand::Engine(EngineCommand::SetRunInBackground(false)),
            _ => return None,
        },
        "down" => ConsoleCommand::Down(num()? as u32, num()?, num()?),
        "move" => ConsoleCommand::Move(num()? as u32, num()?, num()?),
        "up" => ConsoleCommand::Up(num()? as u32),
        "tap" => ConsoleCommand::Tap(num()?, num()?),
        "text" => ConsoleCommand::Text(rest.to_owned()),
        "image" => ConsoleCommand::Image,
        "controls" => ConsoleCommand::Controls,
        "status" => ConsoleCommand::Status,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        _ => return None,
    })
}

fn note_pending(pending: &mut Option<PendingInput>, input: Option<PendingInput>) {
    if let Some(input) = input {
        println!("{:?} requested for {}", input.kind, input.target.id().escape_ascii());
        *pending = Some(input);
    }
}

/// Run one console command.  Returns `false` to quit.
fn run_console_command(
    engine: &mut Engine,
    pending: &mut Option<PendingInput>,
    cmd: ConsoleCommand,
) -> bool {
    match cmd {
        ConsoleCommand::Engine(cmd) => {
            if let Err(e) = engine.handle_command(cmd) {
                warn!("command failed: {e}");
            }
        }
        ConsoleCommand::Down(p, x, y) => note_pending(pending, engine.pointer_down(p, x, y)),
        ConsoleCommand::Move(p, x, y) => engine.pointer_move(p, x, y),
        ConsoleCommand::Up(p) => engine.pointer_up(p),
        ConsoleCommand::Tap(x, y) => {
            note_pending(pending, engine.pointer_down(0, x, y));
            engine.pointer_up(0);
        }
        ConsoleCommand::Text(text) => match pending.take() {
            Some(p) if p.kind == Followup::EditText => engine.submit_text(&p.target, text),
            other => {
                *pending = other;
                println!("no text field is waiting for input");
            }
        },
        ConsoleCommand::Image => match pending.take() {
            Some(p) if p.kind == Followup::CaptureImage => {
                let [r, g, b, ..] = random_u64().to_be_bytes();
                engine.submit_image(&p.target, Image::filled(64, 48, [r, g, b, 255]));
            }
            other => {
                *pending = other;
                println!("no image box is waiting for input");
            }
        },
        ConsoleCommand::Controls => {
            for handle in engine.context().registry.snapshot() {
                println!("  {:?} {}", handle.kind(), handle.id().escape_ascii());
            }
        }
        ConsoleCommand::Status => {
            let ctx = engine.context();
            println!("device    {}", ctx.identity.hex());
            println!("password  {:08x}", ctx.password.current());
            println!("link      {:?}", ctx.link.state());
            println!("sensors   running={}", ctx.gate.is_running());
            println!("background {}", engine.run_in_background());
            println!("controls  {}/{}", ctx.registry.len(), ctx.registry.capacity());
        }
        ConsoleCommand::Help => println!("{HELP}"),
        ConsoleCommand::Quit => return false,
    }
    true
}

// ── Main ──────────────────────────────────────────────────────

fn load_config() -> Result<EngineConfig> {
    let Some(path) = std::env::args().nth(1) else {
        info!("No config file given, using defaults");
        return Ok(EngineConfig::default());
    };
    let text =
        std::fs::read_to_string(&path).with_context(|| format!("reading config {path}"))?;
    let config = EngineConfig::from_json(&text).with_context(|| format!("parsing config {path}"))?;
    info!("Config loaded from {path}");
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("╔══════════════════════════════════════╗");
    info!("║  PhoneIoT v{:<26}║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = load_config()?;

    let storage: Box<dyn StoragePort> = match &config.storage_path {
        Some(path) => match SettingsStore::open(path) {
            Ok(store) => Box::new(store),
            Err(e) => {
                warn!("Settings at {path} unusable ({e}), running without persistence");
                Box::new(SettingsStore::in_memory())
            }
        },
        None => Box::new(SettingsStore::in_memory()),
    };
    let resolver = HttpPortResolver::from_config(&config).context("building HTTP client")?;

    let collab = Collaborators {
        render: Arc::new(HeadlessRenderer::new(SCREEN_WIDTH, SCREEN_HEIGHT)),
        events: Arc::new(LogEventSink::new()),
        images: Arc::new(JpegImageCodec),
        resolver: Arc::new(resolver),
        clock: Arc::new(SystemClock),
        storage,
        microphone: Some(Arc::new(SimulatedMicrophone::default())),
    };
    let mut engine = Engine::start(config, collab)?;
    let feed = spawn_sensor_feed(Arc::clone(engine.context())).context("spawning sensor feed")?;

    println!("{HELP}");
    let mut pending = None;
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(&line) {
            Some(cmd) => {
                if !run_console_command(&mut engine, &mut pending, cmd) {
                    break;
                }
            }
            None => println!("unrecognised: {line} (try `help`)"),
        }
        io::stdout().flush().ok();
    }

    engine.shutdown();
    if feed.join().is_err() {
        warn!("sensor feed panicked");
    }
    Ok(())
}
