//! Engine service: owns the workers and the local user's entry points.
//!
//! [`Engine`] wires the collaborators into an [`EngineContext`], spawns the
//! socket, broadcast and sampler workers, and exposes what the phone's UI
//! can do: engine commands, pointer input and text/image submission.
//!
//! ```text
//!  RenderSink ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!  ImageCodec ──▶ │            Engine             │
//!  PortResolver ─▶│  rx · pipe · stream · sound   │ ◀── EngineCommand
//!  StoragePort ──▶└──────────────────────────────┘ ◀── pointer / text / image
//! ```

use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::Context as _;
use log::{info, warn};

use super::commands::EngineCommand;
use super::context::EngineContext;
use super::events::EngineEvent;
use super::ports::{Clock, EventSink, ImageCodec, PortResolver, RenderSink, StorageError, StoragePort};
use crate::adapters::device_id::DeviceIdentity;
use crate::config::EngineConfig;
use crate::controls::interaction::{self, PendingInput};
use crate::controls::registry::ControlHandle;
use crate::rpc::image::Image;
use crate::rpc::io_task::{spawn_pipe, spawn_receiver};
use crate::rpc::opcode::{CONNECTION, RESET_REQUEST};
use crate::rpc::transport::{Transport, UdpTransport};
use crate::scheduler::spawn_broadcaster;
use crate::sensors::sound::AmplitudeSource;

const SETTINGS: &str = "settings";
const RUN_IN_BACKGROUND: &str = "run_in_background";

/// Everything the engine talks to outside itself.
pub struct Collaborators {
    pub render: Arc<dyn RenderSink>,
    pub events: Arc<dyn EventSink>,
    pub images: Arc<dyn ImageCodec>,
    pub resolver: Arc<dyn PortResolver>,
    pub clock: Arc<dyn Clock>,
    pub storage: Box<dyn StoragePort>,
    /// Microphone for the sound sensor; sound stays unsupported without it.
    pub microphone: Option<Arc<dyn AmplitudeSource>>,
}

pub struct Engine {
    ctx: Arc<EngineContext>,
    storage: Box<dyn StoragePort>,
    run_in_background: bool,
    workers: Vec<JoinHandle<()>>,
}

impl Engine {
    /// Bind the configured UDP port and start.
    pub fn start(config: EngineConfig, collab: Collaborators) -> anyhow::Result<Self> {
        let transport = UdpTransport::bind(config.udp_port, config.recv_timeout())
            .with_context(|| format!("binding UDP port {}", config.udp_port))?;
        Self::start_with_transport(config, collab, Arc::new(transport))
    }

    /// Start over an existing transport.  Sensors start running; a
    /// configured server is probed right away.
    pub fn start_with_transport<T: Transport + 'static>(
        config: EngineConfig,
        collab: Collaborators,
        transport: Arc<T>,
    ) -> anyhow::Result<Self> {
        config.validate().context("invalid engine configuration")?;
        let Collaborators {
            render,
            events,
            images,
            resolver,
            clock,
            mut storage,
            microphone,
        } = collab;

        let identity = DeviceIdentity::load_or_generate(storage.as_mut())
            .context("loading device id")?;
        let run_in_background = load_flag(storage.as_ref(), RUN_IN_BACKGROUND);
        let server = config.server.clone();

        let ctx = Arc::new(EngineContext::new(
            config, identity, clock, render, events, images, resolver,
        ));
        ctx.events
            .emit(&EngineEvent::DeviceIdReady(identity.hex().as_str().to_owned()));
        ctx.events
            .emit(&EngineEvent::PasswordChanged(ctx.password.current()));

        let mut workers = vec![
            spawn_pipe(Arc::clone(&ctx), Arc::clone(&transport)).context("spawning pipe worker")?,
            spawn_receiver(Arc::clone(&ctx), transport).context("spawning receive worker")?,
            spawn_broadcaster(Arc::clone(&ctx)).context("spawning broadcast worker")?,
        ];
        if let Some(microphone) = microphone {
            let sampler = ctx
                .sensors
                .sound
                .spawn_sampler(microphone, Arc::clone(&ctx.gate))
                .context("spawning sound sampler")?;
            workers.push(sampler);
        }

        ctx.gate.set_running(true);
        ctx.events.emit(&EngineEvent::SensorsRunning(true));
        if let Some(host) = server {
            ctx.link.request_connect(host);
        }

        info!(
            "ENGINE: started, device {} run_in_background={run_in_background}",
            identity.hex()
        );
        Ok(Self {
            ctx,
            storage,
            run_in_background,
            workers,
        })
    }

    /// Shared state, for adapters that feed sensors or render controls.
    pub fn context(&self) -> &Arc<EngineContext> {
        &self.ctx
    }

    pub fn run_in_background(&self) -> bool {
        self.run_in_background
    }

    pub fn handle_command(&mut self, cmd: EngineCommand) -> crate::error::Result<()> {
        let ctx = &self.ctx;
        match cmd {
            EngineCommand::Connect(host) => {
                info!("ENGINE: connect to {host}");
                ctx.link.request_connect(host);
            }
            EngineCommand::ResetConnection => match ctx.link.endpoint() {
                Some(endpoint) => ctx.send_to(endpoint, &[CONNECTION, RESET_REQUEST]),
                None => warn!("ENGINE: reset requested without a server"),
            },
            EngineCommand::RegeneratePassword => {
                let password = ctx.password.regenerate();
                ctx.events.emit(&EngineEvent::PasswordChanged(password));
            }
            EngineCommand::SetRunInBackground(enabled) => {
                self.run_in_background = enabled;
                self.storage
                    .write(SETTINGS, RUN_IN_BACKGROUND, &[u8::from(enabled)])?;
            }
            EngineCommand::Pause => {
                if !self.run_in_background {
                    ctx.gate.set_running(false);
                    ctx.events.emit(&EngineEvent::SensorsRunning(false));
                }
            }
            EngineCommand::Resume => {
                ctx.gate.set_running(true);
                ctx.events.emit(&EngineEvent::SensorsRunning(true));
            }
        }
        Ok(())
    }

    // ── Local interaction ────────────────────────────────────

    /// A pointer touched the screen.  Returns the control that now needs
    /// text or an image from the user, if any.
    pub fn pointer_down(&self, pointer: u32, x: f32, y: f32) -> Option<PendingInput> {
        let ctx = &self.ctx;
        ctx.pointers
            .pointer_down(&ctx.registry, pointer, x, y, &mut |m| ctx.send_to_remote(&m))
    }

    pub fn pointer_move(&self, pointer: u32, x: f32, y: f32) {
        let ctx = &self.ctx;
        ctx.pointers
            .pointer_move(&ctx.registry, pointer, x, y, &mut |m| ctx.send_to_remote(&m));
    }

    pub fn pointer_up(&self, pointer: u32) {
        let ctx = &self.ctx;
        ctx.pointers
            .pointer_up(&ctx.registry, pointer, &mut |m| ctx.send_to_remote(&m));
    }

    pub fn submit_text(&self, target: &ControlHandle, text: String) {
        let ctx = &self.ctx;
        interaction::submit_text(&ctx.registry, target, text, &mut |m| ctx.send_to_remote(&m));
    }

    pub fn submit_image(&self, target: &ControlHandle, image: Image) {
        let ctx = &self.ctx;
        interaction::submit_image(&ctx.registry, target, image, &mut |m| ctx.send_to_remote(&m));
    }

    /// Stop every worker and wait for them.
    pub fn shutdown(self) {
        info!("ENGINE: shutting down");
        self.ctx.gate.close();
        self.ctx.pipe.close();
        self.ctx.throttle.close();
        for worker in self.workers {
            let name = worker.thread().name().unwrap_or("worker").to_owned();
            if worker.join().is_err() {
                warn!("ENGINE: {name} panicked");
            }
        }
        info!("ENGINE: stopped");
    }
}

/// One-byte boolean setting; absent or unreadable reads as `false`.
fn load_flag(storage: &dyn StoragePort, key: &str) -> bool {
    let mut buf = [0u8; 1];
    match storage.read(SETTINGS, key, &mut buf) {
        Ok(1) => buf[0] != 0,
        Ok(_) | Err(StorageError::NotFound) => false,
        Err(e) => {
            warn!("ENGINE: cannot read {key}: {e}");
            false
        }
    }
}
