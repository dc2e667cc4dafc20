//! # Application State Management
//!
//! The headless runner around [`SyncCore`]:
//! - Command-line parsing and configuration loading
//! - Channel setup and reconnection after a delay
//! - The single event loop that owns the core and applies console commands
//! - Logging of roster and connection changes

pub mod console;

use std::{
    collections::HashMap,
    path::PathBuf,
    sync::mpsc::{channel, Receiver, RecvTimeoutError},
};

use cgmath::Point3;
use clap::Parser;
use web_time::Instant;

use console::{spawn_console_reader, ConsoleCommand};

use crate::{
    channel::{ChannelEvent, ChannelKind, WebSocketChannel},
    core::{error::SyncResult, SyncConfig},
    sync_state::{roster::RosterChange, status::StatusLevel, SyncCore},
};

/// Command-line flags. Flags override values from the config file.
#[derive(Parser, Debug, Default)]
#[command(name = "voxel-sync", version, about = "Headless client for a shared voxel world")]
pub struct Args {
    /// JSON configuration file
    #[arg(short, long, env = "VOXEL_SYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// WebSocket URL of the world (cell) server
    #[arg(long)]
    pub world_url: Option<String>,

    /// WebSocket URL of the roster (player) server
    #[arg(long)]
    pub roster_url: Option<String>,

    /// Minimum interval between position updates, in milliseconds
    #[arg(long)]
    pub move_interval_ms: Option<u64>,

    /// Do not read commands from stdin
    #[arg(long)]
    pub no_console: bool,
}

impl Args {
    /// Resolves the effective configuration: file, then flags.
    pub fn resolve_config(&self) -> SyncResult<SyncConfig> {
        let mut config = match &self.config {
            Some(path) => SyncConfig::from_file(path)?,
            None => SyncConfig::default(),
        };
        if let Some(url) = &self.world_url {
            config.world_url = url.clone();
        }
        if let Some(url) = &self.roster_url {
            config.roster_url = url.clone();
        }
        if let Some(interval) = self.move_interval_ms {
            config.move_send_interval_ms = interval;
        }
        Ok(config)
    }
}

/// Everything the event loop owns.
pub struct ApplicationState {
    /// The synchronization core driven by this loop.
    pub core: SyncCore,
    events: Receiver<ChannelEvent>,
    commands: Option<Receiver<ConsoleCommand>>,
    /// Channels waiting for their reconnect delay to pass.
    pending_reconnects: HashMap<ChannelKind, Instant>,
    last_status_level: StatusLevel,
    running: bool,
}

impl ApplicationState {
    /// Connects both channels and, unless disabled, starts the console reader.
    pub fn new(config: SyncConfig, console: bool) -> Self {
        let (events_tx, events_rx) = channel();
        let world =
            WebSocketChannel::connect(ChannelKind::World, &config.world_url, events_tx.clone());
        let roster =
            WebSocketChannel::connect(ChannelKind::Roster, &config.roster_url, events_tx);

        let commands = console.then(|| {
            let (commands_tx, commands_rx) = channel();
            // Blocked on stdin until the process exits; never joined.
            let _reader = spawn_console_reader(commands_tx);
            commands_rx
        });

        let core = SyncCore::new(config, Box::new(world), Box::new(roster));
        let last_status_level = core.status().level();
        ApplicationState {
            core,
            events: events_rx,
            commands,
            pending_reconnects: HashMap::new(),
            last_status_level,
            running: true,
        }
    }

    /// Runs until `quit` is entered or every transport has gone away.
    pub fn run(mut self) {
        let tick_interval = self.core.config().tick_interval();
        log::info!(
            "Connecting to world {} and roster {}",
            self.core.config().world_url,
            self.core.config().roster_url
        );

        while self.running {
            match self.events.recv_timeout(tick_interval) {
                Ok(event) => self.handle_channel_event(event),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    log::error!("All channel workers are gone");
                    break;
                }
            }
            // Drain whatever else is queued before ticking.
            while let Ok(event) = self.events.try_recv() {
                self.handle_channel_event(event);
            }

            self.process_commands();
            self.update(Instant::now());
        }

        self.core.shutdown();
    }

    fn handle_channel_event(&mut self, event: ChannelEvent) {
        if let ChannelEvent::Closed(kind) = event {
            let delay = self.core.config().reconnect_delay();
            self.pending_reconnects.insert(kind, Instant::now() + delay);
            log::info!("{kind} channel closed, retrying in {delay:?}");
        }
        self.core.handle_event(event);
    }

    fn process_commands(&mut self) {
        let Some(commands) = &self.commands else {
            return;
        };
        let pending: Vec<ConsoleCommand> = commands.try_iter().collect();
        for command in pending {
            self.apply_command(command);
        }
    }

    /// Applies one console command to the core.
    pub fn apply_command(&mut self, command: ConsoleCommand) {
        let cell_color = self.core.config().cell_color;
        match command {
            ConsoleCommand::Place { x, y, z, color } => {
                self.core.place_cell(x, y, z, color.unwrap_or(cell_color))
            }
            ConsoleCommand::Remove { x, y, z } => self.core.remove_cell(x, y, z),
            ConsoleCommand::Toggle { x, y, z, color } => {
                let placed = self.core.toggle_cell(x, y, z, color.unwrap_or(cell_color));
                log::info!("{} cell at [{x},{y},{z}]", if placed { "Placed" } else { "Removed" });
            }
            ConsoleCommand::Front { direction } => {
                let p = self.core.roster().local_position();
                let key = self.core.toggle_cell_in_front(Point3::new(p.x, p.y, p.z), direction);
                log::info!("Toggled cell {key}");
            }
            ConsoleCommand::Move { position } => self.core.move_local(position),
            ConsoleCommand::Status => log::info!("{}", self.core.status()),
            ConsoleCommand::Cells => {
                let world = self.core.world();
                log::info!("{} cells", world.len());
                for (key, cell) in world.iter() {
                    log::info!("  {key} {} {:?}", cell.color(), cell.role());
                }
            }
            ConsoleCommand::Players => {
                let roster = self.core.roster();
                log::info!(
                    "Local: {} at {:?}",
                    roster.local_identity().unwrap_or("N/A"),
                    roster.local_position()
                );
                for id in roster.remote_ids() {
                    if let Some(participant) = roster.remote(&id) {
                        log::info!("  {id} at {:?}", participant.position);
                    }
                }
            }
            ConsoleCommand::Quit => self.running = false,
        }
    }

    /// Periodic work: due reconnects, the move throttle and change logging.
    pub fn update(&mut self, now: Instant) {
        let due: Vec<ChannelKind> = self
            .pending_reconnects
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(kind, _)| *kind)
            .collect();
        for kind in due {
            self.pending_reconnects.remove(&kind);
            self.core.reconnect(kind);
        }

        self.core.tick(now);

        for change in self.core.take_roster_changes() {
            match change {
                RosterChange::Joined { id, proxy, position } => {
                    log::info!("Player {id} joined as {proxy:?} at {position:?}")
                }
                RosterChange::Left { id, proxy } => log::info!("Player {id} left ({proxy:?})"),
            }
        }

        let level = self.core.status().level();
        if level != self.last_status_level {
            log::info!("Connection {:?}: {}", level, self.core.status());
            self.last_status_level = level;
        }
    }
}

/// Parses flags, loads configuration and runs the event loop.
pub fn run_app(args: Args) -> SyncResult<()> {
    let config = args.resolve_config()?;
    ApplicationState::new(config, !args.no_console).run();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let args = Args::parse_from([
            "voxel-sync",
            "--world-url",
            "ws://example:1",
            "--move-interval-ms",
            "100",
        ]);
        let config = args.resolve_config().unwrap();
        assert_eq!(config.world_url, "ws://example:1");
        assert_eq!(config.roster_url, SyncConfig::default().roster_url);
        assert_eq!(config.move_send_interval_ms, 100);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let args = Args {
            config: Some(PathBuf::from("/nonexistent/voxel-sync.json")),
            ..Args::default()
        };
        assert!(args.resolve_config().is_err());
    }
}
