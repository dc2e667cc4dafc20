//! # Console Input
//!
//! Line-based commands read from stdin and turned into local actions on the
//! sync core. The reader runs on its own thread and forwards parsed
//! commands over an `mpsc` queue; the event loop applies them between
//! channel events.
//!
//! ```text
//! place 1 2 3 #ff0000    toggle 0 0 0         move 1.5 0 -2
//! remove 1 2 3           front 0 0 -1         status | cells | players | quit
//! ```

use std::{
    io::{self, BufRead},
    str::FromStr,
    sync::mpsc::Sender,
    thread::{self, JoinHandle},
};

use cgmath::Vector3;

use crate::{
    core::error::{SyncError, SyncResult},
    sync_state::world::cell::CellColor,
};

/// One parsed console line.
#[derive(Clone, Debug, PartialEq)]
#[allow(missing_docs)]
pub enum ConsoleCommand {
    /// Place a cell; `None` uses the configured cell color.
    Place { x: i32, y: i32, z: i32, color: Option<CellColor> },
    /// Remove the cell at a coordinate.
    Remove { x: i32, y: i32, z: i32 },
    /// Remove the cell if present, otherwise place one.
    Toggle { x: i32, y: i32, z: i32, color: Option<CellColor> },
    /// Toggle the cell in front of the local avatar along `direction`.
    Front { direction: Vector3<f32> },
    /// Move the local avatar.
    Move { position: Vector3<f32> },
    /// Log the connection status line.
    Status,
    /// Log every cell in the world replica.
    Cells,
    /// Log the local and remote participants.
    Players,
    /// Leave the event loop.
    Quit,
}

impl FromStr for ConsoleCommand {
    type Err = SyncError;

    fn from_str(line: &str) -> SyncResult<Self> {
        let invalid = |reason: &str| SyncError::InvalidCommand {
            line: line.to_string(),
            reason: reason.to_string(),
        };

        let mut words = line.split_whitespace();
        let verb = words.next().ok_or_else(|| invalid("empty line"))?;
        let args: Vec<&str> = words.collect();

        let command = match verb {
            "place" | "toggle" => {
                let (x, y, z) = parse_triple::<i32>(&args, 3, 4)
                    .ok_or_else(|| invalid("expected x y z [#rrggbb]"))?;
                let color = match args.get(3) {
                    Some(hex) => {
                        Some(CellColor::from_hex_str(hex).ok_or_else(|| invalid("bad color"))?)
                    }
                    None => None,
                };
                if verb == "place" {
                    ConsoleCommand::Place { x, y, z, color }
                } else {
                    ConsoleCommand::Toggle { x, y, z, color }
                }
            }
            "remove" => {
                let (x, y, z) =
                    parse_triple::<i32>(&args, 3, 3).ok_or_else(|| invalid("expected x y z"))?;
                ConsoleCommand::Remove { x, y, z }
            }
            "front" => {
                let (x, y, z) =
                    parse_triple::<f32>(&args, 3, 3).ok_or_else(|| invalid("expected dx dy dz"))?;
                ConsoleCommand::Front {
                    direction: Vector3::new(x, y, z),
                }
            }
            "move" => {
                let (x, y, z) =
                    parse_triple::<f32>(&args, 3, 3).ok_or_else(|| invalid("expected x y z"))?;
                ConsoleCommand::Move {
                    position: Vector3::new(x, y, z),
                }
            }
            "status" => ConsoleCommand::Status,
            "cells" => ConsoleCommand::Cells,
            "players" => ConsoleCommand::Players,
            "quit" | "exit" => ConsoleCommand::Quit,
            _ => return Err(invalid("unknown command")),
        };
        Ok(command)
    }
}

/// Reads the first three arguments as numbers, with `min..=max` arguments in total.
fn parse_triple<T: FromStr>(args: &[&str], min: usize, max: usize) -> Option<(T, T, T)> {
    if args.len() < min || args.len() > max {
        return None;
    }
    Some((args[0].parse().ok()?, args[1].parse().ok()?, args[2].parse().ok()?))
}

/// Starts a thread that forwards stdin commands until stdin closes or the
/// receiving loop goes away.
pub fn spawn_console_reader(commands: Sender<ConsoleCommand>) -> JoinHandle<()> {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    log::warn!("Console input failed: {e}");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<ConsoleCommand>() {
                Ok(command) => {
                    if commands.send(command).is_err() {
                        break;
                    }
                }
                Err(e) => log::warn!("{e}"),
            }
        }
        log::debug!("Console reader finished");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cell_edits() {
        assert_eq!(
            "place 1 -2 3".parse::<ConsoleCommand>().unwrap(),
            ConsoleCommand::Place { x: 1, y: -2, z: 3, color: None }
        );
        assert_eq!(
            "toggle 0 0 0 #ff0000".parse::<ConsoleCommand>().unwrap(),
            ConsoleCommand::Toggle {
                x: 0,
                y: 0,
                z: 0,
                color: CellColor::new(0xFF0000),
            }
        );
        assert_eq!(
            "  remove 4 5 6 ".parse::<ConsoleCommand>().unwrap(),
            ConsoleCommand::Remove { x: 4, y: 5, z: 6 }
        );
    }

    #[test]
    fn parses_moves_and_queries() {
        assert_eq!(
            "move 1.5 0 -2".parse::<ConsoleCommand>().unwrap(),
            ConsoleCommand::Move {
                position: Vector3::new(1.5, 0.0, -2.0)
            }
        );
        assert_eq!("status".parse::<ConsoleCommand>().unwrap(), ConsoleCommand::Status);
        assert_eq!("exit".parse::<ConsoleCommand>().unwrap(), ConsoleCommand::Quit);
    }

    #[test]
    fn rejects_bad_lines() {
        let lines = ["", "jump", "place 1 2", "place 1 2 x", "remove 1 2 3 4", "place 1 2 3 blue"];
        for line in lines {
            let err = line.parse::<ConsoleCommand>().unwrap_err();
            assert!(matches!(err, SyncError::InvalidCommand { .. }), "{line}");
        }
    }
}
