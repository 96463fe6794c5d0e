//! UCI (Universal Chess Interface) protocol types for the GUI side of the wire.
//!
//! This crate formats the commands a controller sends to an engine subprocess
//! and parses the lines the engine writes back. It performs no I/O.
//!
//! # Commands sent to the engine
//!
//! - `uci` - Initialize engine, get id and options
//! - `isready` / `readyok` - Synchronization
//! - `setoption name <id> [value <x>]` - Configure an option
//! - `ucinewgame` - Reset engine state between unrelated positions
//! - `position fen <fen> [moves <move>...]` - Set position
//! - `go [depth <d>] [movetime <ms>]` - Start search
//! - `stop` - Stop search
//! - `quit` - Exit engine
//!
//! # Messages read from the engine
//!
//! - `id name <name>` / `id author <author>`
//! - `option name <id> type <t> ...`
//! - `uciok`, `readyok`
//! - `info ...`
//! - `bestmove <move> [ponder <move>]`

mod command;
mod info;
mod option;

pub use command::{GoOptions, GuiCommand};
pub use info::{Bound, EngineInfo, Score};
pub use option::{OptionDecl, OptionKind};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum UciError {
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// The move token engines print when the side to move has no legal moves.
pub const NULL_MOVE: &str = "(none)";

/// Messages sent from engine to GUI.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineMessage {
    /// Engine name.
    IdName(String),
    /// Engine author.
    IdAuthor(String),
    /// Declared option.
    Option(OptionDecl),
    /// UCI initialization complete.
    UciOk,
    /// Engine is ready.
    ReadyOk,
    /// Search information.
    Info(EngineInfo),
    /// Best move found. `None` when the position has no legal moves.
    BestMove {
        mv: Option<String>,
        ponder: Option<String>,
    },
    /// Anything else the engine prints (banners, diagnostics).
    Other(String),
}

impl EngineMessage {
    /// Parse one line of engine output.
    ///
    /// Never fails: lines that are not part of the protocol come back as
    /// [`EngineMessage::Other`] so the caller can decide whether they matter.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let mut parts = line.split_whitespace();

        match parts.next() {
            Some("uciok") => EngineMessage::UciOk,
            Some("readyok") => EngineMessage::ReadyOk,
            Some("id") => match parts.next() {
                Some("name") => EngineMessage::IdName(rest_of(parts)),
                Some("author") => EngineMessage::IdAuthor(rest_of(parts)),
                _ => EngineMessage::Other(line.to_string()),
            },
            Some("option") => match OptionDecl::parse(line) {
                Ok(decl) => EngineMessage::Option(decl),
                Err(_) => EngineMessage::Other(line.to_string()),
            },
            Some("info") => match EngineInfo::parse(line) {
                Some(info) => EngineMessage::Info(info),
                None => EngineMessage::Other(line.to_string()),
            },
            Some("bestmove") => {
                let mv = parts
                    .next()
                    .filter(|m| *m != NULL_MOVE && *m != "0000")
                    .map(str::to_string);
                let ponder = match parts.next() {
                    Some("ponder") => parts.next().map(str::to_string),
                    _ => None,
                };
                EngineMessage::BestMove { mv, ponder }
            }
            _ => EngineMessage::Other(line.to_string()),
        }
    }
}

fn rest_of<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts.collect::<Vec<_>>().join(" ")
}
