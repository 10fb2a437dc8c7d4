use clap::{Parser, Subcommand};
use clap_num::maybe_hex;

use crate::u4;

/// The debugger command language, parsed with clap in multicall mode so that
/// each input line starts directly with a command name.
#[derive(Parser)]
#[command(multicall = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Clone)]
pub enum Command {
    /// Resume free-running execution
    #[command(visible_alias = "r")]
    Run,

    /// Pause free-running execution
    #[command(visible_alias = "p")]
    Pause,

    /// Execute a single instruction
    #[command(visible_alias = "s")]
    Step,

    /// Restore the machine to its power-on state
    Reset,

    /// Manage breakpoints
    #[command(visible_alias = "b")]
    Breakpoint {
        #[command(subcommand)]
        action: BreakpointAction,
    },

    /// Write a register, I or the PC
    Set {
        #[arg(value_parser = parse_set_target)]
        target: SetTarget,
        #[arg(value_parser = maybe_hex::<u16>)]
        value: u16,
    },

    /// Dump a range of memory
    #[command(visible_alias = "m")]
    Mem {
        #[arg(default_value = "0", value_parser = maybe_hex::<u16>)]
        start: u16,
        #[arg(default_value = "16", value_parser = maybe_hex::<u16>)]
        len: u16,
    },

    /// Quit the debugger
    #[command(visible_alias = "q")]
    Quit,
}

pub enum CommandResult {
    Ok,
    Breakpoints(Vec<u16>),
    MemDump { data: Vec<u8>, offset: u16 },
    Quit,
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Error while executing cpu instruction: {0}")]
    Chip8Error(#[from] crate::chip8::Chip8Error),
    #[error("Value out of range")]
    ValueOutOfRange,
}

#[derive(Subcommand, Clone)]
pub enum BreakpointAction {
    #[command(visible_alias = "s")]
    Set {
        #[arg(value_parser = maybe_hex::<u16>)]
        addr: u16,
    },

    #[command(visible_alias = "c")]
    Clear {
        #[arg(value_parser = maybe_hex::<u16>)]
        addr: u16,
    },

    #[command(visible_alias = "l")]
    List,

    #[command(visible_alias = "ca")]
    ClearAll,
}

#[derive(Clone)]
pub enum SetTarget {
    V(u4),
    I,
    Pc,
}

fn parse_set_target(s: &str) -> Result<SetTarget, String> {
    let lower = s.to_lowercase();

    match lower.as_str() {
        "index" | "i" => Ok(SetTarget::I),
        "pc" => Ok(SetTarget::Pc),

        _ if lower.starts_with('v') => {
            let hex_str = &lower[1..];
            match u8::from_str_radix(hex_str, 16) {
                Ok(val) if val < 16 => Ok(SetTarget::V(u4::new(val))),
                _ => Err(format!("Invalid register: '{}'", s)),
            }
        }

        _ => Err(format!("Unknown set target: '{}'", s)),
    }
}
