pub mod chip8;
pub mod debugger;
mod nibble;

pub use chip8::{Chip8, Chip8Error, Chip8Runner, DISPLAY_X, DISPLAY_Y, Display};
pub use nibble::u4;
