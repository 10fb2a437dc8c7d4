mod execute;
mod font;
mod opcode;
mod runner;
mod types;
mod vm;

pub use opcode::{AluOp, Opcode};
pub use runner::{Chip8Runner, RunnerResult};
pub use types::{Chip8Error, DISPLAY_X, DISPLAY_Y, Display, MEMORY_SIZE, StepResult};
pub use vm::{Chip8, Mode};
