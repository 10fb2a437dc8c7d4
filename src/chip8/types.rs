/// Outcome of a single `step` call.
pub enum StepResult {
    /// Keep executing instructions in the current frame.
    Continue,
    /// The framebuffer changed or the machine cannot make progress right now,
    /// so the host should render a frame before stepping again.
    NextFrame,
}

/// Error types that can occur during CHIP-8 emulation
#[derive(Debug, thiserror::Error)]
pub enum Chip8Error {
    #[error("ROM is too large ({size} bytes), max size is {max_size} bytes")]
    RomTooLarge { size: usize, max_size: usize },

    #[error("Memory access out of bounds at address {address:#06X}")]
    MemoryOutOfBounds { address: u16 },

    #[error("Stack overflow: subroutine calls nested deeper than 16 levels")]
    StackOverflow,

    #[error("Stack underflow: attempted to return with no subroutine call in progress")]
    StackUnderflow,

    #[error("Unknown opcode: {opcode:#06X}")]
    UnknownOpcode { opcode: u16 },
}

pub const MEMORY_SIZE: usize = 4096;
pub const DISPLAY_X: usize = 64;
pub const DISPLAY_Y: usize = 32;
/// A type alias for the CHIP-8 display buffer representation
pub type Display<T> = [[T; DISPLAY_X]; DISPLAY_Y];
