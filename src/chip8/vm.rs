use super::font::FONT;
use super::{Chip8Error, DISPLAY_X, DISPLAY_Y, Display, MEMORY_SIZE, Opcode, StepResult};
use crate::u4;

// The constants are specified by the CHIP-8 specification
pub(crate) const ROM_START_ADDRESS: usize = 0x200;
pub(crate) const STACK_DEPTH: usize = 16;

/// Execution state of the virtual machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Executing one instruction per `step` call.
    Running,
    /// Suspended by Fx0A until a key press is observed. The target register
    /// is remembered so the key index can be stored once it arrives.
    BlockedOnKey { x: u4 },
    /// Stopped by the host; `step` does nothing until `reset` is called.
    Halted,
}

/// CHIP-8 virtual machine state
pub struct Chip8 {
    /// 4KB memory array
    pub(crate) memory: [u8; MEMORY_SIZE],
    /// Display buffer: 64x32 monochrome pixels
    pub(crate) display: Display<bool>,

    /// Program counter: address of the next instruction to execute
    pub(crate) pc: u16,
    /// Index register: used for memory operations
    pub(crate) i: u16,
    /// General-purpose registers V0-VF (VF is used as a flag register)
    pub(crate) v: [u8; 16],
    /// Call stack for subroutine returns, at most 16 levels deep
    pub(crate) stack: [u16; STACK_DEPTH],
    /// Stack pointer: number of return addresses currently on the stack
    pub(crate) sp: u8,

    /// Delay timer: decrements at 60Hz until it reaches 0
    pub(crate) delay_timer: u8,
    /// Sound timer: decrements at 60Hz, beeps while non-zero
    pub(crate) sound_timer: u8,

    /// Keypad state: 16 keys mapped as booleans (true = pressed)
    pub(crate) keypad: [bool; 16],
    /// Current execution mode
    pub(crate) mode: Mode,
    /// Key press transition observed while blocked on Fx0A
    pressed_key: Option<u8>,

    /// Set whenever the display buffer changes, cleared by the host
    redraw: bool,
}

impl Chip8 {
    pub fn new() -> Self {
        let mut chip8 = Chip8 {
            memory: [0; MEMORY_SIZE],
            display: [[false; DISPLAY_X]; DISPLAY_Y],
            pc: 0,
            i: 0,
            v: [0; 16],
            stack: [0; STACK_DEPTH],
            sp: 0,
            delay_timer: 0,
            sound_timer: 0,
            keypad: [false; 16],
            mode: Mode::Running,
            pressed_key: None,
            redraw: false,
        };
        chip8.reset();
        chip8
    }

    /// Restores the machine to its power-on state: memory, registers, stack,
    /// display and timers zeroed, font glyphs reloaded, PC at the ROM entry
    /// address.
    pub fn reset(&mut self) {
        self.memory = [0; MEMORY_SIZE];
        self.memory[..FONT.len()].copy_from_slice(&FONT);
        self.display = [[false; DISPLAY_X]; DISPLAY_Y];
        self.pc = ROM_START_ADDRESS as u16;
        self.i = 0;
        self.v = [0; 16];
        self.stack = [0; STACK_DEPTH];
        self.sp = 0;
        self.delay_timer = 0;
        self.sound_timer = 0;
        self.keypad = [false; 16];
        self.mode = Mode::Running;
        self.pressed_key = None;
        self.redraw = false;
    }

    /// Copies a ROM into memory at the entry address and points the PC there.
    ///
    /// Registers, timers and the display are left untouched, so a failed load
    /// leaves the machine in its previous state.
    pub fn load(&mut self, rom: &[u8]) -> Result<(), Chip8Error> {
        let rom_end = ROM_START_ADDRESS + rom.len();
        self.memory
            .get_mut(ROM_START_ADDRESS..rom_end)
            .ok_or(Chip8Error::RomTooLarge {
                size: rom.len(),
                max_size: MEMORY_SIZE - ROM_START_ADDRESS,
            })?
            .copy_from_slice(rom);

        self.pc = ROM_START_ADDRESS as u16;

        Ok(())
    }

    /// Executes a single fetch-decode-execute cycle.
    ///
    /// While blocked on Fx0A this returns immediately without touching the PC;
    /// the instruction completes on the first call after a key press
    /// transition has been reported through `set_key`. While halted this is a
    /// no-op.
    pub fn step(&mut self) -> Result<StepResult, Chip8Error> {
        match self.mode {
            Mode::Halted => return Ok(StepResult::NextFrame),
            Mode::BlockedOnKey { x } => {
                if let Some(key) = self.pressed_key.take() {
                    self.v[x] = key;
                    self.pc = self.pc.wrapping_add(2);
                    self.mode = Mode::Running;
                }
                return Ok(StepResult::NextFrame);
            }
            Mode::Running => {}
        }

        let opcode = self.fetch()?;
        self.execute(Opcode::decode(opcode))
    }

    /// Updates the delay and sound timers. Should be called at 60Hz,
    /// independently of the instruction rate.
    pub fn tick_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }

    /// Set the state of a key on the keypad.
    pub fn set_key(&mut self, key: u4, pressed: bool) {
        if pressed && !self.keypad[key] && matches!(self.mode, Mode::BlockedOnKey { .. }) {
            self.pressed_key = Some(key.into());
        }
        self.keypad[key] = pressed;
    }

    /// Stops execution until the next `reset`.
    pub fn halt(&mut self) {
        self.mode = Mode::Halted;
    }

    /// Current execution mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns true if the sound timer is greater than zero, indicating the
    /// host should be playing its tone.
    pub fn sound_active(&self) -> bool {
        self.sound_timer > 0
    }

    /// True if the display buffer changed since the flag was last consumed.
    pub fn redraw(&self) -> bool {
        self.redraw
    }

    /// Consumes the redraw flag, returning whether it was set.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }

    pub(crate) fn set_redraw(&mut self) {
        self.redraw = true;
    }

    /// The full display buffer (row-major, origin top-left).
    pub fn display(&self) -> &Display<bool> {
        &self.display
    }

    /// Get the state of a pixel on the display (true = on, false = off).
    pub fn pixel(&self, y: usize, x: usize) -> bool {
        self.display[y][x]
    }

    /// Fetches the next 16-bit opcode from memory.
    fn fetch(&mut self) -> Result<u16, Chip8Error> {
        let high = *self.mem_get(self.pc)?;
        let low = *self.mem_get(self.pc.wrapping_add(1))?;

        Ok(u16::from_be_bytes([high, low]))
    }

    /// Helper to get a mutable reference to a memory location with bounds checking.
    pub(crate) fn mem_get(&mut self, addr: u16) -> Result<&mut u8, Chip8Error> {
        self.memory
            .get_mut(addr as usize)
            .ok_or(Chip8Error::MemoryOutOfBounds { address: addr })
    }
}

impl Default for Chip8 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip8::font::GLYPH_SIZE;

    #[test]
    fn reset_loads_font_and_entry_address() {
        let chip8 = Chip8::new();

        assert_eq!(chip8.pc, 0x200);
        assert_eq!(chip8.memory[..FONT.len()], FONT);
        assert_eq!(chip8.memory[FONT.len()..], [0; MEMORY_SIZE - 16 * GLYPH_SIZE]);
        assert!(!chip8.redraw());
        assert_eq!(chip8.mode(), Mode::Running);
    }

    #[test]
    fn load_copies_rom_at_entry_address() {
        let mut chip8 = Chip8::new();
        chip8.load(&[0x6A, 0x05]).unwrap();

        assert_eq!(chip8.memory[0x200..0x202], [0x6A, 0x05]);
        assert_eq!(chip8.pc, 0x200);
    }

    #[test]
    fn load_rejects_oversized_rom() {
        let mut chip8 = Chip8::new();
        chip8.load(&[0x6A, 0x05]).unwrap();
        chip8.step().unwrap();

        let rom = vec![0xFF; MEMORY_SIZE - 0x200 + 1];
        assert!(matches!(
            chip8.load(&rom),
            Err(Chip8Error::RomTooLarge { size, max_size })
                if size == rom.len() && max_size == 3584
        ));

        // Nothing was copied and the rest of the machine is untouched,
        // including the PC, which is only repointed on success
        assert_eq!(chip8.memory[0x200..0x202], [0x6A, 0x05]);
        assert_eq!(chip8.memory[0x202..], [0; MEMORY_SIZE - 0x202]);
        assert_eq!(chip8.pc, 0x202);
        assert_eq!(chip8.v[0xA], 5);
        assert_eq!(chip8.mode(), Mode::Running);
    }

    #[test]
    fn load_accepts_maximum_size_rom() {
        let mut chip8 = Chip8::new();
        let rom = vec![0xAB; MEMORY_SIZE - 0x200];

        chip8.load(&rom).unwrap();
        assert_eq!(chip8.memory[MEMORY_SIZE - 1], 0xAB);
    }

    #[test]
    fn step_executes_one_instruction() {
        let mut chip8 = Chip8::new();
        chip8.load(&[0x6A, 0x05]).unwrap();
        chip8.step().unwrap();

        assert_eq!(chip8.v[0xA], 5);
        assert_eq!(chip8.pc, 0x202);
    }

    #[test]
    fn unknown_opcode_is_reported_but_advances_pc() {
        let mut chip8 = Chip8::new();
        chip8.load(&[0x00, 0xFF]).unwrap();

        assert!(matches!(
            chip8.step(),
            Err(Chip8Error::UnknownOpcode { opcode: 0x00FF })
        ));
        // Execution can continue deterministically past the bad instruction
        assert_eq!(chip8.pc, 0x202);
    }

    #[test]
    fn timers_decrement_and_clamp_at_zero() {
        let mut chip8 = Chip8::new();
        chip8.delay_timer = 2;
        chip8.sound_timer = 1;

        chip8.tick_timers();
        assert_eq!(chip8.delay_timer, 1);
        assert_eq!(chip8.sound_timer, 0);
        assert!(!chip8.sound_active());

        chip8.tick_timers();
        chip8.tick_timers();
        assert_eq!(chip8.delay_timer, 0);
        assert_eq!(chip8.sound_timer, 0);
    }

    #[test]
    fn sound_active_while_sound_timer_nonzero() {
        let mut chip8 = Chip8::new();
        chip8.sound_timer = 3;
        assert!(chip8.sound_active());
    }

    #[test]
    fn halt_stops_execution() {
        let mut chip8 = Chip8::new();
        chip8.load(&[0x6A, 0x05]).unwrap();
        chip8.halt();

        chip8.step().unwrap();
        assert_eq!(chip8.pc, 0x200);
        assert_eq!(chip8.v[0xA], 0);
        assert_eq!(chip8.mode(), Mode::Halted);
    }

    #[test]
    fn wait_for_key_blocks_until_press_transition() {
        let mut chip8 = Chip8::new();
        chip8.load(&[0xF5, 0x0A]).unwrap();

        chip8.step().unwrap();
        assert_eq!(chip8.mode(), Mode::BlockedOnKey { x: u4::new(5) });
        assert_eq!(chip8.pc, 0x200);

        // Repeated steps are no-ops while no key arrives
        chip8.step().unwrap();
        chip8.step().unwrap();
        assert_eq!(chip8.pc, 0x200);

        // A release transition does not qualify
        chip8.set_key(u4::new(7), false);
        chip8.step().unwrap();
        assert_eq!(chip8.mode(), Mode::BlockedOnKey { x: u4::new(5) });

        chip8.set_key(u4::new(7), true);
        chip8.step().unwrap();
        assert_eq!(chip8.v[5], 7);
        assert_eq!(chip8.pc, 0x202);
        assert_eq!(chip8.mode(), Mode::Running);
    }

    #[test]
    fn held_key_does_not_retrigger_wait_for_key() {
        let mut chip8 = Chip8::new();
        // Two consecutive Fx0A instructions
        chip8.load(&[0xF0, 0x0A, 0xF1, 0x0A]).unwrap();

        chip8.set_key(u4::new(3), true);
        chip8.step().unwrap();
        // Key was already down before the first Fx0A started blocking,
        // so no press transition has been observed yet
        chip8.step().unwrap();
        assert_eq!(chip8.mode(), Mode::BlockedOnKey { x: u4::new(0) });

        chip8.set_key(u4::new(3), false);
        chip8.set_key(u4::new(3), true);
        chip8.step().unwrap();
        assert_eq!(chip8.v[0], 3);
        assert_eq!(chip8.pc, 0x202);
    }

    #[test]
    fn redraw_flag_is_consumed_explicitly() {
        let mut chip8 = Chip8::new();
        chip8.load(&[0x00, 0xE0]).unwrap();
        chip8.step().unwrap();

        assert!(chip8.redraw());
        assert!(chip8.take_redraw());
        assert!(!chip8.redraw());
        assert!(!chip8.take_redraw());
    }
}
