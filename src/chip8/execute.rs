use super::font::GLYPH_SIZE;
use super::vm::STACK_DEPTH;
use super::{AluOp, Chip8, Chip8Error, DISPLAY_X, DISPLAY_Y, Mode, Opcode, StepResult};
use crate::u4;

impl Chip8 {
    pub(crate) fn execute(&mut self, opcode: Opcode) -> Result<StepResult, Chip8Error> {
        // The PC is advanced past the instruction up front; jumps, calls and
        // skips overwrite it, and Fx0A rewinds it while blocking.
        self.pc = self.pc.wrapping_add(2);

        match opcode {
            Opcode::Cls => {
                self.display = [[false; DISPLAY_X]; DISPLAY_Y];
                self.set_redraw();
            }
            Opcode::Jp { nnn } => {
                self.pc = nnn;
            }
            Opcode::JpV0 { nnn } => {
                self.pc = nnn.wrapping_add(self.v[0].into());
            }
            Opcode::Call { nnn } => {
                if self.sp as usize >= STACK_DEPTH {
                    return Err(Chip8Error::StackOverflow);
                }
                self.stack[self.sp as usize] = self.pc;
                self.sp += 1;
                self.pc = nnn;
            }
            Opcode::Ret => {
                self.sp = self.sp.checked_sub(1).ok_or(Chip8Error::StackUnderflow)?;
                self.pc = self.stack[self.sp as usize];
            }
            Opcode::SeImm { x, nn } => {
                if self.v[x] == nn {
                    self.pc = self.pc.wrapping_add(2);
                }
            }
            Opcode::SneImm { x, nn } => {
                if self.v[x] != nn {
                    self.pc = self.pc.wrapping_add(2);
                }
            }
            Opcode::SeReg { x, y } => {
                if self.v[x] == self.v[y] {
                    self.pc = self.pc.wrapping_add(2);
                }
            }
            Opcode::SneReg { x, y } => {
                if self.v[x] != self.v[y] {
                    self.pc = self.pc.wrapping_add(2);
                }
            }
            Opcode::LdImm { x, nn } => {
                self.v[x] = nn;
            }
            Opcode::AddImm { x, nn } => {
                self.v[x] = self.v[x].wrapping_add(nn);
            }
            Opcode::Alu { x, y, op } => {
                self.execute_alu(x, y, op);
            }
            Opcode::Rnd { x, nn } => {
                self.v[x] = rand::random::<u8>() & nn;
            }
            Opcode::LdI { nnn } => {
                self.i = nnn;
            }
            Opcode::AddI { x } => {
                let sum = u32::from(self.i) + u32::from(self.v[x]);
                self.v[0xF] = if sum > 0xFFF { 1 } else { 0 };
                self.i = sum as u16;
            }
            Opcode::Drw { x, y, n } => {
                return self.execute_draw(x, y, n);
            }
            Opcode::Skp { x } => {
                if self.keypad[self.v[x] as usize & 0x0F] {
                    self.pc = self.pc.wrapping_add(2);
                }
            }
            Opcode::Sknp { x } => {
                if !self.keypad[self.v[x] as usize & 0x0F] {
                    self.pc = self.pc.wrapping_add(2);
                }
            }
            Opcode::WaitKey { x } => {
                // Keep the PC pointing at this instruction; it completes in
                // `step` once a key press transition has been observed.
                self.pc = self.pc.wrapping_sub(2);
                self.mode = Mode::BlockedOnKey { x };
                return Ok(StepResult::NextFrame);
            }
            Opcode::LdFromDt { x } => {
                self.v[x] = self.delay_timer;
            }
            Opcode::LdDt { x } => {
                self.delay_timer = self.v[x];
            }
            Opcode::LdSt { x } => {
                self.sound_timer = self.v[x];
            }
            Opcode::LdFont { x } => {
                self.i = u16::from(self.v[x]) * GLYPH_SIZE as u16;
            }
            Opcode::Bcd { x } => {
                // The whole range is validated before anything is written, so
                // a failure leaves memory untouched
                let value = self.v[x];
                let start = self.i as usize;
                let dst = self
                    .memory
                    .get_mut(start..start + 3)
                    .ok_or(Chip8Error::MemoryOutOfBounds { address: self.i })?;
                dst[0] = value / 100;
                dst[1] = (value / 10) % 10;
                dst[2] = value % 10;
            }
            Opcode::StoreV { x } => {
                let count = usize::from(x) + 1;
                let start = self.i as usize;
                let dst = self
                    .memory
                    .get_mut(start..start + count)
                    .ok_or(Chip8Error::MemoryOutOfBounds { address: self.i })?;
                dst.copy_from_slice(&self.v[..count]);
                self.i = self.i.wrapping_add(count as u16);
            }
            Opcode::LoadV { x } => {
                let count = usize::from(x) + 1;
                let start = self.i as usize;
                let src = self
                    .memory
                    .get(start..start + count)
                    .ok_or(Chip8Error::MemoryOutOfBounds { address: self.i })?;
                self.v[..count].copy_from_slice(src);
                self.i = self.i.wrapping_add(count as u16);
            }
            Opcode::Unknown(opcode) => {
                return Err(Chip8Error::UnknownOpcode { opcode });
            }
        };

        Ok(StepResult::Continue)
    }

    fn execute_alu(&mut self, x: u4, y: u4, op: AluOp) {
        match op {
            AluOp::Ld => self.v[x] = self.v[y],
            AluOp::Or => self.v[x] |= self.v[y],
            AluOp::And => self.v[x] &= self.v[y],
            AluOp::Xor => self.v[x] ^= self.v[y],
            AluOp::Add => {
                let (res, overflow) = self.v[x].overflowing_add(self.v[y]);
                self.v[x] = res;
                self.v[0xF] = if overflow { 1 } else { 0 };
            }
            AluOp::Sub => {
                let (res, borrow) = self.v[x].overflowing_sub(self.v[y]);
                self.v[x] = res;
                self.v[0xF] = if borrow { 0 } else { 1 }; // Notice that borrow is inverted
            }
            AluOp::Subn => {
                let (res, borrow) = self.v[y].overflowing_sub(self.v[x]);
                self.v[x] = res;
                self.v[0xF] = if borrow { 0 } else { 1 };
            }
            AluOp::Shr => {
                let lsb = self.v[x] & 1;
                self.v[x] >>= 1;
                self.v[0xF] = lsb;
            }
            AluOp::Shl => {
                let msb = (self.v[x] >> 7) & 1;
                self.v[x] <<= 1;
                self.v[0xF] = msb;
            }
        }
    }

    fn execute_draw(&mut self, x: u4, y: u4, n: u4) -> Result<StepResult, Chip8Error> {
        let x_pos = self.v[x] as usize % DISPLAY_X;
        let y_pos = self.v[y] as usize % DISPLAY_Y;

        let mut any_erased = false;
        for row in 0..usize::from(n) {
            let sprite_byte = *self.mem_get(self.i.wrapping_add(row as u16))?;

            for col in 0..8 {
                // If current sprite bit is non-zero
                if (sprite_byte & (0x80 >> col)) != 0 {
                    // Sprites wrap around both display edges
                    let pixel =
                        &mut self.display[(y_pos + row) % DISPLAY_Y][(x_pos + col) % DISPLAY_X];

                    // Flip the pixel
                    *pixel ^= true;

                    if !*pixel {
                        any_erased = true;
                    }
                }
            }
        }

        self.v[0xF] = if any_erased { 1 } else { 0 };
        self.set_redraw();
        Ok(StepResult::NextFrame)
    }
}
