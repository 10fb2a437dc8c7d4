use crate::u4;

/// Decoded CHIP-8 instructions.
///
/// The fields (x, y, n, nn, nnn) correspond to the operand bit fields of the
/// 16-bit instruction word: x = bits 8-11, y = bits 4-7, n/nn/nnn = low
/// nibble/byte/12 bits.
#[derive(Debug, PartialEq, Eq)]
pub enum Opcode {
    /// 00E0 - Clear the display.
    Cls,
    /// 00EE - Return from a subroutine.
    Ret,
    /// 1nnn - Jump to address nnn.
    Jp { nnn: u16 },
    /// Bnnn - Jump to address nnn + V0.
    JpV0 { nnn: u16 },
    /// 2nnn - Call subroutine at nnn.
    Call { nnn: u16 },

    /// 3xnn - Skip next instruction if Vx == nn.
    SeImm { x: u4, nn: u8 },
    /// 4xnn - Skip next instruction if Vx != nn.
    SneImm { x: u4, nn: u8 },
    /// 5xy0 - Skip next instruction if Vx == Vy.
    SeReg { x: u4, y: u4 },
    /// 9xy0 - Skip next instruction if Vx != Vy.
    SneReg { x: u4, y: u4 },

    /// 6xnn - Set Vx = nn.
    LdImm { x: u4, nn: u8 },
    /// 7xnn - Set Vx = Vx + nn (no carry flag).
    AddImm { x: u4, nn: u8 },
    /// Annn - Set I = nnn.
    LdI { nnn: u16 },
    /// Fx1E - Set I = I + Vx, VF = range overflow.
    AddI { x: u4 },

    /// 8xyN - register-to-register arithmetic and logic.
    Alu { x: u4, y: u4, op: AluOp },
    /// Cxnn - Set Vx = random byte AND nn.
    Rnd { x: u4, nn: u8 },

    /// Dxyn - XOR an n-row sprite from memory at I onto the display.
    Drw { x: u4, y: u4, n: u4 },

    /// Ex9E - Skip next instruction if key Vx is pressed.
    Skp { x: u4 },
    /// ExA1 - Skip next instruction if key Vx is not pressed.
    Sknp { x: u4 },
    /// Fx0A - Block until a key press, store the key index in Vx.
    WaitKey { x: u4 },

    /// Fx07 - Set Vx = delay timer value.
    LdFromDt { x: u4 },
    /// Fx15 - Set delay timer = Vx.
    LdDt { x: u4 },
    /// Fx18 - Set sound timer = Vx.
    LdSt { x: u4 },

    /// Fx29 - Set I = address of the font glyph for digit Vx.
    LdFont { x: u4 },
    /// Fx33 - Store the three decimal digits of Vx at I, I+1, I+2.
    Bcd { x: u4 },

    /// Fx55 - Store V0..Vx in memory starting at I, then I = I + x + 1.
    StoreV { x: u4 },
    /// Fx65 - Load V0..Vx from memory starting at I, then I = I + x + 1.
    LoadV { x: u4 },

    /// Matched no instruction pattern.
    Unknown(u16),
}

/// Operation selector for the 8xyN instruction family.
#[derive(Debug, PartialEq, Eq)]
pub enum AluOp {
    /// 8xy0 - Vx = Vy
    Ld,
    /// 8xy1 - Vx = Vx OR Vy
    Or,
    /// 8xy2 - Vx = Vx AND Vy
    And,
    /// 8xy3 - Vx = Vx XOR Vy
    Xor,
    /// 8xy4 - Vx = Vx + Vy, VF = carry
    Add,
    /// 8xy5 - Vx = Vx - Vy, VF = no borrow
    Sub,
    /// 8xy6 - Vx = Vx >> 1, VF = shifted-out bit
    Shr,
    /// 8xy7 - Vx = Vy - Vx, VF = no borrow
    Subn,
    /// 8xyE - Vx = Vx << 1, VF = shifted-out bit
    Shl,
}

impl Opcode {
    /// Decode a raw 16-bit instruction word into an `Opcode` variant.
    ///
    /// Dispatch is on the top nibble (the instruction family); the 0x0, 0x8,
    /// 0xE and 0xF families are further selected by their low nibble or byte.
    pub fn decode(opcode: u16) -> Self {
        let nibble = (
            ((opcode & 0xF000) >> 12) as u8,
            ((opcode & 0x0F00) >> 8) as u8,
            ((opcode & 0x00F0) >> 4) as u8,
            (opcode & 0x000F) as u8,
        );

        let x = u4::new(nibble.1);
        let y = u4::new(nibble.2);
        let n = u4::new(nibble.3);
        let nn = (opcode & 0x00FF) as u8;
        let nnn = opcode & 0x0FFF;

        match (nibble.0, nibble.1, nibble.2, nibble.3) {
            (0x0, 0x0, 0xE, 0x0) => Opcode::Cls,
            (0x0, 0x0, 0xE, 0xE) => Opcode::Ret,
            (0x1, _, _, _) => Opcode::Jp { nnn },
            (0x2, _, _, _) => Opcode::Call { nnn },
            (0x3, _, _, _) => Opcode::SeImm { x, nn },
            (0x4, _, _, _) => Opcode::SneImm { x, nn },
            (0x5, _, _, 0x0) => Opcode::SeReg { x, y },
            (0x6, _, _, _) => Opcode::LdImm { x, nn },
            (0x7, _, _, _) => Opcode::AddImm { x, nn },
            (0x8, _, _, _) => Opcode::Alu {
                x,
                y,
                op: match nibble.3 {
                    0x0 => AluOp::Ld,
                    0x1 => AluOp::Or,
                    0x2 => AluOp::And,
                    0x3 => AluOp::Xor,
                    0x4 => AluOp::Add,
                    0x5 => AluOp::Sub,
                    0x6 => AluOp::Shr,
                    0x7 => AluOp::Subn,
                    0xE => AluOp::Shl,
                    _ => return Opcode::Unknown(opcode),
                },
            },
            (0x9, _, _, 0x0) => Opcode::SneReg { x, y },
            (0xA, _, _, _) => Opcode::LdI { nnn },
            (0xB, _, _, _) => Opcode::JpV0 { nnn },
            (0xC, _, _, _) => Opcode::Rnd { x, nn },
            (0xD, _, _, _) => Opcode::Drw { x, y, n },
            (0xE, _, 0x9, 0xE) => Opcode::Skp { x },
            (0xE, _, 0xA, 0x1) => Opcode::Sknp { x },
            (0xF, _, 0x0, 0x7) => Opcode::LdFromDt { x },
            (0xF, _, 0x0, 0xA) => Opcode::WaitKey { x },
            (0xF, _, 0x1, 0x5) => Opcode::LdDt { x },
            (0xF, _, 0x1, 0x8) => Opcode::LdSt { x },
            (0xF, _, 0x1, 0xE) => Opcode::AddI { x },
            (0xF, _, 0x2, 0x9) => Opcode::LdFont { x },
            (0xF, _, 0x3, 0x3) => Opcode::Bcd { x },
            (0xF, _, 0x5, 0x5) => Opcode::StoreV { x },
            (0xF, _, 0x6, 0x5) => Opcode::LoadV { x },

            _ => Opcode::Unknown(opcode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operand_fields_come_from_fixed_bit_positions() {
        assert_eq!(
            Opcode::decode(0x6A05),
            Opcode::LdImm {
                x: u4::new(0xA),
                nn: 0x05
            }
        );
        assert_eq!(Opcode::decode(0x1234), Opcode::Jp { nnn: 0x234 });
        assert_eq!(
            Opcode::decode(0xD12F),
            Opcode::Drw {
                x: u4::new(1),
                y: u4::new(2),
                n: u4::new(0xF)
            }
        );
    }

    #[test]
    fn f_family_dispatches_on_low_byte() {
        // Every Fxkk instruction must route, not just one literal value
        assert_eq!(Opcode::decode(0xF007), Opcode::LdFromDt { x: u4::new(0) });
        assert_eq!(Opcode::decode(0xFA07), Opcode::LdFromDt { x: u4::new(0xA) });
        assert_eq!(Opcode::decode(0xF318), Opcode::LdSt { x: u4::new(3) });
        assert_eq!(Opcode::decode(0xF165), Opcode::LoadV { x: u4::new(1) });
    }

    #[test]
    fn unmatched_patterns_decode_to_unknown() {
        assert_eq!(Opcode::decode(0x00FF), Opcode::Unknown(0x00FF));
        assert_eq!(Opcode::decode(0x5AB1), Opcode::Unknown(0x5AB1));
        assert_eq!(Opcode::decode(0x8AB9), Opcode::Unknown(0x8AB9));
        assert_eq!(Opcode::decode(0xE19F), Opcode::Unknown(0xE19F));
        assert_eq!(Opcode::decode(0xFFFF), Opcode::Unknown(0xFFFF));
    }
}
