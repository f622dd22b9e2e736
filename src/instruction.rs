use std::fmt;

/// A decoded CHIP-8 instruction.
///
/// Register operands are indices into V0..VF, `addr` is a 12-bit memory address and `byte` /
/// `nibble` are immediates. Every 16-bit word decodes to exactly one variant; words outside of
/// the instruction set become `Unknown`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// `0nnn` SYS addr
    Sys { addr: u16 },
    /// `00E0` CLS
    Cls,
    /// `00EE` RET
    Ret,
    /// `1nnn` JP addr
    Jp { addr: u16 },
    /// `2nnn` CALL addr
    Call { addr: u16 },
    /// `3xkk` SE Vx, byte
    SeByte { x: u8, byte: u8 },
    /// `4xkk` SNE Vx, byte
    SneByte { x: u8, byte: u8 },
    /// `5xy0` SE Vx, Vy
    SeReg { x: u8, y: u8 },
    /// `6xkk` LD Vx, byte
    LdByte { x: u8, byte: u8 },
    /// `7xkk` ADD Vx, byte
    AddByte { x: u8, byte: u8 },
    /// `8xy0` LD Vx, Vy
    LdReg { x: u8, y: u8 },
    /// `8xy1` OR Vx, Vy
    Or { x: u8, y: u8 },
    /// `8xy2` AND Vx, Vy
    And { x: u8, y: u8 },
    /// `8xy3` XOR Vx, Vy
    Xor { x: u8, y: u8 },
    /// `8xy4` ADD Vx, Vy
    AddReg { x: u8, y: u8 },
    /// `8xy5` SUB Vx, Vy
    Sub { x: u8, y: u8 },
    /// `8xy6` SHR Vx, Vy
    Shr { x: u8, y: u8 },
    /// `8xy7` SUBN Vx, Vy
    Subn { x: u8, y: u8 },
    /// `8xyE` SHL Vx, Vy
    Shl { x: u8, y: u8 },
    /// `9xy0` SNE Vx, Vy
    SneReg { x: u8, y: u8 },
    /// `Annn` LD I, addr
    LdI { addr: u16 },
    /// `Bnnn` JP V0, addr
    JpV0 { addr: u16 },
    /// `Cxkk` RND Vx, byte
    Rnd { x: u8, byte: u8 },
    /// `Dxyn` DRW Vx, Vy, nibble
    Drw { x: u8, y: u8, nibble: u8 },
    /// `Ex9E` SKP Vx
    Skp { x: u8 },
    /// `ExA1` SKNP Vx
    Sknp { x: u8 },
    /// `Fx07` LD Vx, DT
    LdVxDt { x: u8 },
    /// `Fx0A` LD Vx, K
    LdVxK { x: u8 },
    /// `Fx15` LD DT, Vx
    LdDtVx { x: u8 },
    /// `Fx18` LD ST, Vx
    LdStVx { x: u8 },
    /// `Fx1E` ADD I, Vx
    AddI { x: u8 },
    /// `Fx29` LD F, Vx
    LdF { x: u8 },
    /// `Fx33` LD B, Vx
    LdB { x: u8 },
    /// `Fx55` LD [I], Vx
    Store { x: u8 },
    /// `Fx65` LD Vx, [I]
    Load { x: u8 },
    /// Any word that is not a CHIP-8 instruction.
    Unknown(u16),
}

impl Instruction {
    /// Decode a big-endian instruction word. The instruction type is determined by the most
    /// significant nibble, and for the 0, 8, E and F families by the low nibble or byte.
    pub fn decode(instr: u16) -> Self {
        use Instruction::*;

        let addr = decode_instr_addr(instr);
        let x = decode_instr_x_reg(instr);
        let y = decode_instr_y_reg(instr);
        let byte = decode_instr_byte_imm(instr);
        let nibble = decode_instr_nibble_imm(instr);

        match instr >> 12 {
            0x0 => match instr {
                0x00E0 => Cls,
                0x00EE => Ret,
                _ => Sys { addr },
            },
            0x1 => Jp { addr },
            0x2 => Call { addr },
            0x3 => SeByte { x, byte },
            0x4 => SneByte { x, byte },
            0x5 if nibble == 0 => SeReg { x, y },
            0x6 => LdByte { x, byte },
            0x7 => AddByte { x, byte },
            0x8 => match nibble {
                0x0 => LdReg { x, y },
                0x1 => Or { x, y },
                0x2 => And { x, y },
                0x3 => Xor { x, y },
                0x4 => AddReg { x, y },
                0x5 => Sub { x, y },
                0x6 => Shr { x, y },
                0x7 => Subn { x, y },
                0xE => Shl { x, y },
                _ => Unknown(instr),
            },
            0x9 if nibble == 0 => SneReg { x, y },
            0xA => LdI { addr },
            0xB => JpV0 { addr },
            0xC => Rnd { x, byte },
            0xD => Drw { x, y, nibble },
            0xE => match byte {
                0x9E => Skp { x },
                0xA1 => Sknp { x },
                _ => Unknown(instr),
            },
            0xF => match byte {
                0x07 => LdVxDt { x },
                0x0A => LdVxK { x },
                0x15 => LdDtVx { x },
                0x18 => LdStVx { x },
                0x1E => AddI { x },
                0x29 => LdF { x },
                0x33 => LdB { x },
                0x55 => Store { x },
                0x65 => Load { x },
                _ => Unknown(instr),
            },
            _ => Unknown(instr),
        }
    }
}

impl From<u16> for Instruction {
    fn from(instr: u16) -> Self {
        Instruction::decode(instr)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;

        match *self {
            Sys { addr } => write!(f, "SYS {:#05X}", addr),
            Cls => write!(f, "CLS"),
            Ret => write!(f, "RET"),
            Jp { addr } => write!(f, "JP {:#05X}", addr),
            Call { addr } => write!(f, "CALL {:#05X}", addr),
            SeByte { x, byte } => write!(f, "SE V{:X}, {:#04X}", x, byte),
            SneByte { x, byte } => write!(f, "SNE V{:X}, {:#04X}", x, byte),
            SeReg { x, y } => write!(f, "SE V{:X}, V{:X}", x, y),
            LdByte { x, byte } => write!(f, "LD V{:X}, {:#04X}", x, byte),
            AddByte { x, byte } => write!(f, "ADD V{:X}, {:#04X}", x, byte),
            LdReg { x, y } => write!(f, "LD V{:X}, V{:X}", x, y),
            Or { x, y } => write!(f, "OR V{:X}, V{:X}", x, y),
            And { x, y } => write!(f, "AND V{:X}, V{:X}", x, y),
            Xor { x, y } => write!(f, "XOR V{:X}, V{:X}", x, y),
            AddReg { x, y } => write!(f, "ADD V{:X}, V{:X}", x, y),
            Sub { x, y } => write!(f, "SUB V{:X}, V{:X}", x, y),
            Shr { x, y } => write!(f, "SHR V{:X}, V{:X}", x, y),
            Subn { x, y } => write!(f, "SUBN V{:X}, V{:X}", x, y),
            Shl { x, y } => write!(f, "SHL V{:X}, V{:X}", x, y),
            SneReg { x, y } => write!(f, "SNE V{:X}, V{:X}", x, y),
            LdI { addr } => write!(f, "LD I, {:#05X}", addr),
            JpV0 { addr } => write!(f, "JP V0, {:#05X}", addr),
            Rnd { x, byte } => write!(f, "RND V{:X}, {:#04X}", x, byte),
            Drw { x, y, nibble } => write!(f, "DRW V{:X}, V{:X}, {}", x, y, nibble),
            Skp { x } => write!(f, "SKP V{:X}", x),
            Sknp { x } => write!(f, "SKNP V{:X}", x),
            LdVxDt { x } => write!(f, "LD V{:X}, DT", x),
            LdVxK { x } => write!(f, "LD V{:X}, K", x),
            LdDtVx { x } => write!(f, "LD DT, V{:X}", x),
            LdStVx { x } => write!(f, "LD ST, V{:X}", x),
            AddI { x } => write!(f, "ADD I, V{:X}", x),
            LdF { x } => write!(f, "LD F, V{:X}", x),
            LdB { x } => write!(f, "LD B, V{:X}", x),
            Store { x } => write!(f, "LD [I], V{:X}", x),
            Load { x } => write!(f, "LD V{:X}, [I]", x),
            Unknown(instr) => write!(f, "DW {:#06X}", instr),
        }
    }
}

/// Decodes a memory address from a CHIP-8 instruction
fn decode_instr_addr(instr: u16) -> u16 {
    instr & 0x0FFF
}

/// Decodes the first register from a CHIP-8 instruction
fn decode_instr_x_reg(instr: u16) -> u8 {
    ((instr & 0x0F00) >> 8) as u8
}

/// Decodes the second register from a CHIP-8 instruction
fn decode_instr_y_reg(instr: u16) -> u8 {
    ((instr & 0x00F0) >> 4) as u8
}

/// Decodes a byte-sized immediate from a CHIP-8 instruction
fn decode_instr_byte_imm(instr: u16) -> u8 {
    (instr & 0x00FF) as u8
}

/// Decodes a nibble-sized immediate from a CHIP-8 instruction
fn decode_instr_nibble_imm(instr: u16) -> u8 {
    (instr & 0x000F) as u8
}

#[cfg(test)]
mod tests {
    use super::Instruction::*;
    use super::*;

    #[test]
    fn decodes_fixed_words() {
        assert_eq!(Instruction::decode(0x00E0), Cls);
        assert_eq!(Instruction::decode(0x00EE), Ret);
        assert_eq!(Instruction::decode(0x0123), Sys { addr: 0x123 });
    }

    #[test]
    fn decodes_operands() {
        assert_eq!(Instruction::decode(0x1ABC), Jp { addr: 0xABC });
        assert_eq!(Instruction::decode(0x2ABC), Call { addr: 0xABC });
        assert_eq!(Instruction::decode(0x3A42), SeByte { x: 0xA, byte: 0x42 });
        assert_eq!(Instruction::decode(0x8AB4), AddReg { x: 0xA, y: 0xB });
        assert_eq!(Instruction::decode(0xD125), Drw { x: 1, y: 2, nibble: 5 });
        assert_eq!(Instruction::decode(0xBFFF), JpV0 { addr: 0xFFF });
    }

    #[test]
    fn decodes_sub_operations() {
        assert_eq!(Instruction::decode(0x812E), Shl { x: 1, y: 2 });
        assert_eq!(Instruction::decode(0xE39E), Skp { x: 3 });
        assert_eq!(Instruction::decode(0xE3A1), Sknp { x: 3 });
        assert_eq!(Instruction::decode(0xF40A), LdVxK { x: 4 });
        assert_eq!(Instruction::decode(0xF433), LdB { x: 4 });
        assert_eq!(Instruction::decode(0xF455), Store { x: 4 });
        assert_eq!(Instruction::decode(0xF465), Load { x: 4 });
    }

    #[test]
    fn rejects_words_outside_the_instruction_set() {
        for &word in &[0x5121, 0x9AB3, 0x8AB8, 0x8ABF, 0xE19F, 0xF000, 0xF1FF] {
            assert_eq!(Instruction::decode(word), Unknown(word), "{:#06X}", word);
        }
    }

    #[test]
    fn counts_every_encoding_in_the_instruction_set() {
        let known = (0..=0xFFFFu16)
            .filter(|&word| Instruction::decode(word) != Unknown(word))
            .count();
        // Gaps: 5xyN/9xyN with N != 0, 7 unused ALU nibbles, 254 E bytes, 247 F bytes.
        let gaps = 2 * 0xF00 + 7 * 0x100 + 254 * 0x10 + 247 * 0x10;
        assert_eq!(known, 0x10000 - gaps);
    }

    #[test]
    fn disassembles_to_mnemonics() {
        assert_eq!(Instruction::decode(0x00E0).to_string(), "CLS");
        assert_eq!(Instruction::decode(0x12A4).to_string(), "JP 0x2A4");
        assert_eq!(Instruction::decode(0x631F).to_string(), "LD V3, 0x1F");
        assert_eq!(Instruction::decode(0xD015).to_string(), "DRW V0, V1, 5");
        assert_eq!(Instruction::decode(0xFA55).to_string(), "LD [I], VA");
        assert_eq!(Instruction::decode(0xF0FF).to_string(), "DW 0xF0FF");
    }
}
