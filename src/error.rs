use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MachineError>;

/// Conditions that stop the machine from making progress.
///
/// `RomTooLarge` and `InvalidKey` are caller errors and leave the machine untouched. The
/// remaining variants are raised by `step` and mean the running program is corrupt; the driver
/// should stop stepping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MachineError {
    #[error("ROM is too large ({size} bytes), max size is {max} bytes")]
    RomTooLarge { size: usize, max: usize },

    #[error("program counter {pc:#06X} is outside of memory")]
    PcOutOfBounds { pc: u16 },

    #[error("call at {pc:#06X} exceeds the maximum call depth")]
    StackOverflow { pc: u16 },

    #[error("return at {pc:#06X} with an empty call stack")]
    StackUnderflow { pc: u16 },

    #[error("unknown opcode {opcode:#06X} at {pc:#06X}")]
    UnknownOpcode { opcode: u16, pc: u16 },

    #[error("key index {index:#X} is not on the hex keypad")]
    InvalidKey { index: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_render_addresses_in_hex() {
        let err = MachineError::UnknownOpcode { opcode: 0x5121, pc: 0x2a0 };
        assert_eq!(err.to_string(), "unknown opcode 0x5121 at 0x02A0");

        let err = MachineError::RomTooLarge { size: 4000, max: 3584 };
        assert_eq!(err.to_string(), "ROM is too large (4000 bytes), max size is 3584 bytes");
    }
}
