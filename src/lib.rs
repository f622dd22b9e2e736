//! A CHIP-8 virtual machine.
//!
//! [`Machine`] owns the whole machine state and executes one instruction per
//! [`step`](Machine::step). Loading ROM bytes, presenting the screen, reading the keyboard and
//! pacing the machine are left to the host. [`Emulator`] packages the machine for a JavaScript
//! host through `wasm-bindgen`.

mod error;
mod font;
mod instruction;
mod machine;
mod quirks;
mod utils;

use wasm_bindgen::prelude::*;

pub use error::{MachineError, Result};
pub use font::{FONT, FONT_ADDR};
pub use instruction::Instruction;
pub use machine::{Machine, Step};
pub use quirks::{KeyWait, Quirks};

/// Bytes of addressable memory.
pub const MEM_SIZE: usize = 4096;
/// Bytes reserved for the interpreter; programs are loaded right after them.
pub const MEM_RESERVED: usize = 512;
/// Largest program that fits in memory.
pub const MAX_ROM_SIZE: usize = MEM_SIZE - MEM_RESERVED;
pub const SCREEN_WIDTH: usize = 64;
pub const SCREEN_HEIGHT: usize = 32;
/// Nesting limit for subroutine calls.
pub const STACK_DEPTH: usize = 16;
/// Keys on the hex keypad, 0x0 through 0xF.
pub const KEY_COUNT: usize = 16;

#[wasm_bindgen]
/// A CHIP-8 machine exported to JavaScript.
///
/// The host drives it from its animation loop: call `run_frame` (or `step` and `tick_timers`)
/// once per 60HZ frame, push keyboard state with `update_key_state`, redraw from
/// `get_screen_buffer` when `handle_screen_dirty_flag` returns true and beep while
/// `should_play_tone` is true. Machine errors are thrown as strings.
pub struct Emulator {
    machine: Machine,
}

#[wasm_bindgen]
impl Emulator {
    /// Construct a machine at the initial entry state, with rom bytes loaded at the entry point
    /// in memory.
    #[wasm_bindgen(constructor)]
    pub fn new(rom: &[u8], quirks: Quirks) -> std::result::Result<Emulator, JsValue> {
        utils::set_panic_hook();
        utils::init_console_logger();

        let mut machine = Machine::with_quirks(quirks);
        machine.load_program(rom).map_err(to_js)?;

        Ok(Emulator { machine })
    }

    /// Decode and execute one instruction. A no-op while waiting for a key press.
    pub fn step(&mut self) -> std::result::Result<(), JsValue> {
        self.machine.step().map(|_| ()).map_err(to_js)
    }

    /// Execute `steps` instructions, then tick the timers once.
    pub fn run_frame(&mut self, steps: u32) -> std::result::Result<(), JsValue> {
        self.machine.run_frame(steps).map_err(to_js)
    }

    /// Tick internal cpu timers. Must be called at 60HZ.
    pub fn tick_timers(&mut self) {
        self.machine.tick_timers();
    }

    /// Get a pointer to the screen buffer memory, used from the JS side to render the screen.
    /// The buffer holds `SCREEN_WIDTH * SCREEN_HEIGHT` one-byte booleans, row-major.
    pub fn get_screen_buffer(&self) -> *const bool {
        self.machine.display().as_ptr()
    }

    pub fn screen_width(&self) -> usize {
        SCREEN_WIDTH
    }

    pub fn screen_height(&self) -> usize {
        SCREEN_HEIGHT
    }

    /// Returns whether or not the screen dirty, and if it is, sets it to false.
    pub fn handle_screen_dirty_flag(&mut self) -> bool {
        self.machine.take_dirty()
    }

    /// Update the internal key state to the provided key state, one byte per key, non-zero
    /// meaning pressed. `new_key_state` must be of length 16.
    pub fn update_key_state(&mut self, new_key_state: &[u8]) -> std::result::Result<(), JsValue> {
        let keys = key_state_from_bytes(new_key_state).ok_or_else(|| {
            JsValue::from_str(&format!(
                "expected {} key states, got {}",
                KEY_COUNT,
                new_key_state.len()
            ))
        })?;
        self.machine.set_keys(&keys);
        Ok(())
    }

    /// Press or release a single key.
    pub fn set_key(&mut self, index: usize, pressed: bool) -> std::result::Result<(), JsValue> {
        self.machine.set_key(index, pressed).map_err(to_js)
    }

    /// Returns true if the machine is blocked on `Fx0A`.
    pub fn is_waiting_for_keypress(&self) -> bool {
        self.machine.is_waiting_for_key()
    }

    /// Returns true if the emulator should play a tone
    pub fn should_play_tone(&self) -> bool {
        self.machine.sound_active()
    }

    pub fn program_counter(&self) -> u16 {
        self.machine.pc()
    }
}

// `wasm_bindgen` doesn't support passing boolean arrays, so the host passes bytes.
fn key_state_from_bytes(bytes: &[u8]) -> Option<[bool; KEY_COUNT]> {
    if bytes.len() != KEY_COUNT {
        return None;
    }

    let mut keys = [false; KEY_COUNT];
    for (key, &byte) in keys.iter_mut().zip(bytes) {
        *key = byte != 0;
    }
    Some(keys)
}

fn to_js(err: MachineError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_state_bytes_map_to_pressed_keys() {
        let mut bytes = [0u8; KEY_COUNT];
        bytes[3] = 1;
        bytes[0xF] = 0xFF;

        let keys = key_state_from_bytes(&bytes).unwrap();
        assert!(keys[3]);
        assert!(keys[0xF]);
        assert_eq!(keys.iter().filter(|&&k| k).count(), 2);
    }

    #[test]
    fn key_state_of_the_wrong_length_is_rejected() {
        assert_eq!(key_state_from_bytes(&[0; 15]), None);
        assert_eq!(key_state_from_bytes(&[0; 17]), None);
    }

    #[test]
    fn rom_area_fills_the_rest_of_memory() {
        assert_eq!(MAX_ROM_SIZE, 3584);
        assert_eq!(MEM_RESERVED, 0x200);
    }
}
