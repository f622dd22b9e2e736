//! Test suite for the Web and headless browsers.

#![cfg(target_arch = "wasm32")]

extern crate wasm_bindgen_test;
use wasm_bindgen_test::*;

use chip8_vm::{Emulator, Quirks, KEY_COUNT, MAX_ROM_SIZE};

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn runs_a_frame_and_reports_the_screen() {
    // CLS; JP 0x202
    let mut emulator = Emulator::new(&[0x00, 0xE0, 0x12, 0x02], Quirks::new()).unwrap();
    emulator.run_frame(10).unwrap();

    assert!(emulator.handle_screen_dirty_flag());
    assert!(!emulator.handle_screen_dirty_flag());
    assert_eq!(emulator.program_counter(), 0x202);
    assert!(!emulator.get_screen_buffer().is_null());
}

#[wasm_bindgen_test]
fn oversized_rom_is_rejected() {
    assert!(Emulator::new(&vec![0; MAX_ROM_SIZE + 1], Quirks::new()).is_err());
}

#[wasm_bindgen_test]
fn key_state_unblocks_wait_for_key() {
    // LD V0, K
    let mut emulator = Emulator::new(&[0xF0, 0x0A], Quirks::new()).unwrap();
    emulator.step().unwrap();
    assert!(emulator.is_waiting_for_keypress());

    let mut keys = [0u8; KEY_COUNT];
    keys[9] = 1;
    emulator.update_key_state(&keys).unwrap();
    emulator.step().unwrap();
    assert!(!emulator.is_waiting_for_keypress());
    assert!(emulator.update_key_state(&keys[..4]).is_err());
}

#[wasm_bindgen_test]
fn sound_follows_the_sound_timer() {
    // LD V0, 1; LD ST, V0
    let mut emulator = Emulator::new(&[0x60, 0x01, 0xF0, 0x18], Quirks::new()).unwrap();
    emulator.step().unwrap();
    emulator.step().unwrap();
    assert!(emulator.should_play_tone());
    emulator.tick_timers();
    assert!(!emulator.should_play_tone());
}

#[wasm_bindgen_test]
fn machine_errors_surface_as_exceptions() {
    // RET with an empty stack
    let mut emulator = Emulator::new(&[0x00, 0xEE], Quirks::new()).unwrap();
    assert!(emulator.step().is_err());
    assert!(emulator.set_key(KEY_COUNT, true).is_err());
}
