use wasm_bindgen::prelude::*;

/// How `Fx0A` decides that the key it waits for has arrived.
#[wasm_bindgen]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyWait {
    /// The instruction completes as soon as any key is down.
    Press = 0,
    /// The instruction latches the first key that goes down and completes once it is released,
    /// like the COSMAC VIP interpreter.
    Release = 1,
}

impl Default for KeyWait {
    fn default() -> Self {
        KeyWait::Press
    }
}

/// Options that change how some instructions operate. Interpreters on different platforms
/// disagree on these, and ROMs written for one platform may depend on its behaviour.
///
/// The default follows the modern consensus: in-place shifts, I untouched by load/store,
/// wrapping sprites, lenient decoding.
#[wasm_bindgen]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Quirks {
    /// `8xy6`/`8xyE` shift Vy and store the result in Vx, instead of shifting Vx in place.
    pub shift_uses_vy: bool,
    /// `Fx55`/`Fx65` leave I pointing after the last register transferred.
    pub load_store_increments_i: bool,
    /// `Fx1E` sets VF to 1 when I + Vx leaves the 12-bit address space, 0 otherwise.
    pub add_index_sets_vf: bool,
    /// Sprite pixels past the right or bottom edge are dropped instead of wrapping around.
    pub clip_sprites: bool,
    /// Unknown opcodes stop the machine instead of being skipped.
    pub strict_decoding: bool,
    /// Completion rule for `Fx0A`.
    pub key_wait: KeyWait,
}

#[wasm_bindgen]
impl Quirks {
    /// The default quirk set, for hosts that can't call `Default`.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Behaviour of the original COSMAC VIP interpreter.
    pub fn cosmac_vip() -> Self {
        Quirks {
            shift_uses_vy: true,
            load_store_increments_i: true,
            add_index_sets_vf: false,
            clip_sprites: true,
            strict_decoding: false,
            key_wait: KeyWait::Release,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_lenient_and_modern() {
        let quirks = Quirks::new();
        assert!(!quirks.shift_uses_vy);
        assert!(!quirks.load_store_increments_i);
        assert!(!quirks.add_index_sets_vf);
        assert!(!quirks.clip_sprites);
        assert!(!quirks.strict_decoding);
        assert_eq!(quirks.key_wait, KeyWait::Press);
    }

    #[test]
    fn cosmac_vip_waits_for_release() {
        assert_eq!(Quirks::cosmac_vip().key_wait, KeyWait::Release);
    }
}
