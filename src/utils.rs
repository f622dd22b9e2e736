pub fn set_panic_hook() {
    // When the `console_error_panic_hook` feature is enabled, we can call the
    // `set_panic_hook` function at least once during initialization, and then
    // we will get better error messages if our code ever panics.
    //
    // For more details see
    // https://github.com/rustwasm/console_error_panic_hook#readme
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

extern crate web_sys;

use log::{Level, Log, Metadata, Record};

/// `log` backend that writes to the browser console, picking the console method that matches
/// the record's level.
pub struct ConsoleLogger {
    level: Level,
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = wasm_bindgen::JsValue::from_str(&format_record(record));
        match record.level() {
            Level::Error => web_sys::console::error_1(&line),
            Level::Warn => web_sys::console::warn_1(&line),
            Level::Info => web_sys::console::info_1(&line),
            Level::Debug | Level::Trace => web_sys::console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
static LOGGER: ConsoleLogger = ConsoleLogger { level: Level::Debug };

/// Route `log` records to the browser console. Only the first call installs the logger; on
/// other targets this does nothing, leaving the choice of logger to the host binary.
pub fn init_console_logger() {
    #[cfg(target_arch = "wasm32")]
    {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(log::LevelFilter::Debug);
        }
    }
}

fn format_record(record: &Record) -> String {
    format!("[{}] {}: {}", record.level(), record.target(), record.args())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_carry_level_and_target() {
        let line = format_record(
            &Record::builder()
                .args(format_args!("skipping unknown opcode {:#06X}", 0xF0FFu16))
                .level(Level::Warn)
                .target("chip8_vm::machine")
                .build(),
        );
        assert_eq!(line, "[WARN] chip8_vm::machine: skipping unknown opcode 0xF0FF");
    }

    #[test]
    fn trace_is_filtered_out() {
        let metadata = Metadata::builder().level(Level::Trace).build();
        assert!(!LOGGER.enabled(&metadata));
        let metadata = Metadata::builder().level(Level::Warn).build();
        assert!(LOGGER.enabled(&metadata));
    }
}
