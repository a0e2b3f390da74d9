//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! This module contains the `to_config_string()` function that produces
//! the commented INI representation written to `config.ini`.

use std::fmt::Write as _;
use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let mut out = format!(
        r#"[queue]
; Maximum number of requests waiting for the compute worker (default: 1024).
; Requests arriving while the queue is full are rejected immediately.
capacity = {}

[worker]
; Name of the dedicated worker thread (shows up in logs and panic reports).
thread_name = {}

[logging]
; Trace destination for admission, dequeue, compute and delivery events.
file = {}
; Mirror log output to stderr (true/false).
console = {}

[engine]
; Free-form settings handed to the engine factory.
; The built-in demo engine understands:
;   mode             - upper, reverse or echo
;   delay_ms         - simulated compute time per request
;   warmup_ms        - simulated engine construction time
;   fail_marker      - requests containing this text fail
;   interrupt_marker - requests containing this text stop the worker
"#,
        config.queue.capacity,
        config.worker.thread_name,
        path_to_string(&config.logging.file),
        config.logging.console,
    );

    for (key, value) in config.engine.iter() {
        let _ = writeln!(out, "{} = {}", key, value);
    }

    out
}

/// Convert a path to a string, using ~ for the home directory.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
