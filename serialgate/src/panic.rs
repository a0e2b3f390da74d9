//! Panic reporting.
//!
//! Installs a panic hook that writes the panicking thread, location and
//! message both to stderr and through `tracing`, so a panic in the worker
//! thread also lands in the trace file. The original hook runs afterwards.
//!
//! Panics inside `Engine::compute` are caught by the worker loop and only
//! fail their request; the hook still reports them.

use std::io::Write;
use std::panic::{self, PanicHookInfo};
use std::sync::Once;

static INSTALL: Once = Once::new();

/// Initialize the panic handler.
///
/// Safe to call more than once; only the first call installs the hook.
pub fn init() {
    INSTALL.call_once(|| {
        let original_hook = panic::take_hook();

        panic::set_hook(Box::new(move |info: &PanicHookInfo<'_>| {
            handle_panic(info);
            original_hook(info);
        }));
    });
}

/// What is reported about one panic.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PanicReport {
    thread: String,
    location: Option<String>,
    message: String,
}

impl PanicReport {
    fn from_info(info: &PanicHookInfo<'_>) -> Self {
        let thread = std::thread::current()
            .name()
            .unwrap_or("<unnamed>")
            .to_string();
        let location = info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()));
        let message = if let Some(message) = info.payload().downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = info.payload().downcast_ref::<String>() {
            message.clone()
        } else {
            "<non-string payload>".to_string()
        };

        Self {
            thread,
            location,
            message,
        }
    }
}

fn handle_panic(info: &PanicHookInfo<'_>) {
    let report = PanicReport::from_info(info);

    tracing::error!(
        thread = %report.thread,
        location = report.location.as_deref().unwrap_or("unknown"),
        message = %report.message,
        "Panic"
    );

    // Write to stderr directly since logging may be broken
    let mut stderr = std::io::stderr().lock();
    let _ = writeln!(stderr);
    let _ = writeln!(stderr, "━━━ serialgate panic ━━━");
    let _ = writeln!(stderr, "Thread:   {}", report.thread);
    if let Some(location) = &report.location {
        let _ = writeln!(stderr, "Location: {}", location);
    }
    let _ = writeln!(stderr, "Message:  {}", report.message);
    let _ = writeln!(stderr);
    let _ = stderr.flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init();
        init();
    }

    #[test]
    fn test_hook_keeps_unwinding_behavior() {
        init();

        let handle = std::thread::Builder::new()
            .name("panic-hook-test".to_string())
            .spawn(|| std::panic::catch_unwind(|| panic!("boom {}", 7)).is_err())
            .unwrap();

        assert!(handle.join().unwrap());
    }

    #[test]
    fn test_uncaught_panic_still_reaches_join() {
        init();

        let handle = std::thread::Builder::new()
            .name("panic-hook-join".to_string())
            .spawn(|| panic!("worker gone"))
            .unwrap();

        let payload = handle.join().unwrap_err();
        assert_eq!(payload.downcast_ref::<&str>(), Some(&"worker gone"));
    }
}
