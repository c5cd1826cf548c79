// SERENE_TRACE=1 (or --trace) gated debug tracing (stderr only)

use std::sync::atomic::{AtomicBool, Ordering};

static TRACE_ENABLED: AtomicBool = AtomicBool::new(false);

pub fn enable() {
    TRACE_ENABLED.store(true, Ordering::Relaxed);
}

pub fn enabled() -> bool {
    TRACE_ENABLED.load(Ordering::Relaxed) || std::env::var_os("SERENE_TRACE").is_some()
}

pub fn trace(msg: &str) {
    if enabled() {
        eprintln!("[TRACE] {}", msg);
    }
}
