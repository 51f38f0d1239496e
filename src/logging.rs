//! Subscriber setup for binaries and demos. The library itself only emits `tracing` events.
use tracing_subscriber::EnvFilter;

/// Initializes a `tracing_subscriber` using `TNG_LOG` first, then `RUST_LOG`, then `info`.
///
/// Field conventions of the emitted events:
/// - `split` on every split-generation event.
/// - `file` on file selection, eviction and skipped records.
/// - `object` (the `EXTNAME_ORIGIN_SIMTAG_SNAPNUM_SUBHALO` key) on ledger decisions.
///
/// Ledger rejects are logged at `trace`, file selection and eviction at `debug`.
pub fn init_tracing() {
    let filter = env_filter();
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Like [`init_tracing`], but does nothing if a global subscriber is already set.
pub fn try_init_tracing() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .try_init()
        .is_ok()
}

pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env("TNG_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
