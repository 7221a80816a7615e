//! # Observability & Tracing
//!
//! Structured logging for actor systems built on this crate.
//!
//! Actors log their lifecycle (start, shutdown with final store size) and every request with the
//! `entity_type` field, so the module path is hidden (`with_target(false)`) to keep lines short.
//!
//! ```bash
//! # Lifecycle and successful mutations
//! RUST_LOG=info cargo run
//!
//! # Full payloads, list filters and feed activity
//! RUST_LOG=debug cargo run
//!
//! # One crate only
//! RUST_LOG=parcel_tracking=debug cargo run
//! ```

/// Installs the global `fmt` subscriber, filtered by `RUST_LOG`.
///
/// Call once, at the top of `main`. Installing a second global subscriber panics.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
