//! `tracing` targets used across live select.
//!
//! The crates only emit events; the host decides where they go. A test or a
//! demo binary typically installs `tracing_subscriber::fmt` with an
//! `EnvFilter`, after which `RUST_LOG=live_select::channel=debug` shows pushed
//! and delivered events and nothing else.

/// One constant per subsystem, matching the module path that logs under it.
pub mod targets {
    pub const CORE: &str = "live_select_core";
    pub const SCHEDULER: &str = "live_select_core::scheduler";
    pub const DEBOUNCE: &str = "live_select_core::debounce";
    pub const SIGNAL: &str = "live_select_core::signal";
    /// DOM events, pushed payloads and teardown of a single widget.
    pub const CONTROLLER: &str = "live_select::controller";
    /// Outbound pushes and inbound deliveries.
    pub const CHANNEL: &str = "live_select::channel";
    pub const NAVIGATION: &str = "live_select::navigation";
    /// Rejected root attributes.
    pub const CONFIG: &str = "live_select::config";
}
