//! Tracing subscriber setup for `camctl` and embedding applications.
//!
//! Device round-trips log at `debug`, session and live-view transitions at
//! `info`, swallowed cleanup failures at `warn`, raw device events at `trace`.

use std::io::{self, IsTerminal};

use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Filter directive used when `RUST_LOG` is not set.
///
/// `verbose`: 0 = info, 1 = debug, 2+ = trace. `quiet` wins over `verbose`.
pub fn default_directive(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "camsession=error";
    }
    match verbose {
        0 => "camsession=info",
        1 => "camsession=debug",
        _ => "camsession=trace",
    }
}

/// Install the global subscriber. Logs always go to stderr.
///
/// | Mode | TTY | Output |
/// |------|-----|--------|
/// | JSON | any | JSON lines |
/// | Human | yes | Colored, with event thread names |
/// | Human | no | Compact plain text |
///
/// Thread names are shown in human mode because device events arrive on the
/// SDK's thread rather than the owner's.
pub fn init_logging(json: bool, verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    if json {
        let fmt_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_thread_names(true)
            .with_span_events(FmtSpan::NONE)
            .with_writer(io::stderr);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    } else if io::stderr().is_terminal() {
        let fmt_layer = fmt::layer()
            .with_target(false)
            .with_thread_names(true)
            .with_span_events(FmtSpan::NONE)
            .with_writer(io::stderr);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    } else {
        let fmt_layer = fmt::layer()
            .with_ansi(false)
            .with_target(false)
            .with_span_events(FmtSpan::NONE)
            .compact()
            .with_writer(io::stderr);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}
