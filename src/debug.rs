#[cfg(not(feature = "tracing"))]
fn enabled() -> bool {
    std::env::var("MMCTESTER_DEBUG")
        .map(|v| !v.is_empty())
        .unwrap_or(false)
}

/// Log one wire line (`TX`/`RX`) without its terminator.
pub(crate) fn dump_line(direction: &str, line: &[u8]) {
    let text = String::from_utf8_lossy(line);
    let text = text.trim_end();

    #[cfg(feature = "tracing")]
    tracing::trace!(target: "mmctester::wire", "I2C {direction} [{text}]");

    #[cfg(not(feature = "tracing"))]
    if enabled() {
        eprintln!("I2C {direction} [{text}]");
    }
}

/// Log a line dropped before it reached the receive queue.
pub(crate) fn discarded(line: &[u8], reason: impl std::fmt::Display) {
    #[cfg(feature = "tracing")]
    tracing::debug!(
        target: "mmctester::wire",
        line = %String::from_utf8_lossy(line).trim_end(),
        %reason,
        "discarding line"
    );

    #[cfg(not(feature = "tracing"))]
    if enabled() {
        eprintln!(
            "discarding line [{}]: {reason}",
            String::from_utf8_lossy(line).trim_end()
        );
    }
}
