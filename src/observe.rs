use std::time::Duration;

use crate::error::Error;
use crate::queue::PendingFrameQueue;

pub(crate) fn record_ok(netfn: u8, cmd: u8, rq_seq: u8, attempts: u32, elapsed: Duration) {
    let _ = (netfn, cmd, rq_seq, attempts, elapsed);

    #[cfg(feature = "metrics")]
    {
        metrics::counter!("mmctester_requests_total", "outcome" => "ok").increment(1);
        metrics::histogram!("mmctester_request_seconds").record(elapsed.as_secs_f64());
        if attempts > 1 {
            metrics::counter!("mmctester_request_retries_total").increment(u64::from(attempts - 1));
        }
    }

    #[cfg(feature = "tracing")]
    {
        tracing::debug!(
            netfn,
            cmd,
            rq_seq,
            attempts,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "ipmb request ok"
        );
    }
}

pub(crate) fn record_err(netfn: u8, cmd: u8, rq_seq: u8, elapsed: Duration, err: &Error) {
    let _ = (netfn, cmd, rq_seq, elapsed, err);

    #[cfg(feature = "metrics")]
    {
        metrics::counter!("mmctester_requests_total", "outcome" => "err").increment(1);
        metrics::counter!("mmctester_request_errors_total", "kind" => error_kind(err))
            .increment(1);
        metrics::histogram!("mmctester_request_seconds").record(elapsed.as_secs_f64());
    }

    #[cfg(feature = "tracing")]
    {
        tracing::warn!(
            netfn,
            cmd,
            rq_seq,
            error = %err,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "ipmb request failed"
        );
    }
}

pub(crate) fn record_retry(rq_seq: u8, attempt: u32, backoff: Duration, err: &Error) {
    let _ = (rq_seq, attempt, backoff, err);

    #[cfg(feature = "tracing")]
    tracing::debug!(
        rq_seq,
        attempt,
        backoff_ms = backoff.as_millis() as u64,
        error = %err,
        "retrying ipmb request"
    );
}

pub(crate) fn record_event(generator_address: u8, sensor_type: u8, sensor_number: u8) {
    let _ = (generator_address, sensor_type, sensor_number);

    #[cfg(feature = "metrics")]
    metrics::counter!("mmctester_events_total").increment(1);

    #[cfg(feature = "tracing")]
    tracing::debug!(
        generator_address,
        sensor_type,
        sensor_number,
        "platform event acknowledged"
    );
}

/// Frames still queued when a request gives up (`rq_seq`) or the board closes.
pub(crate) fn record_unclaimed(rq_seq: Option<u8>, pending: &PendingFrameQueue) {
    let _ = (rq_seq, pending);

    #[cfg(feature = "tracing")]
    tracing::debug!(
        ?rq_seq,
        count = pending.len(),
        frames = ?pending.frames().collect::<Vec<_>>(),
        "unclaimed frames in receive queue"
    );
}

#[cfg(feature = "metrics")]
fn error_kind(err: &Error) -> &'static str {
    match err {
        Error::MalformedFrame(_) => "malformed_frame",
        Error::Timeout => "timeout",
        Error::PortIo(_) => "port_io",
        Error::InvalidAnswer { .. } => "invalid_answer",
        Error::BoardNotReady => "board_not_ready",
        Error::InvalidArgument(_) => "invalid_argument",
        Error::CompletionCode { .. } => "completion_code",
    }
}
