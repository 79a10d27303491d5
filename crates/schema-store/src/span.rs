//! Result-driven span status.
//!
//! Store operations run inside a `tracing` span that declares the
//! OpenTelemetry status fields up front. When the operation returns, the
//! outcome is recorded on the span: `OK` for success, `ERROR` plus the
//! error's message for failure. Subscribers that bridge to OpenTelemetry
//! map these fields onto the exported span status.

use std::fmt;

use tracing::Span;

/// Span field carrying `"OK"` or `"ERROR"`.
pub const STATUS_CODE_FIELD: &str = "otel.status_code";
/// Span field carrying the error message on failure.
pub const STATUS_DESCRIPTION_FIELD: &str = "otel.status_description";

/// Record the outcome of `result` on `span`.
pub fn record_result<T, E: fmt::Display>(span: &Span, result: &Result<T, E>) {
    match result {
        Ok(_) => {
            span.record(STATUS_CODE_FIELD, "OK");
        }
        Err(e) => {
            span.record(STATUS_CODE_FIELD, "ERROR");
            span.record(STATUS_DESCRIPTION_FIELD, tracing::field::display(e));
            tracing::warn!(parent: span, error = %e, "operation failed");
        }
    }
}

/// Run `f` inside `span` and record its outcome.
///
/// The span must declare `otel.status_code` and `otel.status_description`
/// (as `tracing::field::Empty`) for the status to be kept.
pub fn in_result_span<T, E, F>(span: Span, f: F) -> Result<T, E>
where
    E: fmt::Display,
    F: FnOnce() -> Result<T, E>,
{
    let result = span.in_scope(f);
    record_result(&span, &result);
    result
}

/// Create an `INFO` span with the status fields pre-declared.
#[macro_export]
macro_rules! result_span {
    ($name:expr $(, $($fields:tt)*)?) => {
        $crate::__tracing::info_span!(
            $name,
            otel.status_code = $crate::__tracing::field::Empty,
            otel.status_description = $crate::__tracing::field::Empty
            $(, $($fields)*)?
        )
    };
}
