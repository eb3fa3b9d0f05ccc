use libretto_client::EventRecord;

/// Redaction hook for calls that set `redactPii`.
///
/// No redaction is performed yet; the event passes through unchanged.
pub fn redact_pii(event: EventRecord) -> EventRecord {
    tracing::debug!(
        feedback_key = %event.feedback_key,
        "PII redaction requested but not implemented; event sent unredacted"
    );
    event
}
