// self
use crate::obs::{OpKind, OpOutcome};

/// Records an operation outcome via the global metrics recorder (when enabled).
pub fn record_op_outcome(kind: OpKind, outcome: OpOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"calendar_bridge_op_total",
			"op" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}
	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Counts a remote API response under `calendar_bridge_api_response_total{class}`.
pub fn record_api_status(status: u16) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("calendar_bridge_api_response_total", "class" => status_class(status))
			.increment(1);
	}
	#[cfg(not(feature = "metrics"))]
	{
		let _ = status;
	}
}

/// Buckets an HTTP status into `1xx` .. `5xx`, or `other`.
pub const fn status_class(status: u16) -> &'static str {
	match status {
		100..=199 => "1xx",
		200..=299 => "2xx",
		300..=399 => "3xx",
		400..=499 => "4xx",
		500..=599 => "5xx",
		_ => "other",
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn statuses_bucket_by_class() {
		assert_eq!(status_class(204), "2xx");
		assert_eq!(status_class(429), "4xx");
		assert_eq!(status_class(503), "5xx");
		assert_eq!(status_class(42), "other");

		record_api_status(404);
		record_op_outcome(OpKind::ApiRequest, OpOutcome::Failure);
	}
}
