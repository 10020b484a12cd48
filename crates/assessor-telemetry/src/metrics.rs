//! Assessment metric names and recording helpers

use std::time::Instant;

use opentelemetry::KeyValue;
use opentelemetry::metrics::{Counter, Histogram};

pub const ASSESSMENT_REQUEST_COUNT: &str = "assessor.request.count";
pub const ASSESSMENT_REQUEST_DURATION: &str = "assessor.request.duration";

/// Attribute carrying the request kind (`question`, `answer`, or `unrouted`)
pub const ATTR_REQUEST_KIND: &str = "request.kind";
/// Attribute carrying the outcome (`ok`, `invalid`, or an upstream error kind)
pub const ATTR_OUTCOME: &str = "outcome";

/// Instruments recorded once per assessment request
///
/// Built from the global meter provider, so they are no-ops until
/// [`crate::init`] installs an exporter.
#[derive(Clone)]
pub struct AssessmentMetrics {
    requests: Counter<u64>,
    duration: Histogram<f64>,
}

impl AssessmentMetrics {
    pub fn new() -> Self {
        let meter = opentelemetry::global::meter("assessor");

        Self {
            requests: meter
                .u64_counter(ASSESSMENT_REQUEST_COUNT)
                .with_description("Assessment requests handled")
                .build(),
            duration: meter
                .f64_histogram(ASSESSMENT_REQUEST_DURATION)
                .with_description("Assessment request duration")
                .with_unit("s")
                .build(),
        }
    }

    /// Record one finished request
    pub fn record(&self, kind: &'static str, outcome: &'static str, start: Instant) {
        let attributes = [KeyValue::new(ATTR_REQUEST_KIND, kind), KeyValue::new(ATTR_OUTCOME, outcome)];
        self.requests.add(1, &attributes);
        record_duration(&self.duration, start, &attributes);
    }
}

impl Default for AssessmentMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Record a duration measurement on a histogram
pub fn record_duration(histogram: &Histogram<f64>, start: Instant, attributes: &[KeyValue]) {
    let duration = start.elapsed().as_secs_f64();
    histogram.record(duration, attributes);
}
