use prometheus::{Encoder, Histogram, IntCounter, IntCounterVec, Registry, TextEncoder};

#[derive(Clone)]
pub struct OrderMetrics {
    pub registry: Registry,
    pub orders_submitted: IntCounter,
    pub submission_failures: IntCounterVec,
    pub audit_append_failures: IntCounter,
    pub submission_duration_seconds: Histogram,
}

impl OrderMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();
        let orders_submitted = IntCounter::new(
            "vehicle_orders_submitted_total",
            "Orders accepted by the broker",
        ).unwrap();
        let submission_failures = IntCounterVec::new(
            prometheus::Opts::new(
                "vehicle_order_submission_failures_total",
                "Order submissions that ended in an error status"
            ),
            &["reason"]
        ).unwrap();
        let audit_append_failures = IntCounter::new(
            "audit_append_failures_total",
            "Audit log appends that failed and were dropped",
        ).unwrap();
        let submission_duration_seconds = Histogram::with_opts(
            prometheus::HistogramOpts::new(
                "vehicle_order_submission_duration_seconds",
                "Wall time of one order submission, validation through audit log"
            ).buckets(vec![0.005,0.01,0.05,0.1,0.25,0.5,1.0,2.5,5.0,10.0])
        ).unwrap();
        let _ = registry.register(Box::new(orders_submitted.clone()));
        let _ = registry.register(Box::new(submission_failures.clone()));
        let _ = registry.register(Box::new(audit_append_failures.clone()));
        let _ = registry.register(Box::new(submission_duration_seconds.clone()));
        OrderMetrics { registry, orders_submitted, submission_failures, audit_append_failures, submission_duration_seconds }
    }

    pub fn record_failure(&self, reason: &str) {
        self.submission_failures.with_label_values(&[reason]).inc();
    }

    pub fn failures(&self, reason: &str) -> u64 {
        self.submission_failures.with_label_values(&[reason]).get()
    }

    /// Prometheus text exposition of every registered series.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl Default for OrderMetrics {
    fn default() -> Self { Self::new() }
}
