//! Order submission pipeline: validate, build the record, publish, audit, report.
//!
//! The final status depends only on validation and the publish result. Audit
//! appends are best effort: a failure is traced and counted, never returned.

use common_audit::{AuditEvent, AuditLog, AuditPayload};
use common_observability::OrderMetrics;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::order::{OrderInput, OrderRecord, ValidationError};
use crate::publisher::{Ack, OrderPublish, PublishError};

pub const SUCCESS_MESSAGE: &str = "Order submitted successfully! Check your email for confirmation.";
pub const BUSY_MESSAGE: &str = "An order submission is already in progress";

pub const EVENT_ORDER_SUBMITTED: &str = "OrderSubmitted";
pub const EVENT_ORDER_FAILED: &str = "OrderSubmissionFailed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Validating,
    Publishing,
    Logging,
    Done { success: bool },
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Accepted { order_id: String, ack: Ack },
    Invalid(ValidationError),
    PublishFailed { order_id: String, error: PublishError },
    /// Another submission was still in flight; nothing was attempted.
    Busy,
}

impl SubmitOutcome {
    pub fn is_success(&self) -> bool { matches!(self, SubmitOutcome::Accepted { .. }) }

    pub fn order_id(&self) -> Option<&str> {
        match self {
            SubmitOutcome::Accepted { order_id, .. } | SubmitOutcome::PublishFailed { order_id, .. } => Some(order_id),
            _ => None,
        }
    }

    /// The single line shown to the customer.
    pub fn status_message(&self) -> String {
        match self {
            SubmitOutcome::Accepted { .. } => SUCCESS_MESSAGE.to_string(),
            SubmitOutcome::Invalid(e) => format!("Error: {e}"),
            SubmitOutcome::PublishFailed { error, .. } => format!("Error: {error}"),
            SubmitOutcome::Busy => format!("Error: {BUSY_MESSAGE}"),
        }
    }
}

struct SubmittingGuard<'a>(&'a AtomicBool);

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) { self.0.store(false, Ordering::Release); }
}

pub struct OrderPipeline {
    publisher: Arc<dyn OrderPublish>,
    audit: Arc<dyn AuditLog>,
    metrics: Arc<OrderMetrics>,
    topic: String,
    submitting: AtomicBool,
    state: Mutex<SubmissionState>,
}

impl OrderPipeline {
    pub fn new(
        publisher: Arc<dyn OrderPublish>,
        audit: Arc<dyn AuditLog>,
        metrics: Arc<OrderMetrics>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            publisher,
            audit,
            metrics,
            topic: topic.into(),
            submitting: AtomicBool::new(false),
            state: Mutex::new(SubmissionState::Idle),
        }
    }

    pub fn topic(&self) -> &str { &self.topic }

    pub fn metrics(&self) -> &Arc<OrderMetrics> { &self.metrics }

    pub fn state(&self) -> SubmissionState {
        *self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_submitting(&self) -> bool { self.submitting.load(Ordering::Acquire) }

    fn transition(&self, next: SubmissionState) {
        *self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = next;
        debug!(state = ?next, "submission state");
    }

    pub async fn submit(&self, input: &OrderInput) -> SubmitOutcome {
        if self.submitting.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err() {
            warn!("rejected submit while another submission is in flight");
            return SubmitOutcome::Busy;
        }
        let _guard = SubmittingGuard(&self.submitting);
        let started = Instant::now();

        self.transition(SubmissionState::Validating);
        let outcome = match OrderRecord::build(input) {
            Err(error) => {
                warn!(error = %error, "order validation failed");
                self.transition(SubmissionState::Logging);
                self.audit_best_effort(failure_event(&error.to_string(), &input.email, None)).await;
                self.metrics.record_failure("validation");
                SubmitOutcome::Invalid(error)
            }
            Ok(record) => {
                self.transition(SubmissionState::Publishing);
                let published = self.publisher.publish(&self.topic, &record.order_id, &record).await;
                self.transition(SubmissionState::Logging);
                match published {
                    Ok(ack) => {
                        let mut payload = AuditPayload::new();
                        payload.insert("orderId".into(), json!(record.order_id));
                        payload.insert("customerEmail".into(), json!(record.email));
                        payload.insert("model".into(), json!(record.model));
                        self.audit_best_effort(AuditEvent::info(EVENT_ORDER_SUBMITTED, payload)).await;
                        self.metrics.orders_submitted.inc();
                        info!(order_id = %record.order_id, topic = %self.topic, model = %record.model, "order submitted");
                        SubmitOutcome::Accepted { order_id: record.order_id, ack }
                    }
                    Err(error) => {
                        warn!(order_id = %record.order_id, error = %error, "order publish failed");
                        self.audit_best_effort(failure_event(&error.to_string(), &record.email, Some(&record.order_id))).await;
                        self.metrics.record_failure(error.reason());
                        SubmitOutcome::PublishFailed { order_id: record.order_id, error }
                    }
                }
            }
        };

        self.transition(SubmissionState::Done { success: outcome.is_success() });
        self.metrics.submission_duration_seconds.observe(started.elapsed().as_secs_f64());
        outcome
    }

    async fn audit_best_effort(&self, event: AuditEvent) {
        let event_type = event.event_type.clone();
        if let Err(e) = self.audit.append(event).await {
            self.metrics.audit_append_failures.inc();
            warn!(error = %e, event_type = %event_type, "audit log append failed; submission result unaffected");
        }
    }
}

fn failure_event(message: &str, email: &str, order_id: Option<&str>) -> AuditEvent {
    let mut payload = AuditPayload::new();
    payload.insert("error".into(), json!(message));
    if !email.is_empty() {
        payload.insert("customerEmail".into(), json!(email));
    }
    if let Some(id) = order_id {
        payload.insert("orderId".into(), json!(id));
    }
    AuditEvent::error(EVENT_ORDER_FAILED, payload)
}
