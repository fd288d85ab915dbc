use crate::order::OrderInput;
use crate::pipeline::{OrderPipeline, SubmitOutcome};

/// Caller-side form state: the input being edited and the last status shown.
#[derive(Debug, Default)]
pub struct OrderForm {
    pub input: OrderInput,
    submit_message: Option<String>,
}

impl OrderForm {
    pub fn new() -> Self { Self::default() }

    pub fn submit_message(&self) -> Option<&str> { self.submit_message.as_deref() }

    /// Runs one submission and keeps the input only if it failed.
    pub async fn submit(&mut self, pipeline: &OrderPipeline) -> SubmitOutcome {
        self.submit_message = None;
        let outcome = pipeline.submit(&self.input).await;
        self.submit_message = Some(outcome.status_message());
        if outcome.is_success() {
            self.input.reset();
        }
        outcome
    }
}
