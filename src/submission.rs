//! Submission lifecycle: input validation, the single in-flight request, and its outcome.

use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::client::{TranslateError, TranslationBackend, TranslationOutcome};
use crate::model::{RequirementInput, TranslateRequest, TranslationResult, ValidationStatus};

/// Shown when the service fails without a usable `detail`.
pub const REMOTE_FALLBACK_MESSAGE: &str = "The translation service returned an error.";
/// Shown when the service could not be reached or its answer could not be read.
pub const TRANSPORT_FAILURE_MESSAGE: &str =
    "An error occurred while translating the business requirement.";

/// Lifecycle of the current submission. Exactly one variant is active.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Loading,
    Failed {
        message: String,
    },
    Succeeded {
        result: TranslationResult,
    },
}

impl SubmissionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn result(&self) -> Option<&TranslationResult> {
        match self {
            Self::Succeeded { result } => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed { message } => Some(message),
            _ => None,
        }
    }
}

/// Why a `submit()` call was refused.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRejected {
    #[error("requirement is shorter than the minimum length")]
    Invalid,
    #[error("a translation is already in flight")]
    InFlight,
}

/// Owns the requirement input and the lifecycle of at most one outbound request.
#[derive(Debug, Default)]
pub struct SubmissionController {
    input: RequirementInput,
    state: SubmissionState,
    pending: Option<Receiver<TranslationOutcome>>,
    /// Incremented on every accepted submission.
    submission_id: u64,
    started_at: Option<Instant>,
}

impl SubmissionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn submission_id(&self) -> u64 {
        self.submission_id
    }

    pub fn is_valid(&self) -> bool {
        self.input.is_valid()
    }

    pub fn validation(&self) -> ValidationStatus {
        self.input.validation()
    }

    /// Whether `submit()` would currently be accepted.
    pub fn can_submit(&self) -> bool {
        self.is_valid() && !self.state.is_loading()
    }

    /// Time spent in flight so far, if loading.
    pub fn elapsed(&self) -> Option<Duration> {
        self.started_at.map(|t| t.elapsed())
    }

    /// Replaces the requirement text. Never touches the network.
    pub fn update_input(&mut self, text: impl Into<String>) {
        self.input = RequirementInput::new(text);
    }

    /// Starts a translation for the current input.
    ///
    /// Clears any previous result or error, enters `Loading`, and dispatches exactly one request.
    pub fn submit(&mut self, backend: &dyn TranslationBackend) -> Result<(), SubmitRejected> {
        if self.state.is_loading() {
            debug!(submission_id = self.submission_id, "submit_rejected_in_flight");
            return Err(SubmitRejected::InFlight);
        }
        if !self.is_valid() {
            debug!(chars = self.input.trimmed_len(), "submit_rejected_invalid");
            return Err(SubmitRejected::Invalid);
        }

        self.submission_id += 1;
        self.state = SubmissionState::Loading;
        self.started_at = Some(Instant::now());
        info!(
            submission_id = self.submission_id,
            chars = self.input.trimmed_len(),
            "submission_start"
        );

        let request = TranslateRequest {
            business_requirement: self.input.text.clone(),
        };
        self.pending = Some(backend.dispatch(request));
        Ok(())
    }

    /// Checks for the in-flight outcome. Returns true when the submission settled on this call.
    pub fn poll(&mut self) -> bool {
        let outcome = match &self.pending {
            Some(rx) => match rx.try_recv() {
                Ok(outcome) => outcome,
                Err(TryRecvError::Empty) => return false,
                Err(TryRecvError::Disconnected) => Err(TranslateError::Transport(
                    "request ended without a response".to_string(),
                )),
            },
            None => return false,
        };

        self.settle(outcome);
        true
    }

    fn settle(&mut self, outcome: TranslationOutcome) {
        self.pending = None;
        let elapsed_ms = self
            .started_at
            .take()
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(0);

        self.state = match outcome {
            Ok(result) => {
                info!(submission_id = self.submission_id, elapsed_ms, "submission_succeeded");
                SubmissionState::Succeeded { result }
            }
            Err(TranslateError::Remote { status, detail }) => {
                warn!(
                    submission_id = self.submission_id,
                    status,
                    has_detail = detail.is_some(),
                    elapsed_ms,
                    "submission_failed_remote"
                );
                SubmissionState::Failed {
                    message: detail.unwrap_or_else(|| REMOTE_FALLBACK_MESSAGE.to_string()),
                }
            }
            Err(TranslateError::Transport(error)) => {
                warn!(
                    submission_id = self.submission_id,
                    error = %error,
                    elapsed_ms,
                    "submission_failed_transport"
                );
                SubmissionState::Failed {
                    message: TRANSPORT_FAILURE_MESSAGE.to_string(),
                }
            }
        };
    }
}

#[cfg(test)]
impl SubmissionController {
    pub fn input(&self) -> &RequirementInput {
        &self.input
    }
}
