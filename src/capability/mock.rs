//! Scripted mock capabilities for tests
//!
//! Shipped in the library (not behind cfg(test)) so integration tests can
//! drive full runs through the public API. Both mocks count calls and
//! consume an injected-failure script before answering normally.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::capability::dry_run::BLANK_PNG;
use crate::capability::{CapabilityError, Evaluator, Transformer};
use crate::domain::{Modality, Payload, ScoreSet};

/// Failure kinds a test can inject
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedFailure {
    /// Classified retryable (a timeout)
    Transient,
    /// Classified permanent (a policy rejection)
    Permanent,
}

impl InjectedFailure {
    fn to_error(self) -> CapabilityError {
        match self {
            InjectedFailure::Transient => CapabilityError::Timeout(Duration::from_secs(30)),
            InjectedFailure::Permanent => {
                CapabilityError::PolicyRejection("injected permanent failure".to_string())
            }
        }
    }
}

/// Transformer double producing deterministic placeholder outputs
#[derive(Debug, Default)]
pub struct MockTransformer {
    calls: AtomicU32,
    script: Mutex<VecDeque<InjectedFailure>>,
    prompt_failures: Mutex<Vec<(String, InjectedFailure)>>,
}

impl MockTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a failure consumed by the next call, FIFO
    pub fn push_failure(&self, failure: InjectedFailure) {
        self.script.lock().unwrap().push_back(failure);
    }

    /// Fail every call whose prompt contains `needle`
    pub fn fail_when_prompt_contains(&self, needle: impl Into<String>, failure: InjectedFailure) {
        self.prompt_failures
            .lock()
            .unwrap()
            .push((needle.into(), failure));
    }

    /// Total transform calls observed
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transformer for MockTransformer {
    async fn transform(
        &self,
        _input: &Payload,
        target: Modality,
        prompt: &str,
    ) -> Result<Payload, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(failure) = self.script.lock().unwrap().pop_front() {
            return Err(failure.to_error());
        }
        for (needle, failure) in self.prompt_failures.lock().unwrap().iter() {
            if prompt.contains(needle.as_str()) {
                return Err(failure.to_error());
            }
        }

        match target {
            Modality::Text => Ok(Payload::Text(format!("mock caption: {}", prompt))),
            Modality::Image => Ok(Payload::Image(BLANK_PNG.to_vec())),
        }
    }
}

/// One scripted evaluator answer
#[derive(Debug, Clone)]
pub enum ScriptedEval {
    /// Return these scores as-is (may deliberately violate the contract)
    Scores(ScoreSet),
    Fail(InjectedFailure),
}

/// Evaluator double answering uniform scores unless scripted otherwise
#[derive(Debug)]
pub struct MockEvaluator {
    calls: AtomicU32,
    script: Mutex<VecDeque<ScriptedEval>>,
    default_value: f64,
}

impl MockEvaluator {
    pub fn new() -> Self {
        Self::with_default_value(8.0)
    }

    /// Mock whose unscripted answers all carry `value`
    pub fn with_default_value(value: f64) -> Self {
        Self {
            calls: AtomicU32::new(0),
            script: Mutex::new(VecDeque::new()),
            default_value: value,
        }
    }

    /// Queue an answer consumed by the next call, FIFO
    pub fn push_response(&self, response: ScriptedEval) {
        self.script.lock().unwrap().push_back(response);
    }

    /// Total evaluate calls observed
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Evaluator for MockEvaluator {
    async fn evaluate(
        &self,
        _left: &Payload,
        _right: &Payload,
        _rubric_id: &str,
    ) -> Result<ScoreSet, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match self.script.lock().unwrap().pop_front() {
            Some(ScriptedEval::Scores(scores)) => Ok(scores),
            Some(ScriptedEval::Fail(failure)) => Err(failure.to_error()),
            None => Ok(ScoreSet::uniform(self.default_value, "mock judgement")),
        }
    }
}
