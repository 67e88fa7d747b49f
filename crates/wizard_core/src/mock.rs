//! Offline submit collaborator used until a backend is wired in.

use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use shared::domain::StudentProfile;
use tracing::debug;

use crate::{
    fields::Submission,
    flows::FlowKind,
    gateway::{SubmitError, SubmitReceipt, SubmitService},
};

pub const MOCK_ACCESS_TOKEN: &str = "mock-student-token";
pub const DEFAULT_MOCK_DELAY: Duration = Duration::from_millis(600);

/// Accepts every submission after a fixed delay and hands back a canned
/// token plus the profile the flow would have produced.
pub struct MockAuthService {
    delay: Duration,
    token: String,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl MockAuthService {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            token: MOCK_ACCESS_TOKEN.to_string(),
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Every submission fails with `message` after the delay.
    pub fn failing(delay: Duration, message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new(delay)
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn profile_for(flow: FlowKind, submission: &Submission) -> Option<StudentProfile> {
        match flow {
            FlowKind::Signup => submission.profile(),
            FlowKind::Login | FlowKind::ForgotPassword => {
                Some(StudentProfile::with_email(submission.email()))
            }
            FlowKind::ResetPassword => None,
        }
    }
}

impl Default for MockAuthService {
    fn default() -> Self {
        Self::new(DEFAULT_MOCK_DELAY)
    }
}

#[async_trait]
impl SubmitService for MockAuthService {
    async fn submit(
        &self,
        flow: FlowKind,
        submission: Submission,
    ) -> Result<SubmitReceipt, SubmitError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        debug!(%flow, delay_ms = self.delay.as_millis() as u64, "mock submission");
        tokio::time::sleep(self.delay).await;

        if let Some(message) = &self.failure {
            return Err(SubmitError::rejected(message.clone()));
        }

        Ok(SubmitReceipt {
            access_token: Some(self.token.clone()),
            profile: Self::profile_for(flow, &submission),
        })
    }
}
