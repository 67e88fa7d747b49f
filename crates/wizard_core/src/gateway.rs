//! Submission Gateway: calls the submit collaborator and persists whatever
//! session material it hands back.

use std::sync::Arc;

use async_trait::async_trait;
use shared::{domain::StudentProfile, error::ErrorCode};
use storage::{session, KeyValueStore};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{fields::Submission, flows::FlowKind, messages::MessageCatalog};

#[async_trait]
pub trait SubmitService: Send + Sync {
    async fn submit(
        &self,
        flow: FlowKind,
        submission: Submission,
    ) -> Result<SubmitReceipt, SubmitError>;
}

/// Session material returned by a successful submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub access_token: Option<String>,
    pub profile: Option<StudentProfile>,
}

#[derive(Debug, Clone, Error)]
pub enum SubmitError {
    #[error("submission rejected ({code:?}): {message}")]
    Rejected { code: ErrorCode, message: String },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    InvalidResponse(String),
    #[error("password reset token is not configured")]
    MissingResetToken,
}

impl SubmitError {
    pub fn rejected(message: impl Into<String>) -> Self {
        SubmitError::Rejected {
            code: ErrorCode::Internal,
            message: message.into(),
        }
    }

    /// Text safe to show the user: a rejection's own message, otherwise the
    /// catalog's generic failure text.
    pub fn user_message<'a>(&'a self, messages: &'a MessageCatalog) -> &'a str {
        match self {
            SubmitError::Rejected { message, .. } if !message.trim().is_empty() => {
                message.as_str()
            }
            _ => messages.submission_failed(),
        }
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Submit(#[from] SubmitError),
    #[error("failed to persist session: {0:#}")]
    Persist(anyhow::Error),
}

impl GatewayError {
    pub fn user_message<'a>(&'a self, messages: &'a MessageCatalog) -> &'a str {
        match self {
            GatewayError::Submit(err) => err.user_message(messages),
            GatewayError::Persist(_) => messages.submission_failed(),
        }
    }
}

#[derive(Clone)]
pub struct SubmissionGateway {
    service: Arc<dyn SubmitService>,
    store: Arc<dyn KeyValueStore>,
}

impl SubmissionGateway {
    pub fn new(service: Arc<dyn SubmitService>, store: Arc<dyn KeyValueStore>) -> Self {
        Self { service, store }
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub async fn submit(
        &self,
        flow: FlowKind,
        submission: Submission,
    ) -> Result<SubmitReceipt, GatewayError> {
        let receipt = self.service.submit(flow, submission).await.map_err(|err| {
            warn!(%flow, error = %err, "submit collaborator failed");
            GatewayError::from(err)
        })?;

        if let Err(err) = self.persist(&receipt).await {
            let detail = format!("{err:#}");
            warn!(%flow, error = %detail, "failed to persist session");
            return Err(GatewayError::Persist(err));
        }

        debug!(
            %flow,
            has_token = receipt.access_token.is_some(),
            has_profile = receipt.profile.is_some(),
            "submission accepted"
        );
        Ok(receipt)
    }

    async fn persist(&self, receipt: &SubmitReceipt) -> anyhow::Result<()> {
        match (&receipt.access_token, &receipt.profile) {
            (Some(token), profile) => {
                session::save_session(self.store.as_ref(), token, profile.as_ref()).await
            }
            (None, Some(profile)) => session::save_profile(self.store.as_ref(), profile).await,
            (None, None) => Ok(()),
        }
    }
}
