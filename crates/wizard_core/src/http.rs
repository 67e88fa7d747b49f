//! Submit collaborator backed by the student REST API.

use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    domain::StudentProfile,
    error::{ApiError, ApiErrorBody},
    protocol::{
        LoginForm, MessageResponse, ResetPasswordRequest, SignupRequest, TokenResponse,
        UserPublic,
    },
};
use tracing::debug;
use url::Url;

use crate::{
    fields::Submission,
    flows::FlowKind,
    gateway::{SubmitError, SubmitReceipt, SubmitService},
};

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

pub struct HttpAuthService {
    http: Client,
    base_url: Url,
    reset_token: Option<String>,
    /// Account created by a signup whose token exchange then failed. A retry
    /// for the same email only logs in.
    pending_signup: Mutex<Option<StudentProfile>>,
}

impl HttpAuthService {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;
        Ok(Self {
            http: Client::new(),
            base_url,
            reset_token: None,
            pending_signup: Mutex::new(None),
        })
    }

    /// Token from the recovery email, required by the reset-password flow.
    pub fn with_reset_token(mut self, token: impl Into<String>) -> Self {
        self.reset_token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, SubmitError> {
        self.base_url
            .join(path)
            .map_err(|err| SubmitError::Transport(format!("invalid endpoint '{path}': {err}")))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Option<Response>, SubmitError> {
        let res = request
            .send()
            .await
            .map_err(|err| SubmitError::Transport(err.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let status_text = status.canonical_reason().unwrap_or("Request failed");
            let body = res.json::<ApiErrorBody>().await.ok();
            let err = ApiError::from_response(status.as_u16(), body, status_text);
            return Err(SubmitError::Rejected {
                code: err.code,
                message: err.message,
            });
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        Ok(Some(res))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<T>, SubmitError> {
        let Some(res) = self.send(request).await? else {
            return Ok(None);
        };
        res.json::<T>()
            .await
            .map(Some)
            .map_err(|err| SubmitError::InvalidResponse(err.to_string()))
    }

    async fn access_token(&self, email: &str, password: &str) -> Result<String, SubmitError> {
        let url = self.endpoint("api/v1/login/access-token")?;
        let form = LoginForm {
            username: email.to_string(),
            password: password.to_string(),
        };
        let token: Option<TokenResponse> = self.send_json(self.http.post(url).form(&form)).await?;
        token
            .map(|t| t.access_token)
            .ok_or_else(|| SubmitError::InvalidResponse("token endpoint returned no body".into()))
    }

    fn take_pending_signup(&self, email: &str) -> Option<StudentProfile> {
        let mut pending = self
            .pending_signup
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match pending.take() {
            Some(profile) if profile.email == email => Some(profile),
            other => {
                *pending = other;
                None
            }
        }
    }

    fn remember_pending_signup(&self, profile: StudentProfile) {
        *self
            .pending_signup
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(profile);
    }

    async fn signup(&self, submission: &Submission) -> Result<SubmitReceipt, SubmitError> {
        let profile = match self.take_pending_signup(submission.email()) {
            Some(profile) => {
                debug!(email = %profile.email, "account already created, logging in");
                profile
            }
            None => self.create_account(submission).await?,
        };

        let token = match self
            .access_token(submission.email(), submission.password())
            .await
        {
            Ok(token) => token,
            Err(err) => {
                self.remember_pending_signup(profile);
                return Err(err);
            }
        };
        Ok(SubmitReceipt {
            access_token: Some(token),
            profile: Some(profile),
        })
    }

    async fn create_account(&self, submission: &Submission) -> Result<StudentProfile, SubmitError> {
        let url = self.endpoint("api/v1/users/signup")?;
        let body = SignupRequest {
            email: submission.email().to_string(),
            password: submission.password().to_string(),
            full_name: submission
                .full_name
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            wants_notifications: submission.wants_notifications,
        };
        let user: Option<UserPublic> = self.send_json(self.http.post(url).json(&body)).await?;
        Ok(match user {
            Some(user) => StudentProfile {
                email: user.email,
                full_name: user.full_name,
                wants_notifications: user.wants_notifications,
            },
            None => submission
                .profile()
                .unwrap_or_else(|| StudentProfile::with_email(submission.email())),
        })
    }

    async fn login(&self, submission: &Submission) -> Result<SubmitReceipt, SubmitError> {
        let token = self
            .access_token(submission.email(), submission.password())
            .await?;
        Ok(SubmitReceipt {
            access_token: Some(token),
            profile: Some(StudentProfile::with_email(submission.email())),
        })
    }

    async fn request_recovery(&self, submission: &Submission) -> Result<SubmitReceipt, SubmitError> {
        let mut url = self.endpoint("api/v1/password-recovery/")?;
        url.path_segments_mut()
            .map_err(|_| SubmitError::Transport("base url cannot carry a path".into()))?
            .pop_if_empty()
            .push(submission.email());
        let _: Option<MessageResponse> = self.send_json(self.http.post(url)).await?;
        Ok(SubmitReceipt::default())
    }

    async fn reset_password(&self, submission: &Submission) -> Result<SubmitReceipt, SubmitError> {
        let token = self
            .reset_token
            .clone()
            .ok_or(SubmitError::MissingResetToken)?;
        let url = self.endpoint("api/v1/reset-password/")?;
        let body = ResetPasswordRequest {
            token,
            new_password: submission.password().to_string(),
        };
        let _: Option<MessageResponse> = self.send_json(self.http.post(url).json(&body)).await?;
        Ok(SubmitReceipt::default())
    }
}

#[async_trait]
impl SubmitService for HttpAuthService {
    async fn submit(
        &self,
        flow: FlowKind,
        submission: Submission,
    ) -> Result<SubmitReceipt, SubmitError> {
        debug!(%flow, base = %self.base_url, "http submission");
        match flow {
            FlowKind::Signup => self.signup(&submission).await,
            FlowKind::Login => self.login(&submission).await,
            FlowKind::ForgotPassword => self.request_recovery(&submission).await,
            FlowKind::ResetPassword => self.reset_password(&submission).await,
        }
    }
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
