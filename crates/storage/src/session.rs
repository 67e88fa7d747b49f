//! Persisted session layout: an opaque access token plus a JSON profile.

use anyhow::{Context, Result};
use shared::domain::StudentProfile;
use tracing::debug;

use crate::KeyValueStore;

pub const ACCESS_TOKEN_KEY: &str = "access_token";
/// Written by every submit collaborator, mock or HTTP alike.
pub const PROFILE_KEY: &str = "student_profile";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSession {
    pub access_token: String,
    pub profile: Option<StudentProfile>,
}

pub async fn save_session(
    store: &dyn KeyValueStore,
    access_token: &str,
    profile: Option<&StudentProfile>,
) -> Result<()> {
    store.set(ACCESS_TOKEN_KEY, access_token).await?;
    if let Some(profile) = profile {
        save_profile(store, profile).await?;
    }
    debug!(has_profile = profile.is_some(), "session persisted");
    Ok(())
}

pub async fn save_profile(store: &dyn KeyValueStore, profile: &StudentProfile) -> Result<()> {
    let raw = serde_json::to_string(profile).context("failed to encode student profile")?;
    store.set(PROFILE_KEY, &raw).await
}

pub async fn load_session(store: &dyn KeyValueStore) -> Result<Option<StoredSession>> {
    let Some(access_token) = store.get(ACCESS_TOKEN_KEY).await? else {
        return Ok(None);
    };
    let profile = match store.get(PROFILE_KEY).await? {
        Some(raw) => Some(
            serde_json::from_str::<StudentProfile>(&raw)
                .context("stored student profile is malformed")?,
        ),
        None => None,
    };
    Ok(Some(StoredSession {
        access_token,
        profile,
    }))
}

pub async fn is_logged_in(store: &dyn KeyValueStore) -> Result<bool> {
    Ok(store.get(ACCESS_TOKEN_KEY).await?.is_some())
}

pub async fn clear_session(store: &dyn KeyValueStore) -> Result<()> {
    store.remove(ACCESS_TOKEN_KEY).await?;
    store.remove(PROFILE_KEY).await?;
    debug!("session cleared");
    Ok(())
}
