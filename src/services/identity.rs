use std::collections::{HashMap, HashSet};
use std::time::Duration;

use anyhow::Context;
use reqwest::Client;
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::core::config::Settings;
use crate::schemas::user::UserInfo;

/// Fallback shown when the identity service has no display name for a user,
/// or the lookup failed outright.
pub(crate) fn placeholder_display_name(user_id: Uuid) -> String {
    format!("User-{}", &user_id.simple().to_string()[..4])
}

pub(crate) fn display_name_or_placeholder(user: Option<&UserInfo>, user_id: Uuid) -> String {
    user.and_then(|info| info.display_name.clone())
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| placeholder_display_name(user_id))
}

#[derive(Debug, Clone)]
pub(crate) struct IdentityClient {
    client: Client,
    base_url: String,
    max_concurrency: usize,
}

impl IdentityClient {
    pub(crate) fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(settings.identity().timeout_seconds);
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .build()
            .context("Failed to build user service HTTP client")?;

        Ok(Self {
            client,
            base_url: settings.identity().base_url.trim_end_matches('/').to_string(),
            max_concurrency: settings.identity().max_concurrency,
        })
    }

    /// Resolves display data for a set of users, fanning out individual
    /// lookups with bounded concurrency. Lookups are best effort: a user
    /// whose request fails or does not parse is simply absent from the map,
    /// and callers fall back to [`placeholder_display_name`].
    pub(crate) async fn users_batch(
        &self,
        user_ids: &[Uuid],
        bearer_token: Option<&str>,
    ) -> HashMap<Uuid, UserInfo> {
        let unique: HashSet<Uuid> = user_ids.iter().copied().collect();
        let mut pending: Vec<Uuid> = unique.into_iter().collect();
        let mut users = HashMap::with_capacity(pending.len());
        let mut in_flight = JoinSet::new();

        loop {
            while in_flight.len() < self.max_concurrency {
                let Some(user_id) = pending.pop() else { break };
                let client = self.client.clone();
                let url = format!("{}/api/users/{user_id}", self.base_url);
                let token = bearer_token.map(str::to_owned);
                in_flight.spawn(async move { (user_id, fetch_user(client, url, token).await) });
            }

            let Some(joined) = in_flight.join_next().await else { break };
            match joined {
                Ok((user_id, Some(info))) => {
                    if info.id != user_id {
                        tracing::debug!(requested = %user_id, received = %info.id, "User payload id differs from requested id");
                    }
                    users.insert(user_id, info);
                }
                Ok((user_id, None)) => {
                    tracing::debug!(user_id = %user_id, "No user info resolved");
                }
                Err(err) => {
                    tracing::warn!(error = %err, "User lookup task failed");
                }
            }
        }

        users
    }
}

async fn fetch_user(client: Client, url: String, bearer_token: Option<String>) -> Option<UserInfo> {
    let mut request = client.get(&url);
    if let Some(token) = bearer_token {
        request = request.bearer_auth(token);
    }

    let response = match request.send().await {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(url = %url, error = %err, "User service request failed");
            return None;
        }
    };

    if !response.status().is_success() {
        tracing::debug!(url = %url, status = %response.status(), "User service returned non-success");
        return None;
    }

    let body = match response.text().await {
        Ok(body) => body,
        Err(err) => {
            tracing::warn!(url = %url, error = %err, "Failed to read user service response");
            return None;
        }
    };

    parse_user_payload(&body)
}

/// Accepts `{success, data}`, `{data}` and bare user objects, mirroring the
/// tolerance applied to quiz service payloads.
fn parse_user_payload(body: &str) -> Option<UserInfo> {
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum Payload {
        Flagged { success: bool, data: Option<UserInfo> },
        Wrapped { data: UserInfo },
        Bare(UserInfo),
    }

    match serde_json::from_str::<Payload>(body) {
        Ok(Payload::Flagged { success: false, .. }) => None,
        Ok(Payload::Flagged { data, .. }) => data,
        Ok(Payload::Wrapped { data }) => Some(data),
        Ok(Payload::Bare(user)) => Some(user),
        Err(err) => {
            tracing::debug!(error = %err, "Failed to decode user payload");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_uses_first_four_hex_chars() {
        let id = Uuid::parse_str("a1b2c3d4-0000-0000-0000-000000000000").unwrap();
        assert_eq!(placeholder_display_name(id), "User-a1b2");
    }

    #[test]
    fn blank_display_name_falls_back_to_placeholder() {
        let id = Uuid::parse_str("deadbeef-0000-0000-0000-000000000000").unwrap();
        let user = UserInfo { id, display_name: Some("   ".to_string()), email: None };
        assert_eq!(display_name_or_placeholder(Some(&user), id), "User-dead");
    }

    #[test]
    fn present_display_name_wins() {
        let id = Uuid::new_v4();
        let user = UserInfo { id, display_name: Some("Ada".to_string()), email: None };
        assert_eq!(display_name_or_placeholder(Some(&user), id), "Ada");
    }

    #[test]
    fn parses_wrapped_and_bare_user_payloads() {
        let id = Uuid::new_v4();
        let bare = format!("{{\"id\": \"{id}\", \"displayName\": \"Ada\"}}");
        let wrapped = format!("{{\"data\": {bare}}}");
        let flagged = format!("{{\"success\": true, \"data\": {bare}}}");

        for body in [bare.as_str(), wrapped.as_str(), flagged.as_str()] {
            let user = parse_user_payload(body).expect("user");
            assert_eq!(user.id, id);
            assert_eq!(user.display_name.as_deref(), Some("Ada"));
        }
    }

    #[test]
    fn failed_payloads_resolve_to_none() {
        assert!(parse_user_payload("{\"success\": false}").is_none());
        assert!(parse_user_payload("not json").is_none());
        assert!(parse_user_payload("{\"unrelated\": 1}").is_none());
    }
}
