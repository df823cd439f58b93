//! Town Star HTTP client: session authentication and the weekly leaderboard.

use anyhow::{anyhow, Result};
use log::{debug, info, warn};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::timeout;

use super::session::TownStarSession;
use crate::config::TownStarConfig;
use crate::logutil::redact;

const SESSION_HEADER: &str = "x-sessionid";

/// One row of the weekly competition leaderboard.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LeaderboardUser {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rank: u32,
    #[serde(default)]
    pub score: f64,
}

/// Users whose town name contains `fragment` (trimmed, case-insensitive),
/// in leaderboard order.
pub fn filter_by_name<'a>(users: &'a [LeaderboardUser], fragment: &str) -> Vec<&'a LeaderboardUser> {
    let needle = fragment.trim().to_uppercase();
    users
        .iter()
        .filter(|u| u.name.trim().to_uppercase().contains(&needle))
        .collect()
}

enum LeaderboardReply {
    Users(Vec<LeaderboardUser>),
    Unauthorized,
}

/// Client for the Town Star game API.
///
/// The client owns its [`TownStarSession`]. A session is minted and
/// authenticated lazily on first use; when the API answers 401 the session is
/// replaced and the request retried once.
pub struct TownStarClient {
    config: TownStarConfig,
    client: reqwest::Client,
    session: Option<TownStarSession>,
}

impl TownStarClient {
    pub fn new(config: TownStarConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            session: None,
        }
    }

    /// Current session, if one has been authenticated.
    pub fn session(&self) -> Option<&TownStarSession> {
        self.session.as_ref()
    }

    fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.config.timeout_seconds.max(1) as u64)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base.trim_end_matches('/'), path)
    }

    /// Register `session` with the API using the configured secret.
    pub async fn authenticate(&self, session: &TownStarSession) -> Result<()> {
        let url = self.url("/api/authenticate");
        debug!(
            "Authenticating Town Star session {} (secret {})",
            redact(session.id()),
            redact(&self.config.secret)
        );
        let body = serde_json::json!({
            "userId": null,
            "secret": null,
            "token": self.config.secret,
        });
        let request = self
            .client
            .post(&url)
            .header(SESSION_HEADER, session.id())
            .header(reqwest::header::ACCEPT, "*/*")
            .json(&body);

        let response = timeout(self.timeout_duration(), request.send())
            .await
            .map_err(|_| anyhow!("Authentication timeout after {}s", self.config.timeout_seconds))?
            .map_err(|e| anyhow!("Authentication request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(anyhow!("Authentication rejected with status: {}", response.status()));
        }
        Ok(())
    }

    /// Discard the current session, mint a new one and authenticate it.
    pub async fn refresh_session(&mut self) -> Result<TownStarSession> {
        self.session = None;
        let session = TownStarSession::generate();
        self.authenticate(&session).await?;
        self.session = Some(session.clone());
        Ok(session)
    }

    async fn ensure_session(&mut self) -> Result<TownStarSession> {
        match &self.session {
            Some(session) => Ok(session.clone()),
            None => {
                info!("Generating a new Town Star session");
                self.refresh_session().await
            }
        }
    }

    async fn query_leaderboard(&self, session: &TownStarSession) -> Result<LeaderboardReply> {
        let url = self.url(&format!(
            "/api/game/weekly/leader/score?start=1&stop={}",
            self.config.leaderboard_stop
        ));
        debug!("Fetching weekly leaderboard from: {}", url);
        let request = self
            .client
            .get(&url)
            .header(SESSION_HEADER, session.id())
            .header(reqwest::header::ACCEPT, "*/*");

        let response = timeout(self.timeout_duration(), request.send())
            .await
            .map_err(|_| anyhow!("Request timeout after {}s", self.config.timeout_seconds))?
            .map_err(|e| anyhow!("HTTP request failed: {}", e))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Ok(LeaderboardReply::Unauthorized);
        }
        if !response.status().is_success() {
            return Err(anyhow!("API returned status: {}", response.status()));
        }
        let users: Vec<LeaderboardUser> = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse leaderboard: {}", e))?;
        Ok(LeaderboardReply::Users(users))
    }

    /// Fetch the weekly competition leaderboard.
    pub async fn weekly_leaderboard(&mut self) -> Result<Vec<LeaderboardUser>> {
        let session = self.ensure_session().await?;
        match self.query_leaderboard(&session).await? {
            LeaderboardReply::Users(users) => Ok(users),
            LeaderboardReply::Unauthorized => {
                let age = chrono::Utc::now() - session.created_at();
                warn!(
                    "Town Star rejected a session after {}s; re-authenticating",
                    age.num_seconds()
                );
                let session = self.refresh_session().await?;
                match self.query_leaderboard(&session).await? {
                    LeaderboardReply::Users(users) => Ok(users),
                    LeaderboardReply::Unauthorized => {
                        self.session = None;
                        Err(anyhow!("Town Star rejected a freshly authenticated session"))
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, rank: u32) -> LeaderboardUser {
        LeaderboardUser {
            name: name.to_string(),
            rank,
            score: 1000.0 / rank as f64,
        }
    }

    #[test]
    fn filter_is_case_insensitive_and_trimmed() {
        let users = vec![user("NTM Goats", 1), user("ntm-s scholar", 2), user("Other", 3)];
        let hits = filter_by_name(&users, " ntm ");
        assert_eq!(hits.len(), 2);
        let scholars = filter_by_name(&users, "NTM-S");
        assert_eq!(scholars.len(), 1);
        assert_eq!(scholars[0].rank, 2);
    }

    #[test]
    fn leaderboard_rows_tolerate_missing_fields() {
        let rows: Vec<LeaderboardUser> =
            serde_json::from_str(r#"[{"name": "A", "rank": 1, "score": 12.5}, {"name": "B"}]"#)
                .unwrap();
        assert_eq!(rows[0].score, 12.5);
        assert_eq!(rows[1].rank, 0);
    }

    #[test]
    fn url_joins_without_double_slash() {
        let mut cfg = TownStarConfig::default();
        cfg.api_base = "http://localhost:1/".to_string();
        let client = TownStarClient::new(cfg);
        assert_eq!(client.url("/api/authenticate"), "http://localhost:1/api/authenticate");
        assert!(client.session().is_none());
    }
}
