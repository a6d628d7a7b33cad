//! HTTP binding of the session-owner contract.
//!
//! The owner process exposes a small JSON API; this client is a sync
//! facade over async reqwest, driven by an owned current-thread runtime so
//! it can be called from any host thread. Plain HTTP has no push channel,
//! so `subscribe_completions` stays `None` and completion detection rides
//! the polling path.

use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use url::Url;

use crate::config::OwnerConfig;
use crate::error::{ConfigError, CoreError, OwnerError};
use crate::owner::{ReminderStore, SessionOwner};
use crate::reminder::ReminderConfig;
use crate::timer::{FocusSession, TimerState};

#[derive(Debug)]
pub struct HttpSessionOwner {
    base_url: String,
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
}

impl HttpSessionOwner {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CoreError> {
        let parsed = Url::parse(base_url).map_err(|e| ConfigError::InvalidValue {
            key: "owner.base_url".into(),
            message: e.to_string(),
        })?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OwnerError::Protocol(e.to_string()))?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            client,
            runtime,
        })
    }

    pub fn from_config(config: &OwnerConfig) -> Result<Self, CoreError> {
        Self::new(
            &config.base_url,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Send and map the response: transport and 5xx failures are
    /// transient (`Unreachable`), 4xx means the owner refused the request
    /// (`Rejected`).
    fn execute(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, OwnerError> {
        let response = self
            .runtime
            .block_on(async move { request.send().await })
            .map_err(|e| OwnerError::Unreachable(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = self.runtime.block_on(response.text()).unwrap_or_default();
        if status.is_client_error() {
            Err(OwnerError::Rejected(if body.is_empty() {
                status.to_string()
            } else {
                body
            }))
        } else {
            Err(OwnerError::Unreachable(format!("HTTP {status}: {body}")))
        }
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, OwnerError> {
        let response = self.execute(self.client.get(self.url(path)))?;
        self.runtime
            .block_on(response.json::<T>())
            .map_err(|e| OwnerError::Protocol(e.to_string()))
    }

    fn post(&self, path: &str, body: Option<serde_json::Value>) -> Result<reqwest::Response, OwnerError> {
        let mut request = self.client.post(self.url(path));
        if let Some(body) = body {
            request = request.json(&body);
        }
        self.execute(request)
    }
}

impl SessionOwner for HttpSessionOwner {
    fn start_session(&self, duration_secs: i64, task_id: Option<i64>) -> Result<(), OwnerError> {
        self.post(
            "/session/start",
            Some(json!({ "duration_secs": duration_secs, "task_id": task_id })),
        )
        .map(|_| ())
    }

    fn pause_session(&self) -> Result<(), OwnerError> {
        self.post("/session/pause", None).map(|_| ())
    }

    fn resume_session(&self) -> Result<(), OwnerError> {
        self.post("/session/resume", None).map(|_| ())
    }

    fn stop_session(&self) -> Result<(), OwnerError> {
        self.post("/session/stop", None).map(|_| ())
    }

    fn session_state(&self) -> Result<TimerState, OwnerError> {
        self.get_json("/session/state")
    }

    fn complete_session(
        &self,
        duration_secs: i64,
        task_id: Option<i64>,
    ) -> Result<FocusSession, OwnerError> {
        let response = self.post(
            "/session/complete",
            Some(json!({ "duration_secs": duration_secs, "task_id": task_id })),
        )?;
        self.runtime
            .block_on(response.json::<FocusSession>())
            .map_err(|e| OwnerError::Protocol(e.to_string()))
    }

    fn ping(&self) -> Result<(), OwnerError> {
        self.execute(self.client.get(self.url("/ping"))).map(|_| ())
    }
}

impl ReminderStore for HttpSessionOwner {
    fn reminder_config(&self) -> Result<ReminderConfig, OwnerError> {
        self.get_json("/reminder")
    }

    fn save_reminder_config(&self, config: &ReminderConfig) -> Result<(), OwnerError> {
        let request = self.client.put(self.url("/reminder")).json(config);
        self.execute(request).map(|_| ())
    }
}
