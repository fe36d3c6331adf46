//! Liveness probe that gates every data query.
use std::fmt;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{info, instrument, warn};

use crate::backend::Backend;
use crate::config::HealthSettings;
use crate::errors::{classify, ErrorClass};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// No probe has completed yet.
    Pending,
    Healthy,
    /// Backend stopped or unreachable; the UI offers a manual retry.
    Unavailable(String),
    /// Any other probe failure.
    Failed(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}

/// What caused an out-of-band refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    WindowFocus,
    Reconnect,
    Manual,
}

impl fmt::Display for RefreshTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RefreshTrigger::WindowFocus => "window-focus",
            RefreshTrigger::Reconnect => "reconnect",
            RefreshTrigger::Manual => "manual",
        })
    }
}

struct ProbeState {
    status: HealthStatus,
    checked_at: Option<Instant>,
}

pub struct HealthGate {
    settings: HealthSettings,
    state: Mutex<ProbeState>,
}

impl fmt::Debug for HealthGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthGate")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl HealthGate {
    pub fn new(settings: HealthSettings) -> Self {
        Self {
            settings,
            state: Mutex::new(ProbeState {
                status: HealthStatus::Pending,
                checked_at: None,
            }),
        }
    }

    pub async fn status(&self) -> HealthStatus {
        self.state.lock().await.status.clone()
    }

    /// Reuse a result younger than the freshness window, otherwise probe.
    /// Concurrent callers wait for the same probe.
    pub async fn ensure(&self, actor: &dyn Backend) -> HealthStatus {
        let mut state = self.state.lock().await;
        if let Some(at) = state.checked_at {
            if at.elapsed() < self.settings.stale_after() {
                return state.status.clone();
            }
        }
        let status = self.probe(actor).await;
        state.status = status.clone();
        state.checked_at = Some(Instant::now());
        status
    }

    /// Probe now regardless of freshness.
    #[instrument(skip_all, fields(trigger = %trigger))]
    pub async fn refresh(&self, actor: &dyn Backend, trigger: RefreshTrigger) -> HealthStatus {
        let mut state = self.state.lock().await;
        let status = self.probe(actor).await;
        info!(?status, "health refreshed");
        state.status = status.clone();
        state.checked_at = Some(Instant::now());
        status
    }

    /// Forget the last result (e.g. after a session switch).
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        state.status = HealthStatus::Pending;
        state.checked_at = None;
    }

    async fn probe(&self, actor: &dyn Backend) -> HealthStatus {
        let mut attempt = 0;
        loop {
            let failure = match actor.health().await {
                Ok(true) => return HealthStatus::Healthy,
                Ok(false) => anyhow::anyhow!("backend reported unhealthy"),
                Err(err) => err,
            };
            if attempt >= self.settings.max_retries {
                let message = format!("{:#}", failure);
                warn!(attempts = attempt + 1, %message, "health probe failed");
                return match classify(&failure) {
                    ErrorClass::ServiceUnavailable => HealthStatus::Unavailable(message),
                    _ => HealthStatus::Failed(message),
                };
            }
            let delay = self.settings.retry_delay(attempt);
            warn!(attempt, ?delay, err = %failure, "health probe failed; retrying");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
