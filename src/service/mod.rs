//! Queries and mutations over the backend, run under one resolved session.
//!
//! Every data query passes two gates before it reaches the network: the
//! session must have an actor, and the health probe must have succeeded.
//! Queries never retry; a failure is returned to the caller as
//! [`QueryState::Error`].
use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDate};
use std::fmt;
use tracing::{info, instrument, warn};

use crate::cache::{self, QueryCache, QueryKey};
use crate::config::Config;
use crate::health::{HealthGate, HealthStatus, RefreshTrigger};
use crate::model::{GroupResponseCount, InquirySummary, OutreachEntry};
use crate::session::{Actor, ResolvedSession};

mod mutations;
mod queries;

/// Why a query did not run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    /// Session still initialising or its actor is unavailable.
    SessionNotReady,
    /// Health probe has not succeeded.
    Health(HealthStatus),
    /// A required parameter (e.g. a group URL) is blank.
    MissingInput(&'static str),
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gate::SessionNotReady => f.write_str("session not ready: Actor not available"),
            Gate::Health(HealthStatus::Unavailable(msg)) => write!(f, "backend unavailable: {}", msg),
            Gate::Health(HealthStatus::Failed(msg)) => write!(f, "backend health check failed: {}", msg),
            Gate::Health(_) => f.write_str("backend health check has not succeeded"),
            Gate::MissingInput(what) => write!(f, "{} is required", what),
        }
    }
}

impl std::error::Error for Gate {}

/// Result of one query as a view consumes it.
pub enum QueryState<T> {
    Disabled(Gate),
    Ready(T),
    Error(anyhow::Error),
}

impl<T> QueryState<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            QueryState::Ready(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, QueryState::Disabled(_))
    }

    /// Collapse into a `Result`, turning a gate into an error.
    pub fn into_result(self) -> Result<T> {
        match self {
            QueryState::Ready(v) => Ok(v),
            QueryState::Error(err) => Err(err),
            QueryState::Disabled(gate) => Err(gate.into()),
        }
    }

    fn from_result(res: Result<T>) -> Self {
        match res {
            Ok(v) => QueryState::Ready(v),
            Err(err) => QueryState::Error(err),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for QueryState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryState::Disabled(gate) => write!(f, "Disabled({:?})", gate),
            QueryState::Ready(v) => write!(f, "Ready({:?})", v),
            QueryState::Error(err) => write!(f, "Error({:#})", err),
        }
    }
}

/// Everything the dashboard page renders from.
#[derive(Debug)]
pub struct DashboardSnapshot {
    pub health: HealthStatus,
    pub entries: QueryState<Vec<OutreachEntry>>,
    pub follow_ups: QueryState<Vec<OutreachEntry>>,
    pub group_summary: QueryState<Vec<GroupResponseCount>>,
    pub inquiry_summary: QueryState<InquirySummary>,
}

pub struct OutreachService {
    session: ResolvedSession,
    cache: QueryCache,
    health: HealthGate,
    page_size: u64,
    today: Option<NaiveDate>,
}

impl fmt::Debug for OutreachService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutreachService")
            .field("session", &self.session)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl OutreachService {
    pub fn new(session: ResolvedSession, cfg: &Config) -> Self {
        Self {
            session,
            cache: QueryCache::new(),
            health: HealthGate::new(cfg.health.clone()),
            page_size: cfg.dashboard.page_size,
            today: None,
        }
    }

    /// Pin "today" instead of reading the local clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn session(&self) -> &ResolvedSession {
        &self.session
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Switch identity. Cached results stay partitioned by the old session key,
    /// and the health result is dropped.
    pub async fn set_session(&mut self, session: ResolvedSession) {
        if session.cache_key != self.session.cache_key {
            info!(from = %self.session.cache_key, to = %session.cache_key, "session changed");
            self.health.reset().await;
            self.cache.clear().await;
        }
        self.session = session;
    }

    fn actor(&self) -> Result<&Actor> {
        self.session
            .actor
            .as_ref()
            .ok_or_else(|| anyhow!("Actor not available"))
    }

    fn key(&self, namespace: &str, name: &str) -> QueryKey {
        QueryKey::new(namespace, name, &self.session.cache_key)
    }

    /// Probe (or reuse a fresh probe) and report whether queries may run.
    pub async fn check_health(&self) -> HealthStatus {
        match &self.session.actor {
            Some(actor) if self.session.ready_for_queries => self.health.ensure(actor.as_ref()).await,
            _ => HealthStatus::Pending,
        }
    }

    /// Re-probe after a window refocus or network reconnect.
    pub async fn refresh_health(&self, trigger: RefreshTrigger) -> HealthStatus {
        match &self.session.actor {
            Some(actor) => self.health.refresh(actor.as_ref(), trigger).await,
            None => HealthStatus::Pending,
        }
    }

    /// Gate shared by every data query.
    async fn gate(&self) -> Option<Gate> {
        if !self.session.ready_for_queries {
            return Some(Gate::SessionNotReady);
        }
        match self.check_health().await {
            HealthStatus::Healthy => None,
            other => Some(Gate::Health(other)),
        }
    }

    /// Load every dashboard query. The probe runs once up front; when it
    /// fails no data query is attempted.
    #[instrument(skip_all, fields(session = %self.session.cache_key))]
    pub async fn load_dashboard(&self) -> DashboardSnapshot {
        let health = self.check_health().await;
        if !health.is_healthy() {
            warn!(?health, "dashboard queries disabled");
        }
        let (entries, follow_ups, group_summary, inquiry_summary) = futures::join!(
            self.list_entries(),
            self.follow_up_today(),
            self.group_summary(),
            self.inquiry_summary(),
        );
        DashboardSnapshot {
            health,
            entries,
            follow_ups,
            group_summary,
            inquiry_summary,
        }
    }

    /// Manual retry: re-probe first, and only on success drop and re-fetch
    /// the dashboard data.
    #[instrument(skip_all)]
    pub async fn retry(&self) -> DashboardSnapshot {
        let health = self.refresh_health(RefreshTrigger::Manual).await;
        if health.is_healthy() {
            for name in ["entries", "followUpToday", "groupSummary", "inquirySummary"] {
                self.cache.invalidate_prefix(&[cache::OUTREACH, name]).await;
            }
            info!("backend healthy again; refetching dashboard");
        } else {
            warn!(?health, "retry probe failed; data queries stay disabled");
        }
        self.load_dashboard().await
    }
}
