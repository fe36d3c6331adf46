//! Process-local query result cache.
//!
//! Keys are explicit: a namespace, a query name, the session partition key,
//! then any query parameters. Mutations invalidate whole namespaces.
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

pub const OUTREACH: &str = "outreach";
pub const HOOK_TEMPLATES: &str = "hookTemplates";
pub const USER: &str = "user";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new(namespace: &str, name: &str, session_key: &str) -> Self {
        Self(vec![namespace.to_string(), name.to_string(), session_key.to_string()])
    }

    pub fn with(mut self, part: impl Into<String>) -> Self {
        self.0.push(part.into());
        self
    }

    pub fn namespace(&self) -> &str {
        self.0.first().map(String::as_str).unwrap_or_default()
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

struct CachedValue {
    value: Value,
    fetched_at: Instant,
}

#[derive(Default)]
pub struct QueryCache {
    entries: Mutex<HashMap<QueryKey, CachedValue>>,
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache").finish_non_exhaustive()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value younger than `max_age` (`None`: any age until invalidated).
    pub async fn get<T: DeserializeOwned>(&self, key: &QueryKey, max_age: Option<Duration>) -> Option<T> {
        let guard = self.entries.lock().await;
        let cached = guard.get(key)?;
        if let Some(max_age) = max_age {
            if cached.fetched_at.elapsed() >= max_age {
                return None;
            }
        }
        serde_json::from_value(cached.value.clone()).ok()
    }

    pub async fn put<T: Serialize>(&self, key: QueryKey, value: &T) -> Result<()> {
        let value = serde_json::to_value(value).with_context(|| format!("failed to cache {}", key))?;
        self.entries.lock().await.insert(
            key,
            CachedValue {
                value,
                fetched_at: Instant::now(),
            },
        );
        Ok(())
    }

    /// Serve from cache when fresh, else run `fetch` and store its result.
    /// Errors are returned as-is and never cached.
    pub async fn get_or_fetch<T, F, Fut>(&self, key: QueryKey, max_age: Option<Duration>, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(hit) = self.get(&key, max_age).await {
            debug!(%key, "cache hit");
            return Ok(hit);
        }
        debug!(%key, "cache miss");
        let value = fetch().await?;
        self.put(key, &value).await?;
        Ok(value)
    }

    /// Drop every entry under `namespace`. Returns how many were dropped.
    pub async fn invalidate_namespace(&self, namespace: &str) -> usize {
        let mut guard = self.entries.lock().await;
        let before = guard.len();
        guard.retain(|key, _| key.namespace() != namespace);
        let dropped = before - guard.len();
        debug!(namespace, dropped, "cache namespace invalidated");
        dropped
    }

    /// Drop entries whose key starts with `prefix`.
    pub async fn invalidate_prefix(&self, prefix: &[&str]) -> usize {
        let mut guard = self.entries.lock().await;
        let before = guard.len();
        guard.retain(|key, _| {
            !(key.parts().len() >= prefix.len()
                && key.parts().iter().zip(prefix).all(|(a, b)| a == b))
        });
        before - guard.len()
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
