use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::backend::model::RpcResponse;
use crate::config::Config;
use crate::model::{
    EntryFields, GroupNotes, GroupResponseCount, HookTemplates, InquirySummary, OutreachEntry,
    Principal, UserProfile, UserRole,
};

pub mod model;

/// The remote RPC surface. Every call runs under the identity of the actor
/// that implements it.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn health(&self) -> Result<bool>;

    async fn initialize_access_control_with_secret(&self, secret: &str) -> Result<()>;

    async fn create_entry(&self, fields: &EntryFields) -> Result<OutreachEntry>;
    async fn update_entry(&self, id: u64, fields: &EntryFields) -> Result<OutreachEntry>;
    async fn delete_entry(&self, id: u64) -> Result<()>;
    async fn get_entry(&self, id: u64) -> Result<OutreachEntry>;
    async fn list_entries(&self, page: u64, page_size: u64) -> Result<Vec<OutreachEntry>>;
    async fn get_follow_up_today(&self, today: &str) -> Result<Vec<OutreachEntry>>;

    async fn get_group_response_summary(&self) -> Result<Vec<GroupResponseCount>>;
    async fn get_inquiry_summary_by_event_type(&self) -> Result<InquirySummary>;

    async fn get_group_notes(&self, group_url: &str) -> Result<Option<String>>;
    async fn set_group_notes(&self, group_url: &str, notes: &str) -> Result<()>;
    async fn list_all_group_notes(&self) -> Result<Vec<GroupNotes>>;

    async fn get_hook_templates_for_caller(&self) -> Result<HookTemplates>;
    async fn save_hook_templates(&self, templates: &HookTemplates) -> Result<()>;

    async fn get_caller_user_profile(&self) -> Result<Option<UserProfile>>;
    async fn save_caller_user_profile(&self, profile: &UserProfile) -> Result<()>;
    async fn get_user_profile(&self, user: &Principal) -> Result<Option<UserProfile>>;
    async fn get_caller_user_role(&self) -> Result<UserRole>;
    async fn assign_caller_user_role(&self, user: &Principal, role: UserRole) -> Result<()>;
    async fn is_caller_admin(&self) -> Result<bool>;
}

/// JSON-over-HTTP actor: `POST {base}/rpc/{method}` with positional arguments.
#[derive(Clone)]
pub struct HttpBackend {
    http: Client,
    base_url: Url,
    identity_token: Option<String>,
}

impl fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpBackend")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.identity_token.is_some())
            .finish_non_exhaustive()
    }
}

impl HttpBackend {
    pub fn new(base_url: Url, user_agent: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url,
            identity_token: None,
        })
    }

    /// Anonymous actor built from configuration.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(cfg.base_url()?, &cfg.backend.user_agent, cfg.timeout())
    }

    /// Same transport, calls signed with an identity bearer token.
    pub fn with_identity(mut self, token: impl Into<String>) -> Self {
        self.identity_token = Some(token.into());
        self
    }

    pub fn build_request(&self, method: &str, args: &Value) -> Result<reqwest::Request> {
        let endpoint = self
            .base_url
            .join(&format!("rpc/{}", method))
            .context("invalid backend base URL")?;
        let mut builder = self
            .http
            .post(endpoint)
            .header("Content-Type", "application/json")
            .header("X-Request-Id", Uuid::new_v4().to_string())
            .json(args);
        if let Some(token) = &self.identity_token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        builder.build().context("failed to build backend request")
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, args: Value) -> Result<T> {
        let request = self.build_request(method, &args)?;
        let request_id = request
            .headers()
            .get("X-Request-Id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        debug!(method, %request_id, url = %request.url(), "backend call");

        let res = self
            .http
            .execute(request)
            .await
            .with_context(|| format!("network error: failed to reach backend for {}", method))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!(method, %request_id, %status, "backend call failed");
            return Err(anyhow!("backend error {} calling {}: {}", status, method, body));
        }

        let body = res
            .text()
            .await
            .with_context(|| format!("failed to read {} response", method))?;
        let envelope: RpcResponse<T> = serde_json::from_str(&body)
            .with_context(|| format!("invalid {} response JSON", method))?;
        match envelope {
            RpcResponse::Ok(value) => {
                debug!(method, %request_id, "backend call ok");
                Ok(value)
            }
            RpcResponse::Err(message) => {
                warn!(method, %request_id, %message, "backend rejected call");
                Err(anyhow!(message))
            }
        }
    }
}

fn entry_args(fields: &EntryFields) -> Vec<Value> {
    vec![
        json!(fields.group_name),
        json!(fields.group_url),
        json!(fields.date_posted),
        json!(fields.post_content),
        json!(fields.num_reactions),
        json!(fields.num_comments),
        json!(fields.response_status),
        json!(fields.follow_up_date),
        json!(fields.craft_category),
        json!(fields.type_of_interest),
        json!(fields.event_type),
        json!(fields.contact_info),
        json!(fields.attachment),
    ]
}

#[async_trait]
impl Backend for HttpBackend {
    async fn health(&self) -> Result<bool> {
        self.call("health", json!([])).await
    }

    async fn initialize_access_control_with_secret(&self, secret: &str) -> Result<()> {
        info!("initializing access control with admin token");
        self.call("_initializeAccessControlWithSecret", json!([secret]))
            .await
    }

    async fn create_entry(&self, fields: &EntryFields) -> Result<OutreachEntry> {
        self.call("createEntry", Value::Array(entry_args(fields))).await
    }

    async fn update_entry(&self, id: u64, fields: &EntryFields) -> Result<OutreachEntry> {
        let mut args = vec![json!(id)];
        args.extend(entry_args(fields));
        self.call("updateEntry", Value::Array(args)).await
    }

    async fn delete_entry(&self, id: u64) -> Result<()> {
        self.call("deleteEntry", json!([id])).await
    }

    async fn get_entry(&self, id: u64) -> Result<OutreachEntry> {
        self.call("getEntry", json!([id])).await
    }

    async fn list_entries(&self, page: u64, page_size: u64) -> Result<Vec<OutreachEntry>> {
        self.call("listEntries", json!([page, page_size])).await
    }

    async fn get_follow_up_today(&self, today: &str) -> Result<Vec<OutreachEntry>> {
        self.call("getFollowUpToday", json!([today])).await
    }

    async fn get_group_response_summary(&self) -> Result<Vec<GroupResponseCount>> {
        self.call("getGroupResponseSummary", json!([])).await
    }

    async fn get_inquiry_summary_by_event_type(&self) -> Result<InquirySummary> {
        self.call("getInquirySummaryByEventType", json!([])).await
    }

    async fn get_group_notes(&self, group_url: &str) -> Result<Option<String>> {
        self.call("getGroupNotes", json!([group_url])).await
    }

    async fn set_group_notes(&self, group_url: &str, notes: &str) -> Result<()> {
        self.call("setGroupNotes", json!([group_url, notes])).await
    }

    async fn list_all_group_notes(&self) -> Result<Vec<GroupNotes>> {
        self.call("listAllGroupNotes", json!([])).await
    }

    async fn get_hook_templates_for_caller(&self) -> Result<HookTemplates> {
        self.call("getHookTemplatesForCaller", json!([])).await
    }

    async fn save_hook_templates(&self, templates: &HookTemplates) -> Result<()> {
        self.call("saveHookTemplates", json!([templates])).await
    }

    async fn get_caller_user_profile(&self) -> Result<Option<UserProfile>> {
        self.call("getCallerUserProfile", json!([])).await
    }

    async fn save_caller_user_profile(&self, profile: &UserProfile) -> Result<()> {
        self.call("saveCallerUserProfile", json!([profile])).await
    }

    async fn get_user_profile(&self, user: &Principal) -> Result<Option<UserProfile>> {
        self.call("getUserProfile", json!([user])).await
    }

    async fn get_caller_user_role(&self) -> Result<UserRole> {
        self.call("getCallerUserRole", json!([])).await
    }

    async fn assign_caller_user_role(&self, user: &Principal, role: UserRole) -> Result<()> {
        self.call("assignCallerUserRole", json!([user, role])).await
    }

    async fn is_caller_admin(&self) -> Result<bool> {
        self.call("isCallerAdmin", json!([])).await
    }
}
