use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use tracing::debug;

use super::{Gate, OutreachService, QueryState};
use crate::cache::{self, QueryKey};
use crate::model::{
    GroupNotes, GroupResponseCount, HookTemplates, InquirySummary, OutreachEntry, Principal,
    UserProfile, UserRole,
};
use crate::session::Actor;

impl OutreachService {
    /// Gate, then serve from cache or call the backend once. No retries.
    async fn run_query<T, F, Fut>(&self, key: QueryKey, fetch: F) -> QueryState<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(Actor) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(gate) = self.gate().await {
            debug!(%key, ?gate, "query disabled");
            return QueryState::Disabled(gate);
        }
        let actor = match self.actor() {
            Ok(actor) => actor.clone(),
            Err(err) => return QueryState::Error(err),
        };
        QueryState::from_result(self.cache.get_or_fetch(key, None, move || fetch(actor)).await)
    }

    /// First page of entries.
    pub async fn list_entries(&self) -> QueryState<Vec<OutreachEntry>> {
        let page_size = self.page_size;
        let key = self
            .key(cache::OUTREACH, "entries")
            .with("0")
            .with(page_size.to_string());
        self.run_query(key, move |actor| async move { actor.list_entries(0, page_size).await })
            .await
    }

    /// Entries whose follow-up date is today.
    pub async fn follow_up_today(&self) -> QueryState<Vec<OutreachEntry>> {
        let today = self.today().format("%Y-%m-%d").to_string();
        let key = self.key(cache::OUTREACH, "followUpToday").with(today.clone());
        self.run_query(key, move |actor| async move { actor.get_follow_up_today(&today).await })
            .await
    }

    pub async fn group_summary(&self) -> QueryState<Vec<GroupResponseCount>> {
        let key = self.key(cache::OUTREACH, "groupSummary");
        self.run_query(key, |actor| async move { actor.get_group_response_summary().await })
            .await
    }

    pub async fn inquiry_summary(&self) -> QueryState<InquirySummary> {
        let key = self.key(cache::OUTREACH, "inquirySummary");
        self.run_query(key, |actor| async move {
            actor.get_inquiry_summary_by_event_type().await
        })
        .await
    }

    pub async fn get_entry(&self, id: u64) -> QueryState<OutreachEntry> {
        let key = self.key(cache::OUTREACH, "entry").with(id.to_string());
        self.run_query(key, move |actor| async move { actor.get_entry(id).await })
            .await
    }

    /// Notes for one group. Disabled while the URL is blank.
    pub async fn group_notes(&self, group_url: &str) -> QueryState<Option<String>> {
        let group_url = group_url.trim().to_string();
        if group_url.is_empty() {
            return QueryState::Disabled(Gate::MissingInput("group URL"));
        }
        let key = self.key(cache::OUTREACH, "groupNotes").with(group_url.clone());
        self.run_query(key, move |actor| async move { actor.get_group_notes(&group_url).await })
            .await
    }

    pub async fn all_group_notes(&self) -> QueryState<Vec<GroupNotes>> {
        let key = self.key(cache::OUTREACH, "allGroupNotes");
        self.run_query(key, |actor| async move { actor.list_all_group_notes().await })
            .await
    }

    pub async fn hook_templates(&self) -> QueryState<HookTemplates> {
        let key = self.key(cache::HOOK_TEMPLATES, "list");
        self.run_query(key, |actor| async move { actor.get_hook_templates_for_caller().await })
            .await
    }

    pub async fn caller_profile(&self) -> QueryState<Option<UserProfile>> {
        let key = self.key(cache::USER, "callerProfile");
        self.run_query(key, |actor| async move { actor.get_caller_user_profile().await })
            .await
    }

    pub async fn user_profile(&self, user: &Principal) -> QueryState<Option<UserProfile>> {
        let user = user.clone();
        let key = self.key(cache::USER, "profile").with(user.to_string());
        self.run_query(key, move |actor| async move { actor.get_user_profile(&user).await })
            .await
    }

    pub async fn caller_role(&self) -> QueryState<UserRole> {
        let key = self.key(cache::USER, "callerRole");
        self.run_query(key, |actor| async move { actor.get_caller_user_role().await })
            .await
    }

    pub async fn is_caller_admin(&self) -> QueryState<bool> {
        let key = self.key(cache::USER, "isCallerAdmin");
        self.run_query(key, |actor| async move { actor.is_caller_admin().await })
            .await
    }
}
