//! Test doubles shared by unit tests.
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::backend::Backend;
use crate::model::{
    EntryFields, GroupNotes, GroupResponseCount, HookTemplates, InquirySummary, OutreachEntry,
    Principal, UserProfile, UserRole,
};

/// Backend whose health answers are scripted; every other call fails.
#[derive(Default)]
pub struct StubBackend {
    health: Mutex<VecDeque<Result<bool, String>>>,
    health_calls: AtomicUsize,
}

impl StubBackend {
    /// Queue probe answers; once drained the probe reports healthy.
    pub fn script_health(&self, answers: Vec<Result<bool, String>>) {
        self.health.lock().unwrap().extend(answers);
    }

    pub fn health_calls(&self) -> usize {
        self.health_calls.load(Ordering::SeqCst)
    }
}

fn unscripted<T>(method: &str) -> Result<T> {
    Err(anyhow!("StubBackend: {} not scripted", method))
}

#[async_trait]
impl Backend for StubBackend {
    async fn health(&self) -> Result<bool> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        match self.health.lock().unwrap().pop_front() {
            Some(Ok(v)) => Ok(v),
            Some(Err(msg)) => Err(anyhow!(msg)),
            None => Ok(true),
        }
    }

    async fn initialize_access_control_with_secret(&self, _secret: &str) -> Result<()> {
        Ok(())
    }

    async fn create_entry(&self, _fields: &EntryFields) -> Result<OutreachEntry> {
        unscripted("createEntry")
    }

    async fn update_entry(&self, _id: u64, _fields: &EntryFields) -> Result<OutreachEntry> {
        unscripted("updateEntry")
    }

    async fn delete_entry(&self, _id: u64) -> Result<()> {
        unscripted("deleteEntry")
    }

    async fn get_entry(&self, _id: u64) -> Result<OutreachEntry> {
        unscripted("getEntry")
    }

    async fn list_entries(&self, _page: u64, _page_size: u64) -> Result<Vec<OutreachEntry>> {
        unscripted("listEntries")
    }

    async fn get_follow_up_today(&self, _today: &str) -> Result<Vec<OutreachEntry>> {
        unscripted("getFollowUpToday")
    }

    async fn get_group_response_summary(&self) -> Result<Vec<GroupResponseCount>> {
        unscripted("getGroupResponseSummary")
    }

    async fn get_inquiry_summary_by_event_type(&self) -> Result<InquirySummary> {
        unscripted("getInquirySummaryByEventType")
    }

    async fn get_group_notes(&self, _group_url: &str) -> Result<Option<String>> {
        unscripted("getGroupNotes")
    }

    async fn set_group_notes(&self, _group_url: &str, _notes: &str) -> Result<()> {
        unscripted("setGroupNotes")
    }

    async fn list_all_group_notes(&self) -> Result<Vec<GroupNotes>> {
        unscripted("listAllGroupNotes")
    }

    async fn get_hook_templates_for_caller(&self) -> Result<HookTemplates> {
        unscripted("getHookTemplatesForCaller")
    }

    async fn save_hook_templates(&self, _templates: &HookTemplates) -> Result<()> {
        unscripted("saveHookTemplates")
    }

    async fn get_caller_user_profile(&self) -> Result<Option<UserProfile>> {
        unscripted("getCallerUserProfile")
    }

    async fn save_caller_user_profile(&self, _profile: &UserProfile) -> Result<()> {
        unscripted("saveCallerUserProfile")
    }

    async fn get_user_profile(&self, _user: &Principal) -> Result<Option<UserProfile>> {
        unscripted("getUserProfile")
    }

    async fn get_caller_user_role(&self) -> Result<UserRole> {
        unscripted("getCallerUserRole")
    }

    async fn assign_caller_user_role(&self, _user: &Principal, _role: UserRole) -> Result<()> {
        unscripted("assignCallerUserRole")
    }

    async fn is_caller_admin(&self) -> Result<bool> {
        unscripted("isCallerAdmin")
    }
}
