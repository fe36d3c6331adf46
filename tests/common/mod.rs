#![allow(dead_code)]

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use outreach_tracker::backend::Backend;
use outreach_tracker::config::{self, Config};
use outreach_tracker::model::{
    EntryFields, GroupNotes, GroupResponseCount, HookTemplates, InquirySummary, OutreachEntry,
    Principal, ResponseStatus, TypeOfInterest, UserProfile, UserRole,
};
use outreach_tracker::service::OutreachService;
use outreach_tracker::session::{self, Actor, IdentityState, SessionSources, SourceState};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
}

pub fn test_config() -> Config {
    serde_yaml::from_str(config::example()).unwrap()
}

pub fn fields(group: &str, url: &str, date: &str) -> EntryFields {
    EntryFields {
        group_name: group.into(),
        group_url: url.into(),
        date_posted: date.into(),
        post_content: format!("Hello {}", group),
        follow_up_date: date.into(),
        ..Default::default()
    }
}

#[derive(Default)]
struct Store {
    next_id: u64,
    clock: i64,
    entries: Vec<OutreachEntry>,
    notes: BTreeMap<String, String>,
    hooks: HookTemplates,
    profile: Option<UserProfile>,
    roles: HashMap<Principal, UserRole>,
}

/// In-memory backend that records every call by RPC method name.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    store: Arc<Mutex<Store>>,
    calls: Arc<Mutex<Vec<&'static str>>>,
    health: Arc<Mutex<VecDeque<Result<bool, String>>>>,
    failures: Arc<Mutex<HashMap<&'static str, String>>>,
}

impl MemoryBackend {
    /// Queue probe answers; once drained the probe reports healthy.
    pub async fn script_health(&self, answers: Vec<Result<bool, String>>) {
        self.health.lock().await.extend(answers);
    }

    /// Make every later call to `method` fail with `message`.
    pub async fn fail(&self, method: &'static str, message: &str) {
        self.failures.lock().await.insert(method, message.to_string());
    }

    pub async fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().await.clone()
    }

    pub async fn calls_to(&self, method: &str) -> usize {
        self.calls.lock().await.iter().filter(|m| **m == method).count()
    }

    pub async fn stored(&self, id: u64) -> Option<OutreachEntry> {
        self.store.lock().await.entries.iter().find(|e| e.id == id).cloned()
    }

    pub async fn stored_notes(&self, group_url: &str) -> Option<String> {
        self.store.lock().await.notes.get(group_url).cloned()
    }

    /// Insert an entry directly, without recording a call.
    pub async fn seed(&self, fields: &EntryFields) -> OutreachEntry {
        self.store.lock().await.insert(fields)
    }

    async fn record(&self, method: &'static str) -> Result<()> {
        self.calls.lock().await.push(method);
        match self.failures.lock().await.get(method) {
            Some(message) => Err(anyhow!(message.clone())),
            None => Ok(()),
        }
    }

    pub fn actor(&self) -> Actor {
        Arc::new(self.clone())
    }

    /// Service running anonymously against this backend.
    pub fn service(&self) -> OutreachService {
        let sources = SessionSources {
            identity: IdentityState::Resolved(None),
            authenticated: SourceState::Idle,
            admin_token: SourceState::Idle,
            anonymous: SourceState::Ready(self.actor()),
            has_admin_token: false,
        };
        OutreachService::new(session::resolve(&sources), &test_config()).with_today(today())
    }
}

impl Store {
    fn tick(&mut self) -> i64 {
        self.clock += 1_000_000_000;
        self.clock
    }

    fn insert(&mut self, fields: &EntryFields) -> OutreachEntry {
        self.next_id += 1;
        let now = self.tick();
        let entry = build_entry(self.next_id, fields, now, now);
        self.entries.push(entry.clone());
        entry
    }
}

fn build_entry(id: u64, f: &EntryFields, created_at: i64, updated_at: i64) -> OutreachEntry {
    OutreachEntry {
        id,
        group_name: f.group_name.clone(),
        group_url: f.group_url.clone(),
        date_posted: f.date_posted.clone(),
        post_content: f.post_content.clone(),
        num_reactions: f.num_reactions,
        num_comments: f.num_comments,
        response_status: f.response_status,
        follow_up_date: f.follow_up_date.clone(),
        craft_category: f.craft_category,
        type_of_interest: f.type_of_interest,
        event_type: f.event_type,
        contact_info: f.contact_info.clone(),
        owner: None,
        attachment: f.attachment.clone(),
        created_at,
        updated_at,
    }
}

#[async_trait::async_trait]
impl Backend for MemoryBackend {
    async fn health(&self) -> Result<bool> {
        self.calls.lock().await.push("health");
        match self.health.lock().await.pop_front() {
            Some(Ok(v)) => Ok(v),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Ok(true),
        }
    }

    async fn initialize_access_control_with_secret(&self, _secret: &str) -> Result<()> {
        self.record("initializeAccessControlWithSecret").await
    }

    async fn create_entry(&self, fields: &EntryFields) -> Result<OutreachEntry> {
        self.record("createEntry").await?;
        Ok(self.store.lock().await.insert(fields))
    }

    async fn update_entry(&self, id: u64, fields: &EntryFields) -> Result<OutreachEntry> {
        self.record("updateEntry").await?;
        let mut store = self.store.lock().await;
        let now = store.tick();
        let slot = store
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| anyhow!("Entry not found"))?;
        *slot = build_entry(id, fields, slot.created_at, now);
        Ok(slot.clone())
    }

    async fn delete_entry(&self, id: u64) -> Result<()> {
        self.record("deleteEntry").await?;
        let mut store = self.store.lock().await;
        let before = store.entries.len();
        store.entries.retain(|e| e.id != id);
        if store.entries.len() == before {
            return Err(anyhow!("Entry not found"));
        }
        Ok(())
    }

    async fn get_entry(&self, id: u64) -> Result<OutreachEntry> {
        self.record("getEntry").await?;
        self.stored(id).await.ok_or_else(|| anyhow!("Entry not found"))
    }

    async fn list_entries(&self, page: u64, page_size: u64) -> Result<Vec<OutreachEntry>> {
        self.record("listEntries").await?;
        let store = self.store.lock().await;
        Ok(store
            .entries
            .iter()
            .skip((page * page_size) as usize)
            .take(page_size as usize)
            .cloned()
            .collect())
    }

    async fn get_follow_up_today(&self, today: &str) -> Result<Vec<OutreachEntry>> {
        self.record("getFollowUpToday").await?;
        let store = self.store.lock().await;
        Ok(store
            .entries
            .iter()
            .filter(|e| e.follow_up_date == today)
            .cloned()
            .collect())
    }

    async fn get_group_response_summary(&self) -> Result<Vec<GroupResponseCount>> {
        self.record("getGroupResponseSummary").await?;
        let store = self.store.lock().await;
        let mut counts: Vec<GroupResponseCount> = Vec::new();
        for e in store.entries.iter().filter(|e| {
            matches!(
                e.response_status,
                ResponseStatus::ActiveDiscussion | ResponseStatus::LeadsGenerated
            )
        }) {
            match counts.iter_mut().find(|c| c.group_name == e.group_name) {
                Some(c) => c.count += 1,
                None => counts.push(GroupResponseCount {
                    group_name: e.group_name.clone(),
                    count: 1,
                }),
            }
        }
        Ok(counts)
    }

    async fn get_inquiry_summary_by_event_type(&self) -> Result<InquirySummary> {
        self.record("getInquirySummaryByEventType").await?;
        let store = self.store.lock().await;
        let mut summary = InquirySummary::default();
        for e in &store.entries {
            if e.type_of_interest != Some(TypeOfInterest::GroupBooking) {
                continue;
            }
            use outreach_tracker::model::EventType::*;
            match e.event_type {
                Some(GeneralDiyIndividual) => summary.general_diy += 1,
                Some(BirthdayPartyKids) => summary.birthday_party_kids += 1,
                Some(BirthdayPartyAdult) => summary.birthday_party_adult += 1,
                Some(BacheloretteBridalShower) => summary.bachelorette_bridal_shower += 1,
                Some(GirlsNightOut) => summary.girls_night_out += 1,
                Some(FieldTrips) => summary.field_trips += 1,
                Some(CorporateTeamBuilding) => summary.corporate_team_building += 1,
                None => {}
            }
        }
        Ok(summary)
    }

    async fn get_group_notes(&self, group_url: &str) -> Result<Option<String>> {
        self.record("getGroupNotes").await?;
        Ok(self.stored_notes(group_url).await)
    }

    async fn set_group_notes(&self, group_url: &str, notes: &str) -> Result<()> {
        self.record("setGroupNotes").await?;
        self.store
            .lock()
            .await
            .notes
            .insert(group_url.to_string(), notes.to_string());
        Ok(())
    }

    async fn list_all_group_notes(&self) -> Result<Vec<GroupNotes>> {
        self.record("listAllGroupNotes").await?;
        let store = self.store.lock().await;
        Ok(store
            .notes
            .iter()
            .map(|(url, notes)| GroupNotes {
                group_url: url.clone(),
                notes: notes.clone(),
            })
            .collect())
    }

    async fn get_hook_templates_for_caller(&self) -> Result<HookTemplates> {
        self.record("getHookTemplatesForCaller").await?;
        Ok(self.store.lock().await.hooks.clone())
    }

    async fn save_hook_templates(&self, templates: &HookTemplates) -> Result<()> {
        self.record("saveHookTemplates").await?;
        self.store.lock().await.hooks = templates.clone();
        Ok(())
    }

    async fn get_caller_user_profile(&self) -> Result<Option<UserProfile>> {
        self.record("getCallerUserProfile").await?;
        Ok(self.store.lock().await.profile.clone())
    }

    async fn save_caller_user_profile(&self, profile: &UserProfile) -> Result<()> {
        self.record("saveCallerUserProfile").await?;
        self.store.lock().await.profile = Some(profile.clone());
        Ok(())
    }

    async fn get_user_profile(&self, _user: &Principal) -> Result<Option<UserProfile>> {
        self.record("getUserProfile").await?;
        Ok(self.store.lock().await.profile.clone())
    }

    async fn get_caller_user_role(&self) -> Result<UserRole> {
        self.record("getCallerUserRole").await?;
        Ok(UserRole::Guest)
    }

    async fn assign_caller_user_role(&self, user: &Principal, role: UserRole) -> Result<()> {
        self.record("assignCallerUserRole").await?;
        self.store.lock().await.roles.insert(user.clone(), role);
        Ok(())
    }

    async fn is_caller_admin(&self) -> Result<bool> {
        self.record("isCallerAdmin").await?;
        Ok(false)
    }
}
