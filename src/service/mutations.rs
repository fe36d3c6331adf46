use anyhow::Result;
use tracing::{info, instrument};

use super::OutreachService;
use crate::cache;
use crate::model::{EntryFields, HookTemplates, OutreachEntry, Principal, UserProfile, UserRole};

// Mutations skip the health gate and fail fast; a successful write drops the
// whole namespace it touched.
impl OutreachService {
    #[instrument(skip_all, fields(group = %fields.group_name))]
    pub async fn create_entry(&self, fields: &EntryFields) -> Result<OutreachEntry> {
        let entry = self.actor()?.create_entry(fields).await?;
        info!(id = entry.id, "entry created");
        self.cache.invalidate_namespace(cache::OUTREACH).await;
        Ok(entry)
    }

    #[instrument(skip(self, fields))]
    pub async fn update_entry(&self, id: u64, fields: &EntryFields) -> Result<OutreachEntry> {
        let entry = self.actor()?.update_entry(id, fields).await?;
        info!("entry updated");
        self.cache.invalidate_namespace(cache::OUTREACH).await;
        Ok(entry)
    }

    #[instrument(skip(self))]
    pub async fn delete_entry(&self, id: u64) -> Result<()> {
        self.actor()?.delete_entry(id).await?;
        info!("entry deleted");
        self.cache.invalidate_namespace(cache::OUTREACH).await;
        Ok(())
    }

    #[instrument(skip(self, notes))]
    pub async fn set_group_notes(&self, group_url: &str, notes: &str) -> Result<()> {
        self.actor()?.set_group_notes(group_url, notes).await?;
        self.cache.invalidate_namespace(cache::OUTREACH).await;
        Ok(())
    }

    #[instrument(skip_all)]
    pub async fn save_hook_templates(&self, templates: &HookTemplates) -> Result<()> {
        self.actor()?.save_hook_templates(templates).await?;
        info!("hook templates saved");
        self.cache.invalidate_namespace(cache::HOOK_TEMPLATES).await;
        Ok(())
    }

    #[instrument(skip_all)]
    pub async fn save_caller_profile(&self, profile: &UserProfile) -> Result<()> {
        self.actor()?.save_caller_user_profile(profile).await?;
        self.cache.invalidate_namespace(cache::USER).await;
        Ok(())
    }

    #[instrument(skip(self), fields(user = %user))]
    pub async fn assign_role(&self, user: &Principal, role: UserRole) -> Result<()> {
        self.actor()?.assign_caller_user_role(user, role).await?;
        info!(role = role.as_str(), "role assigned");
        self.cache.invalidate_namespace(cache::USER).await;
        Ok(())
    }
}
