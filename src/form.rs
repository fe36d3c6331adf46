//! State of the add/edit entry form and its submit path.
use anyhow::Result;
use chrono::NaiveDate;
use tracing::{info, warn};

use crate::blob::{BlobError, ExternalBlob, ImageFile};
use crate::model::{CraftCategory, EntryFields, EventType, OutreachEntry, ResponseStatus, TypeOfInterest};
use crate::service::{OutreachService, QueryState};
use crate::validation::{self, ValidationError};
use crate::views;

/// What submit does with the entry's image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentIntent {
    /// Resubmit whatever the entry already has (possibly nothing).
    Keep,
    /// Upload these bytes in place of any existing image.
    Replace(Vec<u8>),
    /// Clear the existing image.
    Remove,
}

pub fn resolve_attachment(intent: &AttachmentIntent, existing: Option<&ExternalBlob>) -> Option<ExternalBlob> {
    match intent {
        AttachmentIntent::Keep => existing.cloned(),
        AttachmentIntent::Replace(bytes) => Some(ExternalBlob::from_bytes(bytes.clone())),
        AttachmentIntent::Remove => None,
    }
}

/// Backend dates may carry a time part; the form edits the calendar date.
/// Text that is not a date is kept so validation can report it.
fn date_for_input(text: &str) -> String {
    match views::parse_post_date(text) {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => text.to_string(),
    }
}

/// Result of a submit whose entry write succeeded. The notes write is
/// independent; its failure leaves the entry saved.
#[derive(Debug)]
pub struct SubmitOutcome {
    pub entry: OutreachEntry,
    pub notes_error: Option<anyhow::Error>,
}

#[derive(Debug, Clone)]
pub struct EntryForm {
    editing: Option<OutreachEntry>,
    pub group_name: String,
    pub group_url: String,
    pub date_posted: String,
    pub post_content: String,
    pub num_reactions: String,
    pub num_comments: String,
    pub response_status: ResponseStatus,
    pub follow_up_date: String,
    pub craft_category: Option<CraftCategory>,
    pub type_of_interest: Option<TypeOfInterest>,
    pub event_type: Option<EventType>,
    pub contact_info: String,
    pub group_notes: String,
    attachment: AttachmentIntent,
    notes_loaded_for: Option<String>,
}

impl EntryForm {
    /// Blank form for a new entry; both dates default to `today`.
    pub fn new(today: NaiveDate) -> Self {
        let today = today.format("%Y-%m-%d").to_string();
        Self {
            editing: None,
            group_name: String::new(),
            group_url: String::new(),
            date_posted: today.clone(),
            post_content: String::new(),
            num_reactions: "0".into(),
            num_comments: "0".into(),
            response_status: ResponseStatus::NoResponse,
            follow_up_date: today,
            craft_category: None,
            type_of_interest: None,
            event_type: None,
            contact_info: String::new(),
            group_notes: String::new(),
            attachment: AttachmentIntent::Keep,
            notes_loaded_for: None,
        }
    }

    pub fn edit(entry: &OutreachEntry) -> Self {
        Self {
            editing: Some(entry.clone()),
            group_name: entry.group_name.clone(),
            group_url: entry.group_url.clone(),
            date_posted: date_for_input(&entry.date_posted),
            post_content: entry.post_content.clone(),
            num_reactions: entry.num_reactions.to_string(),
            num_comments: entry.num_comments.to_string(),
            response_status: entry.response_status,
            follow_up_date: date_for_input(&entry.follow_up_date),
            craft_category: entry.craft_category,
            type_of_interest: entry.type_of_interest,
            event_type: entry.event_type,
            contact_info: entry.contact_info.clone().unwrap_or_default(),
            group_notes: String::new(),
            attachment: AttachmentIntent::Keep,
            notes_loaded_for: None,
        }
    }

    pub fn editing(&self) -> Option<&OutreachEntry> {
        self.editing.as_ref()
    }

    pub fn attachment_intent(&self) -> &AttachmentIntent {
        &self.attachment
    }

    /// Pick a new image, or clear the selection with `None`.
    /// An invalid file leaves the current intent untouched.
    pub fn select_image(&mut self, file: Option<ImageFile>) -> Result<(), BlobError> {
        match file {
            Some(file) => {
                file.validate()?;
                info!(name = %file.name, size_kib = file.size_kib(), "image selected");
                self.attachment = AttachmentIntent::Replace(file.bytes);
            }
            None => {
                let had_attachment = self
                    .editing
                    .as_ref()
                    .map_or(false, |e| e.attachment.is_some());
                self.attachment = if had_attachment {
                    AttachmentIntent::Remove
                } else {
                    AttachmentIntent::Keep
                };
            }
        }
        Ok(())
    }

    /// The attachment submit would send, as a directly usable URL.
    pub fn preview_url(&self) -> Option<String> {
        let existing = self.editing.as_ref().and_then(|e| e.attachment.as_ref());
        resolve_attachment(&self.attachment, existing).map(|blob| blob.direct_url())
    }

    /// Update the URL field and load that group's saved notes. Notes shown for
    /// another URL are cleared first, so a failed load leaves the field empty.
    /// A URL whose notes were already loaded is not fetched again.
    pub async fn set_group_url(&mut self, url: &str, service: &OutreachService) -> Result<()> {
        self.group_url = url.to_string();
        let trimmed = url.trim();
        if self.notes_loaded_for.as_deref() == Some(trimmed) {
            return Ok(());
        }
        self.group_notes.clear();
        self.notes_loaded_for = None;
        if trimmed.is_empty() {
            return Ok(());
        }
        match service.group_notes(trimmed).await {
            QueryState::Ready(notes) => {
                self.group_notes = notes.unwrap_or_default();
                self.notes_loaded_for = Some(trimmed.to_string());
            }
            QueryState::Disabled(gate) => {
                warn!(?gate, "group notes not loaded");
            }
            QueryState::Error(err) => return Err(err),
        }
        Ok(())
    }

    /// Check every field and build the payload. Runs without any network.
    pub fn validate(&self) -> Result<EntryFields, ValidationError> {
        let group_name = validation::require("Group name", &self.group_name)?;
        validation::validate_url(&self.group_url)?;
        let date_posted = validation::validate_date("Date posted", &self.date_posted)?;
        let post_content = validation::require("Post content", &self.post_content)?;
        let num_reactions = validation::validate_non_negative("Reactions", &self.num_reactions)?;
        let num_comments = validation::validate_non_negative("Comments", &self.num_comments)?;
        let follow_up_date = validation::validate_date("Follow-up date", &self.follow_up_date)?;
        let contact_info = Some(self.contact_info.trim().to_string()).filter(|c| !c.is_empty());
        let existing = self.editing.as_ref().and_then(|e| e.attachment.as_ref());

        Ok(EntryFields {
            group_name,
            group_url: self.group_url.trim().to_string(),
            date_posted: date_posted.format("%Y-%m-%d").to_string(),
            post_content,
            num_reactions,
            num_comments,
            response_status: self.response_status,
            follow_up_date: follow_up_date.format("%Y-%m-%d").to_string(),
            craft_category: self.craft_category,
            type_of_interest: self.type_of_interest,
            event_type: self.event_type,
            contact_info,
            attachment: resolve_attachment(&self.attachment, existing),
        })
    }

    /// Validate, write the entry, then write the group notes.
    pub async fn submit(&self, service: &OutreachService) -> Result<SubmitOutcome> {
        let fields = self.validate()?;
        let entry = match &self.editing {
            Some(existing) => service.update_entry(existing.id, &fields).await?,
            None => service.create_entry(&fields).await?,
        };

        let notes_error = match service
            .set_group_notes(&fields.group_url, self.group_notes.trim())
            .await
        {
            Ok(()) => None,
            Err(err) => {
                warn!(id = entry.id, err = %format!("{:#}", err), "entry saved but group notes were not");
                Some(err)
            }
        };
        Ok(SubmitOutcome { entry, notes_error })
    }
}
