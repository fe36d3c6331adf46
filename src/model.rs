use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::blob::ExternalBlob;

/// Textual form of the anonymous principal.
pub const ANONYMOUS_PRINCIPAL: &str = "2vxsx-fae";

/// Opaque caller identity as the backend reports it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Principal(pub String);

impl Principal {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn anonymous() -> Self {
        Self(ANONYMOUS_PRINCIPAL.to_string())
    }

    pub fn is_anonymous(&self) -> bool {
        self.0 == ANONYMOUS_PRINCIPAL
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ResponseStatus {
    #[default]
    NoResponse,
    ActiveDiscussion,
    LeadsGenerated,
    NegativeFeedback,
}

impl ResponseStatus {
    /// Selection order used by the entry form.
    pub const ALL: [ResponseStatus; 4] = [
        ResponseStatus::NoResponse,
        ResponseStatus::ActiveDiscussion,
        ResponseStatus::LeadsGenerated,
        ResponseStatus::NegativeFeedback,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ResponseStatus::NoResponse => "No Response",
            ResponseStatus::ActiveDiscussion => "Question",
            ResponseStatus::LeadsGenerated => "Lead",
            ResponseStatus::NegativeFeedback => "Negative Feedback",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseStatus::NoResponse => "NoResponse",
            ResponseStatus::ActiveDiscussion => "ActiveDiscussion",
            ResponseStatus::LeadsGenerated => "LeadsGenerated",
            ResponseStatus::NegativeFeedback => "NegativeFeedback",
        }
    }

    /// Accepts either the wire name or the display label, case-insensitively.
    pub fn parse(text: &str) -> Option<Self> {
        let needle = text.trim();
        Self::ALL.into_iter().find(|s| {
            s.as_str().eq_ignore_ascii_case(needle) || s.label().eq_ignore_ascii_case(needle)
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CraftCategory {
    SplatterRoom,
    CandleMaking,
    SoapMaking,
}

impl CraftCategory {
    pub const ALL: [CraftCategory; 3] = [
        CraftCategory::SplatterRoom,
        CraftCategory::CandleMaking,
        CraftCategory::SoapMaking,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CraftCategory::SplatterRoom => "Splatter Room",
            CraftCategory::CandleMaking => "Candle Making",
            CraftCategory::SoapMaking => "Soap Making",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TypeOfInterest {
    Price,
    Availability,
    GroupBooking,
}

impl TypeOfInterest {
    pub const ALL: [TypeOfInterest; 3] = [
        TypeOfInterest::Price,
        TypeOfInterest::Availability,
        TypeOfInterest::GroupBooking,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TypeOfInterest::Price => "Price",
            TypeOfInterest::Availability => "Availability",
            TypeOfInterest::GroupBooking => "Group Booking",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EventType {
    #[serde(rename = "GeneralDIYIndividual")]
    GeneralDiyIndividual,
    BirthdayPartyKids,
    BirthdayPartyAdult,
    BacheloretteBridalShower,
    GirlsNightOut,
    FieldTrips,
    CorporateTeamBuilding,
}

impl EventType {
    pub const ALL: [EventType; 7] = [
        EventType::GeneralDiyIndividual,
        EventType::BirthdayPartyKids,
        EventType::BirthdayPartyAdult,
        EventType::BacheloretteBridalShower,
        EventType::GirlsNightOut,
        EventType::FieldTrips,
        EventType::CorporateTeamBuilding,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            EventType::GeneralDiyIndividual => "General DIY (Individual)",
            EventType::BirthdayPartyKids => "Birthday Party (Kids)",
            EventType::BirthdayPartyAdult => "Birthday Party (Adult)",
            EventType::BacheloretteBridalShower => "Bachelorette/Bridal Shower",
            EventType::GirlsNightOut => "Girls' Night Out",
            EventType::FieldTrips => "Field Trips",
            EventType::CorporateTeamBuilding => "Corporate Team Building",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    User,
    Guest,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::User => "user",
            UserRole::Guest => "guest",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "user" => Ok(UserRole::User),
            "guest" => Ok(UserRole::Guest),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// One post made to one group, as the backend returns it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OutreachEntry {
    pub id: u64,
    pub group_name: String,
    pub group_url: String,
    pub date_posted: String,
    pub post_content: String,
    pub num_reactions: u64,
    pub num_comments: u64,
    pub response_status: ResponseStatus,
    pub follow_up_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub craft_category: Option<CraftCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_of_interest: Option<TypeOfInterest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<EventType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Principal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<ExternalBlob>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl OutreachEntry {
    /// Grouping key for per-group views: URL, or name when the URL is empty.
    pub fn group_key(&self) -> &str {
        if self.group_url.is_empty() {
            &self.group_name
        } else {
            &self.group_url
        }
    }
}

/// Every client-editable field of an entry; the payload of create and update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EntryFields {
    pub group_name: String,
    pub group_url: String,
    pub date_posted: String,
    pub post_content: String,
    pub num_reactions: u64,
    pub num_comments: u64,
    pub response_status: ResponseStatus,
    pub follow_up_date: String,
    pub craft_category: Option<CraftCategory>,
    pub type_of_interest: Option<TypeOfInterest>,
    pub event_type: Option<EventType>,
    pub contact_info: Option<String>,
    pub attachment: Option<ExternalBlob>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HookTemplate {
    pub title: String,
    pub content: String,
}

pub const HOOK_TEMPLATE_COUNT: usize = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("expected exactly {expected} hook templates, got {got}")]
    WrongCount { expected: usize, got: usize },
    #[error("no hook template at position {0}")]
    OutOfRange(usize),
    #[error("Cannot copy empty hook")]
    EmptyContent,
}

/// The caller's hook library: always exactly three templates.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "Vec<HookTemplate>", into = "Vec<HookTemplate>")]
pub struct HookTemplates([HookTemplate; HOOK_TEMPLATE_COUNT]);

impl HookTemplates {
    pub fn new(templates: [HookTemplate; HOOK_TEMPLATE_COUNT]) -> Self {
        Self(templates)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HookTemplate> {
        self.0.iter()
    }

    pub fn get(&self, index: usize) -> Option<&HookTemplate> {
        self.0.get(index)
    }

    pub fn set(&mut self, index: usize, template: HookTemplate) -> Result<(), TemplateError> {
        let slot = self.0.get_mut(index).ok_or(TemplateError::OutOfRange(index))?;
        *slot = template;
        Ok(())
    }

    /// Content ready for the clipboard; blank hooks are refused.
    pub fn copyable_content(&self, index: usize) -> Result<&str, TemplateError> {
        let template = self.get(index).ok_or(TemplateError::OutOfRange(index))?;
        if template.content.trim().is_empty() {
            return Err(TemplateError::EmptyContent);
        }
        Ok(&template.content)
    }
}

impl TryFrom<Vec<HookTemplate>> for HookTemplates {
    type Error = TemplateError;

    fn try_from(value: Vec<HookTemplate>) -> Result<Self, Self::Error> {
        let got = value.len();
        let arr: [HookTemplate; HOOK_TEMPLATE_COUNT] = value.try_into().map_err(|_| {
            TemplateError::WrongCount {
                expected: HOOK_TEMPLATE_COUNT,
                got,
            }
        })?;
        Ok(Self(arr))
    }
}

impl From<HookTemplates> for Vec<HookTemplate> {
    fn from(value: HookTemplates) -> Self {
        value.0.into()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub name: String,
}

/// Backend aggregate: responses per group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "(String, u64)", into = "(String, u64)")]
pub struct GroupResponseCount {
    pub group_name: String,
    pub count: u64,
}

impl From<(String, u64)> for GroupResponseCount {
    fn from((group_name, count): (String, u64)) -> Self {
        Self { group_name, count }
    }
}

impl From<GroupResponseCount> for (String, u64) {
    fn from(value: GroupResponseCount) -> Self {
        (value.group_name, value.count)
    }
}

/// Backend aggregate: group-booking inquiries per event type.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InquirySummary {
    #[serde(rename = "generalDIY")]
    pub general_diy: u64,
    pub birthday_party_kids: u64,
    pub birthday_party_adult: u64,
    pub bachelorette_bridal_shower: u64,
    pub girls_night_out: u64,
    pub field_trips: u64,
    pub corporate_team_building: u64,
}

impl InquirySummary {
    pub fn count(&self, event_type: EventType) -> u64 {
        match event_type {
            EventType::GeneralDiyIndividual => self.general_diy,
            EventType::BirthdayPartyKids => self.birthday_party_kids,
            EventType::BirthdayPartyAdult => self.birthday_party_adult,
            EventType::BacheloretteBridalShower => self.bachelorette_bridal_shower,
            EventType::GirlsNightOut => self.girls_night_out,
            EventType::FieldTrips => self.field_trips,
            EventType::CorporateTeamBuilding => self.corporate_team_building,
        }
    }
}

/// Notes attached to a group URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct GroupNotes {
    pub group_url: String,
    pub notes: String,
}

impl From<(String, String)> for GroupNotes {
    fn from((group_url, notes): (String, String)) -> Self {
        Self { group_url, notes }
    }
}

impl From<GroupNotes> for (String, String) {
    fn from(value: GroupNotes) -> Self {
        (value.group_url, value.notes)
    }
}
