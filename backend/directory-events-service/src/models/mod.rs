use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Inbound notification envelope as delivered by the Event Grid partner
/// topic (CloudEvents shape). Exists only for the duration of one dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEnvelope {
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub source: Option<String>,
    pub data: Option<serde_json::Value>,
}

/// The Graph change notification carried in an envelope's `data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeNotification {
    pub resource: Option<String>,
    #[serde(rename = "subscriptionId")]
    pub subscription_id: Option<String>,
    #[serde(rename = "changeType")]
    pub change_type: Option<ChangeType>,
    #[serde(rename = "clientState")]
    pub client_state: Option<String>,
    #[serde(rename = "resourceData")]
    pub resource_data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Created,
    Updated,
    Deleted,
}

/// Closed routing table for notification `type` tags. Unknown tags map to
/// the no-op variant instead of falling through string comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    UserUpdated,
    GroupUpdated,
    UserDeleted,
    SubscriptionReauthorizationRequired,
    Unknown,
}

impl NotificationKind {
    /// Case-insensitive exact match against the recognized tags.
    pub fn from_type_tag(tag: &str) -> Self {
        if tag.eq_ignore_ascii_case("Microsoft.Graph.UserUpdated") {
            NotificationKind::UserUpdated
        } else if tag.eq_ignore_ascii_case("Microsoft.Graph.GroupUpdated") {
            NotificationKind::GroupUpdated
        } else if tag.eq_ignore_ascii_case("Microsoft.Graph.UserDeleted") {
            NotificationKind::UserDeleted
        } else if tag.eq_ignore_ascii_case("Microsoft.Graph.SubscriptionReauthorizationRequired") {
            NotificationKind::SubscriptionReauthorizationRequired
        } else {
            NotificationKind::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::UserUpdated => "user_updated",
            NotificationKind::GroupUpdated => "group_updated",
            NotificationKind::UserDeleted => "user_deleted",
            NotificationKind::SubscriptionReauthorizationRequired => "reauthorization_required",
            NotificationKind::Unknown => "unknown",
        }
    }
}

/// Added/removed member ids accumulated across all pages of one delta
/// traversal. Set semantics: duplicate sightings across pages never
/// double-count, and an id never ends in both sets.
#[derive(Debug, Default, Clone)]
pub struct MembershipDiff {
    added: BTreeSet<String>,
    removed: BTreeSet<String>,
}

impl MembershipDiff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an addition. Ignored if the id is already marked removed;
    /// the removal marker is the final state for this observation window.
    pub fn record_added(&mut self, id: &str) {
        if !self.removed.contains(id) {
            self.added.insert(id.to_string());
        }
    }

    /// Records a removal, displacing any earlier addition of the same id.
    pub fn record_removed(&mut self, id: &str) {
        self.added.remove(id);
        self.removed.insert(id.to_string());
    }

    pub fn added(&self) -> &BTreeSet<String> {
        &self.added
    }

    pub fn removed(&self) -> &BTreeSet<String> {
        &self.removed
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}
