use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One page of a paginated Graph response. Carries either a `nextLink`
/// (more pages in the current set) or a `deltaLink` (set exhausted, cursor
/// resumes future incremental changes), never meaningfully both.
#[derive(Debug, Deserialize)]
pub struct ODataPage<T> {
    pub value: Vec<T>,
    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
    #[serde(rename = "@odata.deltaLink")]
    pub delta_link: Option<String>,
}

/// `OData` error response body.
#[derive(Debug, Deserialize)]
pub struct ODataErrorResponse {
    pub error: ODataErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ODataErrorBody {
    pub code: String,
    pub message: String,
}

/// Removal annotation on a delta-returned entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemovalMarker {
    pub reason: Option<String>,
}

/// Common fields of a membership entry inside a `members@delta` list.
#[derive(Debug, Clone, Deserialize)]
pub struct MemberEntry {
    pub id: String,
    #[serde(rename = "userPrincipalName")]
    pub user_principal_name: Option<String>,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
    #[serde(rename = "@removed")]
    pub removed: Option<RemovalMarker>,
}

impl MemberEntry {
    pub fn is_removed(&self) -> bool {
        self.removed.is_some()
    }
}

/// Directory object variants as tagged by Graph's `@odata.type`. Future
/// provider additions land in `Unsupported` and must be handled explicitly.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "@odata.type")]
pub enum DirectoryObject {
    #[serde(rename = "#microsoft.graph.user")]
    User(MemberEntry),
    #[serde(rename = "#microsoft.graph.group")]
    Group(MemberEntry),
    #[serde(rename = "#microsoft.graph.servicePrincipal")]
    ServicePrincipal(MemberEntry),
    #[serde(other)]
    Unsupported,
}

impl DirectoryObject {
    /// Returns the membership entry for known variants.
    pub fn entry(&self) -> Option<&MemberEntry> {
        match self {
            DirectoryObject::User(e)
            | DirectoryObject::Group(e)
            | DirectoryObject::ServicePrincipal(e) => Some(e),
            DirectoryObject::Unsupported => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            DirectoryObject::User(_) => "user",
            DirectoryObject::Group(_) => "group",
            DirectoryObject::ServicePrincipal(_) => "servicePrincipal",
            DirectoryObject::Unsupported => "unsupported",
        }
    }
}

/// One group entry from a `groups/delta` page.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupDeltaEntry {
    pub id: String,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "members@delta", default)]
    pub members_delta: Vec<DirectoryObject>,
    #[serde(rename = "@removed")]
    pub removed: Option<RemovalMarker>,
}

/// A page of the group delta query.
pub type GroupDeltaPage = ODataPage<GroupDeltaEntry>;

/// Minimal user-profile projection used when reporting membership changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
    #[serde(rename = "userPrincipalName")]
    pub user_principal_name: Option<String>,
    #[serde(rename = "createdDateTime")]
    pub created_date_time: Option<DateTime<Utc>>,
}

/// A Graph change-notification subscription as returned by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub resource: Option<String>,
    #[serde(rename = "changeType")]
    pub change_type: Option<String>,
    #[serde(rename = "notificationUrl")]
    pub notification_url: Option<String>,
    #[serde(rename = "lifecycleNotificationUrl")]
    pub lifecycle_notification_url: Option<String>,
    #[serde(rename = "clientState")]
    pub client_state: Option<String>,
    #[serde(rename = "expirationDateTime")]
    pub expiration_date_time: Option<DateTime<Utc>>,
}

/// Request body for creating a subscription.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionRequest {
    pub resource: String,
    #[serde(rename = "changeType")]
    pub change_type: String,
    #[serde(rename = "notificationUrl")]
    pub notification_url: String,
    #[serde(rename = "lifecycleNotificationUrl")]
    pub lifecycle_notification_url: String,
    #[serde(rename = "clientState")]
    pub client_state: String,
    #[serde(rename = "expirationDateTime")]
    pub expiration_date_time: DateTime<Utc>,
}
