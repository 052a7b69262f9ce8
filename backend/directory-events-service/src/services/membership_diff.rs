use graph_directory::{DirectoryClient, GraphError, UserProfile};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::models::MembershipDiff;

/// Fields resolved for each added/removed member when reporting.
const PROFILE_SELECT: &[&str] = &["id", "displayName", "userPrincipalName", "createdDateTime"];

/// Outcome of draining one delta page set.
#[derive(Debug)]
enum DrainOutcome {
    /// All pages consumed; carries the delta cursor when the provider
    /// issued one (delta-pending: late membership changes may still land).
    Complete { delta_link: Option<String> },
    /// The group went away mid-traversal, signalled either by a removal
    /// marker on the group entry or by a not-found delta response.
    GroupRemoved { reason: Option<String> },
}

/// Resolved membership changes for one group-update notification.
#[derive(Debug, Default)]
pub struct MembershipReport {
    pub added: Vec<UserProfile>,
    pub removed: Vec<UserProfile>,
}

/// Computes which members were added and removed since the prior observation
/// of a group, via a resumable delta query against the directory service.
pub struct MembershipDiffEngine {
    client: Arc<dyn DirectoryClient>,
    settle_interval: Duration,
}

impl MembershipDiffEngine {
    pub fn new(client: Arc<dyn DirectoryClient>, settle_interval: Duration) -> Self {
        Self {
            client,
            settle_interval,
        }
    }

    /// Handles a group-update notification for the given relative resource
    /// path (e.g. `groups/{id}`).
    ///
    /// A not-found group is a soft-delete inference, logged and absorbed
    /// (`Ok(None)`); any other remote error propagates to the dispatcher
    /// boundary.
    pub async fn handle_group_update(
        &self,
        resource: &str,
    ) -> Result<Option<MembershipReport>, GraphError> {
        let group = match self.client.get_object(resource).await {
            Ok(group) => group,
            Err(e) if e.is_not_found() => {
                info!("Group {} no longer resolvable, inferring soft-delete", resource);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let group_id = group
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| GraphError::Api {
                code: "MalformedResponse".to_string(),
                message: format!("group object for {resource} has no id"),
            })?;

        debug!(
            "Computing membership diff for group {} ({})",
            group_id,
            group
                .get("displayName")
                .and_then(|v| v.as_str())
                .unwrap_or("unnamed")
        );

        let mut diff = MembershipDiff::new();

        // First read may precede full server-side materialization of the
        // change; when the drain hands back a delta cursor, read once more
        // after the settling interval.
        match self.drain(Self::delta_query_url(group_id), &mut diff).await? {
            DrainOutcome::GroupRemoved { reason } => {
                info!(
                    "Group {} removed during delta traversal (reason: {}), abandoning diff",
                    group_id,
                    reason.as_deref().unwrap_or("unspecified")
                );
                return Ok(None);
            }
            DrainOutcome::Complete { delta_link: None } => {}
            DrainOutcome::Complete {
                delta_link: Some(link),
            } => {
                tokio::time::sleep(self.settle_interval).await;
                if let DrainOutcome::GroupRemoved { reason } = self.drain(link, &mut diff).await? {
                    info!(
                        "Group {} removed during delta traversal (reason: {}), abandoning diff",
                        group_id,
                        reason.as_deref().unwrap_or("unspecified")
                    );
                    return Ok(None);
                }
            }
        }

        let added = self.resolve_profiles(diff.added()).await?;
        let removed = self.resolve_profiles(diff.removed()).await?;

        info!(
            "Group {} membership diff: {} added {:?}, {} removed {:?}",
            group_id,
            added.len(),
            added
                .iter()
                .map(|p| p.user_principal_name.as_deref().unwrap_or(&p.id))
                .collect::<Vec<_>>(),
            removed.len(),
            removed
                .iter()
                .map(|p| p.user_principal_name.as_deref().unwrap_or(&p.id))
                .collect::<Vec<_>>(),
        );

        Ok(Some(MembershipReport { added, removed }))
    }

    /// Delta query scoped to one group, selecting the minimal projection and
    /// expanding members.
    fn delta_query_url(group_id: &str) -> String {
        format!(
            "groups/delta?$filter={}&$select=id,displayName,description,members\
             &$expand=members($select=id,userPrincipalName,displayName)",
            urlencoding::encode(&format!("id eq '{group_id}'"))
        )
    }

    /// Follows nextLink cursors until the current page set is exhausted,
    /// classifying every members-delta entry along the way.
    async fn drain(
        &self,
        initial_url: String,
        diff: &mut MembershipDiff,
    ) -> Result<DrainOutcome, GraphError> {
        let mut url = initial_url;

        loop {
            let page = match self.client.delta_page(&url).await {
                Ok(page) => page,
                Err(e) if e.is_not_found() => {
                    return Ok(DrainOutcome::GroupRemoved { reason: None })
                }
                Err(e) => return Err(e),
            };

            for entry in &page.value {
                if let Some(marker) = &entry.removed {
                    return Ok(DrainOutcome::GroupRemoved {
                        reason: marker.reason.clone(),
                    });
                }

                for member in &entry.members_delta {
                    let Some(member_entry) = member.entry() else {
                        warn!("Skipping unsupported member variant in group {}", entry.id);
                        continue;
                    };

                    if let Some(marker) = &member_entry.removed {
                        debug!(
                            "Member {} removed (reason: {})",
                            member_entry.id,
                            marker.reason.as_deref().unwrap_or("unspecified")
                        );
                        diff.record_removed(&member_entry.id);
                    } else {
                        diff.record_added(&member_entry.id);
                    }
                }
            }

            match page.next_link {
                Some(next) => url = next,
                None => {
                    return Ok(DrainOutcome::Complete {
                        delta_link: page.delta_link,
                    })
                }
            }
        }
    }

    /// Resolves member ids to user profiles. Ids that no longer resolve are
    /// silently excluded from the report.
    async fn resolve_profiles(
        &self,
        ids: &std::collections::BTreeSet<String>,
    ) -> Result<Vec<UserProfile>, GraphError> {
        let mut profiles = Vec::new();

        for id in ids {
            match self.client.get_user(id, PROFILE_SELECT).await {
                Ok(profile) => profiles.push(profile),
                Err(e) if e.is_not_found() => {
                    debug!("Member {} did not resolve to a user profile, excluding", id);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(profiles)
    }
}
