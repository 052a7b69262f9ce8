use graph_directory::DirectoryClient;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::AppError;
use crate::metrics;
use crate::models::{ChangeNotification, NotificationEnvelope, NotificationKind};
use crate::services::{MembershipDiffEngine, SubscriptionManager};

/// Routes inbound notification envelopes to their per-type handler.
///
/// Contract with the transport: every envelope is acknowledged no matter
/// what happens here, so handler failures are caught, logged, and counted;
/// nothing propagates back and nothing triggers a redelivery.
pub struct NotificationDispatcher {
    client: Arc<dyn DirectoryClient>,
    diff_engine: MembershipDiffEngine,
    subscription_manager: Arc<SubscriptionManager>,
    expected_client_state: String,
}

impl NotificationDispatcher {
    pub fn new(
        client: Arc<dyn DirectoryClient>,
        diff_engine: MembershipDiffEngine,
        subscription_manager: Arc<SubscriptionManager>,
        expected_client_state: String,
    ) -> Self {
        Self {
            client,
            diff_engine,
            subscription_manager,
            expected_client_state,
        }
    }

    /// Handles one envelope to completion. Infallible by contract.
    pub async fn dispatch(&self, envelope: NotificationEnvelope) {
        let Some(tag) = envelope
            .event_type
            .as_deref()
            .filter(|tag| !tag.is_empty())
        else {
            warn!("Notification without a type, ignoring");
            metrics::observe_notification_dropped("empty_type");
            return;
        };

        let kind = NotificationKind::from_type_tag(tag);
        metrics::observe_notification_received(kind.as_str());

        if kind == NotificationKind::Unknown {
            debug!("Unrecognized notification type {}, ignoring", tag);
            return;
        }

        let notification: ChangeNotification = match envelope.data {
            Some(data) => match serde_json::from_value(data) {
                Ok(notification) => notification,
                Err(e) => {
                    warn!("Notification {} carried undecodable data: {}", tag, e);
                    metrics::observe_notification_dropped("malformed_data");
                    return;
                }
            },
            None => {
                warn!("Notification {} carried no data, ignoring", tag);
                metrics::observe_notification_dropped("missing_data");
                return;
            }
        };

        if let Some(state) = &notification.client_state {
            if state != &self.expected_client_state {
                warn!("Notification {} failed the client-state check, ignoring", tag);
                metrics::observe_notification_dropped("client_state_mismatch");
                return;
            }
        }

        let result = match kind {
            NotificationKind::UserUpdated => self.handle_user_update(&notification).await,
            NotificationKind::GroupUpdated => self.handle_group_update(&notification).await,
            NotificationKind::UserDeleted => self.handle_user_delete(&notification),
            NotificationKind::SubscriptionReauthorizationRequired => {
                self.handle_reauthorization(&notification).await
            }
            NotificationKind::Unknown => unreachable!("unknown kinds return above"),
        };

        if let Err(e) = result {
            error!("Handler for {} failed: {}", tag, e);
            metrics::observe_notification_dropped("handler_error");
        }
    }

    async fn handle_user_update(&self, notification: &ChangeNotification) -> Result<(), AppError> {
        let resource = Self::require_resource(notification)?;

        match self.client.get_object(resource).await {
            Ok(user) => {
                info!(
                    "User {} updated ({})",
                    resource,
                    user.get("displayName")
                        .and_then(|v| v.as_str())
                        .unwrap_or("unnamed")
                );
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                info!("User {} no longer resolvable, inferring soft-delete", resource);
                Ok(())
            }
            Err(e) => Err(AppError::Graph(e)),
        }
    }

    async fn handle_group_update(&self, notification: &ChangeNotification) -> Result<(), AppError> {
        let resource = Self::require_resource(notification)?;
        self.diff_engine
            .handle_group_update(resource)
            .await
            .map(|_| ())
            .map_err(AppError::Graph)
    }

    fn handle_user_delete(&self, notification: &ChangeNotification) -> Result<(), AppError> {
        let resource = Self::require_resource(notification)?;
        info!("User {} deleted", resource);
        Ok(())
    }

    async fn handle_reauthorization(
        &self,
        notification: &ChangeNotification,
    ) -> Result<(), AppError> {
        let subscription_id = notification
            .subscription_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                AppError::Validation(
                    "reauthorization notification without a subscription id".to_string(),
                )
            })?;

        self.subscription_manager.renew(subscription_id).await
    }

    fn require_resource(notification: &ChangeNotification) -> Result<&str, AppError> {
        notification
            .resource
            .as_deref()
            .filter(|resource| !resource.is_empty())
            .ok_or_else(|| AppError::Validation("notification without a resource".to_string()))
    }
}
