use chrono::{Duration as ChronoDuration, Utc};
use graph_directory::{DirectoryClient, GraphError, Subscription, SubscriptionRequest};
use std::sync::Arc;
use tracing::info;

use crate::config::{EventGridSettings, SubscriptionSettings};
use crate::error::AppError;

/// Changes requested from the directory service for watched group members.
const SUBSCRIPTION_CHANGE_TYPES: &str = "updated,deleted";

/// Short expiration for iterative testing; renewal arrives via
/// reauthorization notifications.
const SUBSCRIPTION_TTL_HOURS: i64 = 1;

/// Creates, renews, and deletes the Graph change-notification subscription.
///
/// Holds no subscription state of its own; every operation re-derives the
/// current state by querying the remote service.
pub struct SubscriptionManager {
    client: Arc<dyn DirectoryClient>,
    event_grid: EventGridSettings,
    client_state: String,
}

impl SubscriptionManager {
    pub fn new(
        client: Arc<dyn DirectoryClient>,
        event_grid: EventGridSettings,
        subscription: &SubscriptionSettings,
    ) -> Self {
        Self {
            client,
            event_grid,
            client_state: subscription.client_state.clone(),
        }
    }

    /// Creates a subscription for membership changes of `groups/{resource_id}`.
    ///
    /// Refuses when any subscription already exists, so at most one is active
    /// at a time; the remote service does not enforce this itself.
    pub async fn create(&self, resource_id: &str) -> Result<Subscription, AppError> {
        if resource_id.trim().is_empty() {
            return Err(AppError::Validation("resource id is required".to_string()));
        }

        let existing = self.client.list_subscriptions().await?;
        if let Some(subscription) = existing.first() {
            return Err(AppError::SubscriptionExists {
                existing_id: subscription.id.clone(),
            });
        }

        let notification_url = self.partner_topic_url();
        let request = SubscriptionRequest {
            resource: format!("groups/{resource_id}/members"),
            change_type: SUBSCRIPTION_CHANGE_TYPES.to_string(),
            notification_url: notification_url.clone(),
            lifecycle_notification_url: notification_url,
            client_state: self.client_state.clone(),
            expiration_date_time: Utc::now() + ChronoDuration::hours(SUBSCRIPTION_TTL_HOURS),
        };

        match self.client.create_subscription(&request).await? {
            Some(subscription) => {
                info!(
                    "Created subscription {} on {} expiring {}",
                    subscription.id,
                    subscription.resource.as_deref().unwrap_or(&request.resource),
                    subscription
                        .expiration_date_time
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_default()
                );
                Ok(subscription)
            }
            None => Err(AppError::CreationFailed),
        }
    }

    /// Extends the subscription's expiration by one TTL window. Single
    /// attempt; failures propagate to the dispatcher boundary.
    pub async fn renew(&self, subscription_id: &str) -> Result<(), AppError> {
        let expiration = Utc::now() + ChronoDuration::hours(SUBSCRIPTION_TTL_HOURS);
        self.client
            .update_subscription(subscription_id, expiration)
            .await?;
        info!(
            "Renewed subscription {} until {}",
            subscription_id,
            expiration.to_rfc3339()
        );
        Ok(())
    }

    /// Deletes a subscription. An id that no longer exists is benign.
    pub async fn delete(&self, subscription_id: &str) -> Result<(), AppError> {
        if subscription_id.trim().is_empty() {
            return Err(AppError::Validation(
                "subscription id is required".to_string(),
            ));
        }

        match self.client.delete_subscription(subscription_id).await {
            Ok(()) => {
                info!("Deleted subscription {}", subscription_id);
                Ok(())
            }
            Err(e) if e.is_not_found() => Err(AppError::NotFound(format!(
                "subscription {subscription_id} not found or already deleted"
            ))),
            Err(e) => Err(AppError::Graph(e)),
        }
    }

    /// Event Grid partner-topic coordinates packed into the notification URL
    /// the directory service delivers to.
    fn partner_topic_url(&self) -> String {
        format!(
            "EventGrid:?azuresubscriptionid={}&resourcegroup={}&partnertopic={}&location={}",
            self.event_grid.azure_subscription_id,
            self.event_grid.resource_group,
            self.event_grid.partner_topic,
            self.event_grid.location
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::DateTime;
    use graph_directory::{GroupDeltaPage, UserProfile};

    struct NoSubscriptionsClient;

    #[async_trait]
    impl DirectoryClient for NoSubscriptionsClient {
        async fn get_object(&self, _: &str) -> Result<serde_json::Value, GraphError> {
            unimplemented!()
        }
        async fn delta_page(&self, _: &str) -> Result<GroupDeltaPage, GraphError> {
            unimplemented!()
        }
        async fn get_user(&self, _: &str, _: &[&str]) -> Result<UserProfile, GraphError> {
            unimplemented!()
        }
        async fn list_subscriptions(&self) -> Result<Vec<Subscription>, GraphError> {
            Ok(Vec::new())
        }
        async fn create_subscription(
            &self,
            request: &SubscriptionRequest,
        ) -> Result<Option<Subscription>, GraphError> {
            Ok(Some(Subscription {
                id: "sub-new".to_string(),
                resource: Some(request.resource.clone()),
                change_type: Some(request.change_type.clone()),
                notification_url: Some(request.notification_url.clone()),
                lifecycle_notification_url: Some(request.lifecycle_notification_url.clone()),
                client_state: Some(request.client_state.clone()),
                expiration_date_time: Some(request.expiration_date_time),
            }))
        }
        async fn update_subscription(&self, _: &str, _: DateTime<Utc>) -> Result<(), GraphError> {
            Ok(())
        }
        async fn delete_subscription(&self, _: &str) -> Result<(), GraphError> {
            Ok(())
        }
    }

    fn manager(client: Arc<dyn DirectoryClient>) -> SubscriptionManager {
        SubscriptionManager::new(
            client,
            EventGridSettings {
                azure_subscription_id: "azure-sub".to_string(),
                resource_group: "rg".to_string(),
                partner_topic: "topic".to_string(),
                location: "westeurope".to_string(),
            },
            &SubscriptionSettings {
                client_state: "SecretClientState".to_string(),
                settle_interval_secs: 5,
            },
        )
    }

    #[tokio::test]
    async fn test_create_builds_partner_topic_url_and_member_resource() {
        let manager = manager(Arc::new(NoSubscriptionsClient));
        let subscription = manager.create("g2").await.unwrap();

        assert_eq!(subscription.resource.as_deref(), Some("groups/g2/members"));
        assert_eq!(
            subscription.notification_url.as_deref(),
            Some(
                "EventGrid:?azuresubscriptionid=azure-sub&resourcegroup=rg\
                 &partnertopic=topic&location=westeurope"
            )
        );
        assert_eq!(subscription.change_type.as_deref(), Some("updated,deleted"));
    }

    #[tokio::test]
    async fn test_create_rejects_blank_resource_id() {
        let manager = manager(Arc::new(NoSubscriptionsClient));
        let err = manager.create("  ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_delete_rejects_blank_subscription_id() {
        let manager = manager(Arc::new(NoSubscriptionsClient));
        let err = manager.delete("").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
