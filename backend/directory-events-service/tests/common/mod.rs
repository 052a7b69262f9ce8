#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use directory_events_service::config::{EventGridSettings, SubscriptionSettings};
use directory_events_service::models::NotificationEnvelope;
use directory_events_service::{MembershipDiffEngine, NotificationDispatcher, SubscriptionManager};
use graph_directory::{
    DirectoryClient, GraphError, GroupDeltaPage, Subscription, SubscriptionRequest, UserProfile,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const CLIENT_STATE: &str = "SecretClientState";

pub fn subscription_settings() -> SubscriptionSettings {
    SubscriptionSettings {
        client_state: CLIENT_STATE.to_string(),
        settle_interval_secs: 5,
    }
}

pub fn event_grid_settings() -> EventGridSettings {
    EventGridSettings {
        azure_subscription_id: "azure-sub".to_string(),
        resource_group: "rg".to_string(),
        partner_topic: "topic".to_string(),
        location: "westeurope".to_string(),
    }
}

pub fn subscription_manager(client: Arc<MockDirectoryClient>) -> Arc<SubscriptionManager> {
    Arc::new(SubscriptionManager::new(
        client,
        event_grid_settings(),
        &subscription_settings(),
    ))
}

pub fn diff_engine(client: Arc<MockDirectoryClient>) -> MembershipDiffEngine {
    MembershipDiffEngine::new(client, Duration::from_secs(5))
}

pub fn dispatcher(client: Arc<MockDirectoryClient>) -> Arc<NotificationDispatcher> {
    Arc::new(NotificationDispatcher::new(
        client.clone(),
        diff_engine(client.clone()),
        subscription_manager(client),
        CLIENT_STATE.to_string(),
    ))
}

pub fn envelope(event_type: &str, data: serde_json::Value) -> NotificationEnvelope {
    NotificationEnvelope {
        event_type: Some(event_type.to_string()),
        source: Some("/tenants/contoso".to_string()),
        data: Some(data),
    }
}

/// Recording mock for the remote directory service. Responses are seeded up
/// front; every call is appended to `calls` for assertions.
#[derive(Default)]
pub struct MockDirectoryClient {
    pub calls: Mutex<Vec<String>>,
    objects: Mutex<HashMap<String, serde_json::Value>>,
    delta_pages: Mutex<Vec<GroupDeltaPage>>,
    users: Mutex<HashMap<String, UserProfile>>,
    subscriptions: Mutex<Vec<Subscription>>,
    create_returns_none: bool,
    delete_not_found: bool,
}

impl MockDirectoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(self, relative_url: &str, value: serde_json::Value) -> Self {
        self.objects
            .lock()
            .unwrap()
            .insert(relative_url.to_string(), value);
        self
    }

    /// Seeds delta pages served in order; the JSON exercises the same
    /// deserialization path as production responses.
    pub fn with_delta_pages(self, pages: Vec<serde_json::Value>) -> Self {
        let parsed = pages
            .into_iter()
            .map(|page| serde_json::from_value(page).expect("invalid delta page fixture"))
            .collect();
        *self.delta_pages.lock().unwrap() = parsed;
        self
    }

    pub fn with_user(self, id: &str, user_principal_name: &str) -> Self {
        self.users.lock().unwrap().insert(
            id.to_string(),
            UserProfile {
                id: id.to_string(),
                display_name: Some(format!("User {id}")),
                user_principal_name: Some(user_principal_name.to_string()),
                created_date_time: Some(Utc::now()),
            },
        );
        self
    }

    pub fn with_subscription(self, id: &str) -> Self {
        self.subscriptions.lock().unwrap().push(Subscription {
            id: id.to_string(),
            resource: Some("groups/existing/members".to_string()),
            change_type: Some("updated,deleted".to_string()),
            notification_url: None,
            lifecycle_notification_url: None,
            client_state: None,
            expiration_date_time: Some(Utc::now()),
        });
        self
    }

    pub fn with_create_returning_none(mut self) -> Self {
        self.create_returns_none = true;
        self
    }

    pub fn with_delete_not_found(mut self) -> Self {
        self.delete_not_found = true;
        self
    }

    pub fn recorded_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl DirectoryClient for MockDirectoryClient {
    async fn get_object(&self, relative_url: &str) -> Result<serde_json::Value, GraphError> {
        self.record(format!("get_object {relative_url}"));
        self.objects
            .lock()
            .unwrap()
            .get(relative_url)
            .cloned()
            .ok_or_else(|| GraphError::NotFound(format!("{relative_url} does not exist")))
    }

    async fn delta_page(&self, url: &str) -> Result<GroupDeltaPage, GraphError> {
        self.record(format!("delta_page {url}"));
        let mut pages = self.delta_pages.lock().unwrap();
        if pages.is_empty() {
            return Ok(serde_json::from_value(serde_json::json!({ "value": [] })).unwrap());
        }
        Ok(pages.remove(0))
    }

    async fn get_user(&self, id: &str, _select: &[&str]) -> Result<UserProfile, GraphError> {
        self.record(format!("get_user {id}"));
        self.users
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| GraphError::NotFound(format!("user {id} does not exist")))
    }

    async fn list_subscriptions(&self) -> Result<Vec<Subscription>, GraphError> {
        self.record("list_subscriptions".to_string());
        Ok(self.subscriptions.lock().unwrap().clone())
    }

    async fn create_subscription(
        &self,
        request: &SubscriptionRequest,
    ) -> Result<Option<Subscription>, GraphError> {
        self.record(format!("create_subscription {}", request.resource));
        if self.create_returns_none {
            return Ok(None);
        }
        Ok(Some(Subscription {
            id: uuid::Uuid::new_v4().to_string(),
            resource: Some(request.resource.clone()),
            change_type: Some(request.change_type.clone()),
            notification_url: Some(request.notification_url.clone()),
            lifecycle_notification_url: Some(request.lifecycle_notification_url.clone()),
            client_state: Some(request.client_state.clone()),
            expiration_date_time: Some(request.expiration_date_time),
        }))
    }

    async fn update_subscription(
        &self,
        id: &str,
        _expiration: DateTime<Utc>,
    ) -> Result<(), GraphError> {
        self.record(format!("update_subscription {id}"));
        Ok(())
    }

    async fn delete_subscription(&self, id: &str) -> Result<(), GraphError> {
        self.record(format!("delete_subscription {id}"));
        if self.delete_not_found {
            return Err(GraphError::NotFound(format!("subscription {id}")));
        }
        Ok(())
    }
}
