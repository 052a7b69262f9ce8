use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub app: AppSettings,
    pub graph: GraphSettings,
    pub event_grid: EventGridSettings,
    pub subscription: SubscriptionSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub env: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSettings {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

/// Partner-topic coordinates embedded into the subscription notification URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventGridSettings {
    pub azure_subscription_id: String,
    pub resource_group: String,
    pub partner_topic: String,
    pub location: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionSettings {
    /// Token echoed back in notifications for authenticity checks.
    pub client_state: String,
    /// Seconds to wait before the second delta read.
    pub settle_interval_secs: u64,
}

impl Settings {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Settings {
            app: AppSettings {
                env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                port: std::env::var("APP_PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()?,
            },
            graph: GraphSettings {
                tenant_id: std::env::var("GRAPH_TENANT_ID")?,
                client_id: std::env::var("GRAPH_CLIENT_ID")?,
                client_secret: std::env::var("GRAPH_CLIENT_SECRET")?,
            },
            event_grid: EventGridSettings {
                azure_subscription_id: std::env::var("AZURE_SUBSCRIPTION_ID")?,
                resource_group: std::env::var("AZURE_RESOURCE_GROUP")?,
                partner_topic: std::env::var("PARTNER_TOPIC_NAME")?,
                location: std::env::var("PARTNER_TOPIC_LOCATION")?,
            },
            subscription: SubscriptionSettings {
                client_state: std::env::var("NOTIFICATION_CLIENT_STATE")
                    .unwrap_or_else(|_| "SecretClientState".to_string()),
                settle_interval_secs: std::env::var("SETTLE_INTERVAL_SECS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()?,
            },
        })
    }
}
