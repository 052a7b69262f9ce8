pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod services;

pub use config::Settings;
pub use error::AppError;
pub use services::dispatcher::NotificationDispatcher;
pub use services::membership_diff::MembershipDiffEngine;
pub use services::subscription_manager::SubscriptionManager;
