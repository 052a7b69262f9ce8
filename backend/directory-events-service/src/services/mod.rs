pub mod dispatcher;
pub mod membership_diff;
pub mod subscription_manager;

pub use dispatcher::NotificationDispatcher;
pub use membership_diff::{MembershipDiffEngine, MembershipReport};
pub use subscription_manager::SubscriptionManager;
