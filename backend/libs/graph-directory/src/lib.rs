/// Graph Directory Shared Library
///
/// This library provides a Microsoft Graph client for directory data
/// (users, groups, service principals) used by the directory events service.
///
/// It handles:
/// - OAuth2 client-credentials token acquisition with caching
/// - Single-object lookup by id or relative URL
/// - Paged delta queries with nextLink/deltaLink cursors
/// - Subscription list/create/update/delete

pub mod client;
pub mod errors;
pub mod models;

pub use client::{DirectoryClient, GraphClient, GraphClientConfig};
pub use errors::GraphError;
pub use models::{
    DirectoryObject, GroupDeltaEntry, GroupDeltaPage, MemberEntry, ODataPage, RemovalMarker,
    Subscription, SubscriptionRequest, UserProfile,
};
