use actix_web::{web, HttpResponse, Result as ActixResult};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;

use crate::error::AppError;
use crate::handlers::ApiResponse;
use crate::services::SubscriptionManager;

#[derive(Debug, Serialize)]
pub struct CreateSubscriptionResponse {
    pub message: String,
    #[serde(rename = "subscriptionId")]
    pub subscription_id: String,
    pub resource: Option<String>,
}

/// Operator-triggered subscription creation.
///
/// GET /notifications/create/{id}
pub async fn create_subscription(
    manager: web::Data<Arc<SubscriptionManager>>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let resource_id = path.into_inner();

    match manager.create(&resource_id).await {
        Ok(subscription) => Ok(HttpResponse::Ok().json(ApiResponse::ok(
            CreateSubscriptionResponse {
                message: format!("Subscribed to membership changes of group {resource_id}"),
                subscription_id: subscription.id,
                resource: subscription.resource,
            },
        ))),
        Err(e) => Ok(error_response(e, "create")),
    }
}

/// Operator-triggered subscription deletion.
///
/// GET /notifications/delete/{id}
pub async fn delete_subscription(
    manager: web::Data<Arc<SubscriptionManager>>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let subscription_id = path.into_inner();

    match manager.delete(&subscription_id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::ok(format!(
            "Subscription {subscription_id} deleted"
        )))),
        Err(e) => Ok(error_response(e, "delete")),
    }
}

fn error_response(err: AppError, operation: &str) -> HttpResponse {
    let message = err.to_string();
    match err.status_code() {
        400 => HttpResponse::BadRequest().json(ApiResponse::<String>::err(message)),
        404 => HttpResponse::NotFound().json(ApiResponse::<String>::err(message)),
        _ => {
            error!("Subscription {} failed: {}", operation, message);
            HttpResponse::InternalServerError().json(ApiResponse::<String>::err(message))
        }
    }
}

/// Register routes
pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/notifications/create/{id}",
        web::get().to(create_subscription),
    )
    .route(
        "/notifications/delete/{id}",
        web::get().to(delete_subscription),
    );
}
