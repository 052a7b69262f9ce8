use actix_web::{web, HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::warn;

use crate::models::NotificationEnvelope;
use crate::services::NotificationDispatcher;

/// Validation handshake (abuse protection): echo the requested origin and
/// rate back as allow-listing headers. No body is required or returned.
///
/// OPTIONS /notifications
pub async fn validate(req: HttpRequest) -> ActixResult<HttpResponse> {
    let mut response = HttpResponse::Ok();

    if let Some(origin) = req.headers().get("WebHook-Request-Origin") {
        response.insert_header(("WebHook-Allowed-Origin", origin.clone()));
    }
    if let Some(rate) = req.headers().get("WebHook-Request-Rate") {
        response.insert_header(("WebHook-Allowed-Rate", rate.clone()));
    }

    Ok(response.finish())
}

/// Receive one or more notification envelopes.
///
/// Always answers 202: the transport must never be told to retry, so even
/// an unreadable body is acknowledged and only logged. Each envelope is
/// handled as its own task; nothing here waits for handlers to finish.
///
/// POST /notifications
pub async fn receive(
    dispatcher: web::Data<Arc<NotificationDispatcher>>,
    body: web::Bytes,
) -> ActixResult<HttpResponse> {
    match serde_json::from_slice::<serde_json::Value>(&body) {
        Ok(serde_json::Value::Array(items)) => {
            for item in items {
                spawn_dispatch(&dispatcher, item);
            }
        }
        Ok(item) => {
            spawn_dispatch(&dispatcher, item);
        }
        Err(e) => {
            warn!("Unreadable notification body: {}", e);
        }
    }

    Ok(HttpResponse::Accepted().finish())
}

fn spawn_dispatch(dispatcher: &web::Data<Arc<NotificationDispatcher>>, item: serde_json::Value) {
    match serde_json::from_value::<NotificationEnvelope>(item) {
        Ok(envelope) => {
            let dispatcher = Arc::clone(dispatcher.get_ref());
            tokio::spawn(async move {
                dispatcher.dispatch(envelope).await;
            });
        }
        Err(e) => {
            warn!("Undecodable notification envelope: {}", e);
        }
    }
}

/// Register routes
pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/notifications")
            .route(web::method(actix_web::http::Method::OPTIONS).to(validate))
            .route(web::post().to(receive)),
    );
}
