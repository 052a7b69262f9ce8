use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounterVec, Opts, TextEncoder};

static NOTIFICATIONS_RECEIVED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "directory_events_notifications_received_total",
            "Notifications received by the dispatcher, by kind",
        ),
        &["kind"],
    )
    .expect("failed to create directory_events_notifications_received_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register directory_events_notifications_received_total");
    counter
});

static NOTIFICATIONS_DROPPED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "directory_events_notifications_dropped_total",
            "Notifications whose handling was dropped after acknowledgement, by reason",
        ),
        &["reason"],
    )
    .expect("failed to create directory_events_notifications_dropped_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register directory_events_notifications_dropped_total");
    counter
});

pub fn observe_notification_received(kind: &str) {
    NOTIFICATIONS_RECEIVED_TOTAL.with_label_values(&[kind]).inc();
}

/// The transport always sees 202; dropped handling is only visible here and
/// in the logs.
pub fn observe_notification_dropped(reason: &str) {
    NOTIFICATIONS_DROPPED_TOTAL.with_label_values(&[reason]).inc();
}

pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
