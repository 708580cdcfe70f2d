use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Initialize tracing; `pretty` gives human-readable output, anything else
/// structured JSON.
pub fn init_tracing(log_format: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "patient_sim_service=debug,tower_http=debug".into());

    match log_format {
        "pretty" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true),
                )
                .init();
        }
    }
}

/// Tags each request with a fresh correlation id, runs it inside an
/// `http_request` span and echoes the id back on the response.
pub async fn correlation_id_middleware(mut request: Request, next: Next) -> Response {
    let correlation_id = Uuid::new_v4().to_string();
    // a hyphenated uuid is always a valid header value
    let header = HeaderValue::from_str(&correlation_id).ok();

    if let Some(header) = &header {
        request
            .headers_mut()
            .insert(CORRELATION_ID_HEADER, header.clone());
    }

    let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
    let mut response = next.run(request).instrument(span).await;

    if let Some(header) = header {
        response.headers_mut().insert(CORRELATION_ID_HEADER, header);
    }
    response
}
