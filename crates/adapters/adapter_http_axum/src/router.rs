//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use aroma_app::ports::{AudioEngine, OutputDriver};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Nests the JSON API under `/api`, serves `aroma.html` at `/` and the rest
/// of the static directory under `/static`. Any origin may call the API.
/// Includes a [`TraceLayer`] that logs each HTTP request/response at the
/// `DEBUG` level using the `tracing` ecosystem.
pub fn build<D, E>(state: AppState<D, E>) -> Router
where
    D: OutputDriver + 'static,
    E: AudioEngine + 'static,
{
    let index = ServeFile::new(state.static_dir.join("aroma.html"));
    let assets = ServeDir::new(&state.static_dir);
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .route_service("/", index)
        .nest_service("/static", assets)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::CommandResponse;
    use crate::api::fans::FanStatusBody;
    use crate::api::music::MusicStatusBody;
    use crate::test_support::test_state;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use http_body_util::BodyExt;
    use std::collections::BTreeMap;
    use tower::ServiceExt;

    fn app() -> Router {
        build(test_state("static"))
    }

    async fn send(app: Router, method: &str, uri: &str) -> Response {
        app.oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
    }

    async fn json<T: serde::de::DeserializeOwned>(response: Response) -> T {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn detail(response: Response) -> String {
        let body: serde_json::Value = json(response).await;
        body["detail"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn should_return_ok_when_health_check_called() {
        let response = send(app(), "GET", "/health").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn should_acknowledge_fan_activation() {
        let response = send(app(), "POST", "/api/fan/2/on?duration_seconds=30").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: CommandResponse = json(response).await;
        assert_eq!(
            body,
            CommandResponse {
                success: true,
                message: "Fan 2 turned on for 30 seconds".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn should_reject_unknown_fan_with_detail() {
        let response = send(app(), "POST", "/api/fan/4/on?duration_seconds=30").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(detail(response).await, "Invalid fan_id: 4. Must be 0-3");
    }

    #[tokio::test]
    async fn should_reject_non_positive_duration() {
        let response = send(app(), "POST", "/api/fan/0/on?duration_seconds=0").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(detail(response).await, "Duration must be positive, got: 0");
    }

    #[tokio::test]
    async fn should_acknowledge_fan_deactivation() {
        let response = send(app(), "POST", "/api/fan/3/off").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: CommandResponse = json(response).await;
        assert_eq!(body.message, "Fan 3 turned off");
    }

    #[tokio::test]
    async fn should_report_every_fan_idle_initially() {
        let response = send(app(), "GET", "/api/fan/status").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: BTreeMap<String, FanStatusBody> = json(response).await;
        let keys: Vec<&str> = body.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["fan_0", "fan_1", "fan_2", "fan_3"]);
        assert!(body.values().all(|fan| *fan
            == FanStatusBody {
                remaining_seconds: 0,
                total_seconds: 0
            }));
    }

    #[tokio::test]
    async fn should_accept_known_track() {
        let response = send(app(), "POST", "/api/music/1/start").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: CommandResponse = json(response).await;
        assert_eq!(body.message, "Playing track 1");
    }

    #[tokio::test]
    async fn should_reject_unknown_track_with_detail() {
        let response = send(app(), "POST", "/api/music/bad-id/start").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(detail(response).await.starts_with("Invalid track_id: bad-id."));
    }

    #[tokio::test]
    async fn should_acknowledge_music_stop() {
        let response = send(app(), "POST", "/api/music/stop").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: CommandResponse = json(response).await;
        assert_eq!(body.message, "Music stopped");
    }

    #[tokio::test]
    async fn should_report_nothing_playing_initially() {
        let response = send(app(), "GET", "/api/music/status").await;
        let body: serde_json::Value = json(response).await;
        assert_eq!(body, serde_json::json!({"currently_playing": null}));

        let typed: MusicStatusBody = serde_json::from_value(body).unwrap();
        assert_eq!(typed.currently_playing, None);
    }

    #[tokio::test]
    async fn should_allow_any_origin() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/api/music/status")
                    .header(header::ORIGIN, "http://example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }

    #[tokio::test]
    async fn should_serve_index_page_from_static_dir() {
        let dir = std::env::temp_dir().join(format!("aroma-static-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("aroma.html"), "<h1>A-Roma</h1>").unwrap();

        let response = send(build(test_state(&dir)), "GET", "/").await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"<h1>A-Roma</h1>");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn should_stream_published_snapshots() {
        use aroma_app::ports::EventPublisher;
        use aroma_domain::fan::FanStatus;
        use aroma_domain::id::FanId;

        let state = test_state("static");
        let dispatcher = state.dispatcher.clone();
        dispatcher.start();

        let response = send(build(state), "GET", "/api/events/stream").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/event-stream"
        );

        dispatcher.publish(
            FanStatus {
                fan_id: FanId::new(1).unwrap(),
                remaining_seconds: 9,
                total_seconds: 10,
            }
            .into(),
        );

        let mut body = response.into_body();
        let frame = body.frame().await.unwrap().unwrap();
        let text = String::from_utf8(frame.into_data().unwrap().to_vec()).unwrap();
        assert_eq!(
            text,
            "data: {\"type\":\"fan_status\",\"data\":{\"fan_id\":1,\"remaining_seconds\":9,\"total_seconds\":10}}\n\n"
        );

        drop(body);
        dispatcher.stop().await;
        assert_eq!(dispatcher.subscriber_count(), 0);
    }
}
