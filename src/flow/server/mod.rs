// SPDX-License-Identifier: MIT

//! HTTP front end over the in-memory workflow store

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

mod error;
mod handlers;
mod store;

pub use error::{ApiError, ApiResult};
pub use store::WorkflowStore;

use super::config::ServerConfig;
use super::error::FlowError;

/// Build the API router; `static_dir`, when set, serves everything else
pub fn router(store: WorkflowStore, config: &ServerConfig) -> Router {
    let api = Router::new()
        .route("/api/health", get(handlers::health_check))
        .route(
            "/api/workflows",
            get(handlers::list_workflows).post(handlers::create_workflow),
        )
        .route(
            "/api/workflows/{name}",
            get(handlers::get_workflow).delete(handlers::delete_workflow),
        )
        .route("/api/workflows/{name}/nodes", post(handlers::add_node))
        .route("/api/workflows/{name}/connect", post(handlers::connect_nodes))
        .route("/api/workflows/{name}/run", post(handlers::run_workflow))
        .route("/api/workflows/{name}/run/stream", post(handlers::stream_run))
        .with_state(store);

    let app = match &config.static_dir {
        Some(dir) => {
            log::info!("Serving static files from {}", dir.display());
            api.fallback_service(ServeDir::new(dir))
        }
        None => api,
    };

    app.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO))
            .on_response(DefaultOnResponse::new().level(tracing::Level::INFO)),
    )
    .layer(CorsLayer::permissive())
}

pub async fn serve(config: ServerConfig) -> Result<(), FlowError> {
    let addr = config.addr()?;
    let app = router(WorkflowStore::new(), &config);

    log::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn call(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(body) => {
                request = request.header("content-type", "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn app() -> Router {
        router(WorkflowStore::new(), &ServerConfig::default())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = call(&app(), "GET", "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_build_and_run_over_http() {
        let app = app();
        let (status, _) =
            call(&app, "POST", "/api/workflows", Some(json!({"name": "greet"}))).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, node) = call(
            &app,
            "POST",
            "/api/workflows/greet/nodes",
            Some(json!({
                "node_name": "start",
                "node_type": "set",
                "config": {"values": {"msg": "hi"}}
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(node["kind"], "set");

        call(
            &app,
            "POST",
            "/api/workflows/greet/nodes",
            Some(json!({"node_name": "upper", "node_type": "upper"})),
        )
        .await;
        let (status, _) = call(
            &app,
            "POST",
            "/api/workflows/greet/connect",
            Some(json!({"source_node": "start", "target_node": "upper"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, execution) = call(&app, "POST", "/api/workflows/greet/run", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(execution["status"], "completed");
        assert_eq!(execution["order"], json!(["start", "upper"]));
        assert_eq!(execution["context"], json!({"msg": "hi", "result": "HI"}));

        let (_, detail) = call(&app, "GET", "/api/workflows/greet", None).await;
        assert_eq!(detail["execution_order"], json!(["start", "upper"]));
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let app = app();
        let (status, _) = call(&app, "GET", "/api/workflows/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        call(&app, "POST", "/api/workflows", Some(json!({"name": "w"}))).await;
        let (status, _) = call(&app, "POST", "/api/workflows", Some(json!({"name": "w"}))).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = call(
            &app,
            "POST",
            "/api/workflows/w/nodes",
            Some(json!({"node_name": "p", "node_type": "python"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["kind"], "unknown_kind");

        for id in ["a", "b"] {
            call(
                &app,
                "POST",
                "/api/workflows/w/nodes",
                Some(json!({"node_name": id, "node_type": "passthrough"})),
            )
            .await;
        }
        let (status, _) = call(
            &app,
            "POST",
            "/api/workflows/w/nodes",
            Some(json!({"node_name": "a", "node_type": "start"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = call(
            &app,
            "POST",
            "/api/workflows/w/connect",
            Some(json!({"source_node": "a", "target_node": "ghost"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["kind"], "unknown_node");

        call(
            &app,
            "POST",
            "/api/workflows/w/connect",
            Some(json!({"source_node": "a", "target_node": "b"})),
        )
        .await;
        let (status, body) = call(
            &app,
            "POST",
            "/api/workflows/w/connect",
            Some(json!({"source_node": "b", "target_node": "a"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["kind"], "cycle_detected");
    }

    #[tokio::test]
    async fn test_failed_run_returns_partial_execution() {
        let app = app();
        call(&app, "POST", "/api/workflows", Some(json!({"name": "w"}))).await;
        call(
            &app,
            "POST",
            "/api/workflows/w/nodes",
            Some(json!({
                "node_name": "t",
                "node_type": "template",
                "config": {"template": "Hi {name}"}
            })),
        )
        .await;

        let (status, body) = call(
            &app,
            "POST",
            "/api/workflows/w/run",
            Some(json!({"input_data": {"other": 1}})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["kind"], "node_failure");
        assert_eq!(body["error"]["node"], "t");
        assert_eq!(body["execution"]["status"], "failed");
        assert_eq!(body["execution"]["context"], json!({"other": 1}));
    }

    #[tokio::test]
    async fn test_bad_input_data() {
        let app = app();
        call(&app, "POST", "/api/workflows", Some(json!({"name": "w"}))).await;
        let (status, _) = call(
            &app,
            "POST",
            "/api/workflows/w/run",
            Some(json!({"input_data": [1]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_workflow() {
        let app = app();
        call(&app, "POST", "/api/workflows", Some(json!({"name": "w"}))).await;
        let (status, _) = call(&app, "DELETE", "/api/workflows/w", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&app, "DELETE", "/api/workflows/w", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, list) = call(&app, "GET", "/api/workflows", None).await;
        assert_eq!(list, json!([]));
    }

    #[tokio::test]
    async fn test_stream_run_emits_events() {
        let app = app();
        call(&app, "POST", "/api/workflows", Some(json!({"name": "w"}))).await;
        call(
            &app,
            "POST",
            "/api/workflows/w/nodes",
            Some(json!({
                "node_name": "s",
                "node_type": "set",
                "config": {"values": {"msg": "hi"}}
            })),
        )
        .await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/workflows/w/run/stream")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        let events: Vec<Value> = text
            .lines()
            .filter_map(|line| line.strip_prefix("data: "))
            .map(|data| serde_json::from_str(data).unwrap())
            .collect();
        let kinds: Vec<&str> = events.iter().map(|e| e["type"].as_str().unwrap()).collect();
        assert_eq!(kinds, ["started", "node_started", "node_completed", "completed"]);
    }
}
