use std::{convert::Infallible, net::SocketAddr, sync::Arc};

use axum::{
    Router,
    body::Body,
    extract::{Path, RawQuery, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use futures::StreamExt;
use tower_http::cors::{Any, CorsLayer};

use crate::client::ApiClient;
use crate::controller::PageController;
use crate::error::FetchError;

#[derive(Clone)]
pub struct AppState {
    pub client: ApiClient,
    pub controller: Arc<PageController>,
}

impl AppState {
    pub fn new(client: ApiClient, top_n: usize) -> Self {
        AppState {
            controller: Arc::new(PageController::new(client.clone(), top_n)),
            client,
        }
    }
}

fn bad_gateway<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    (StatusCode::BAD_GATEWAY, e.to_string())
}

fn forward_error(e: FetchError) -> (StatusCode, String) {
    match e {
        FetchError::InvalidPath(_) => (StatusCode::BAD_REQUEST, e.to_string()),
        e => bad_gateway(e),
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/{*path}", get(proxy_api))
        .layer(cors)
        .with_state(state)
}

pub async fn serve(state: AppState, bind: SocketAddr) -> anyhow::Result<()> {
    let api = state.client.base().clone();
    let app = router(state);

    tracing::info!(%api, "proxying /api");
    tracing::info!("Listening on http://{}", bind);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// One render pass per page load, streamed: the empty layout goes out first
/// and each panel follows as soon as its own fetch is done.
async fn index(State(st): State<AppState>) -> Response {
    tracing::info!("rendering page");
    let html = st.controller.start().into_html().map(Ok::<_, Infallible>);
    (
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        Body::from_stream(html),
    )
        .into_response()
}

async fn health() -> &'static str {
    "server active"
}

async fn proxy_api(
    State(st): State<AppState>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Response, (StatusCode, String)> {
    let upstream = st
        .client
        .forward(&path, query.as_deref())
        .await
        .map_err(forward_error)?;

    let status = StatusCode::from_u16(upstream.status().as_u16()).map_err(bad_gateway)?;
    let content_type = upstream
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| HeaderValue::from_str(v).ok());
    let body = upstream.bytes().await.map_err(bad_gateway)?;

    let mut resp = (status, body).into_response();
    if let Some(ct) = content_type {
        resp.headers_mut().insert(header::CONTENT_TYPE, ct);
    }
    Ok(resp)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::{Json, http::Request};
    use http_body_util::BodyExt;
    use serde_json::json;
    use tower::ServiceExt;
    use url::Url;

    use super::*;

    fn resolver_api() -> Router {
        Router::new()
            .route(
                "/api/static",
                get(|| async {
                    Json(json!({"version": "2.89", "cacheSize": 150, "nameServers": ["1.1.1.1"]}))
                }),
            )
            .route(
                "/api/echo",
                get(|RawQuery(q): RawQuery| async move { q.unwrap_or_default() }),
            )
            .route("/secret", get(|| async { "outside-api" }))
    }

    async fn spawn_upstream(app: Router) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Url::parse(&format!("http://{addr}")).unwrap()
    }

    async fn upstream() -> Url {
        spawn_upstream(resolver_api()).await
    }

    async fn get_body(app: Router, uri: &str) -> (StatusCode, String) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn health_check() {
        let state = AppState::new(ApiClient::new(upstream().await), 50);
        let (status, body) = get_body(router(state), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "server active");
    }

    #[tokio::test]
    async fn proxies_api_requests() {
        let state = AppState::new(ApiClient::new(upstream().await), 50);

        let (status, body) = get_body(router(state.clone()), "/api/static").await;
        assert_eq!(status, StatusCode::OK);
        let info: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(info["version"], "2.89");

        let (status, body) = get_body(router(state.clone()), "/api/echo?since=5").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "since=5");

        let (status, _) = get_body(router(state), "/api/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn proxy_refuses_paths_outside_api() {
        let state = AppState::new(ApiClient::new(upstream().await), 50);

        for uri in ["/api/..%2Fsecret", "/api/x/..%2F..%2Fsecret", "/api/%2E%2E/secret"] {
            let (status, body) = get_body(router(state.clone()), uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert!(!body.contains("outside-api"), "{uri}");
        }
    }

    #[tokio::test]
    async fn index_renders_available_panels() {
        // No /api/dynamic upstream: the dynamic panel stays empty.
        let state = AppState::new(ApiClient::new(upstream().await), 50);
        let (status, body) = get_body(router(state), "/").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<p id=\"version\">Version: 2.89</p>"));
        assert!(body.contains("<ul id=\"nameservers\" class=\"stat-list\"><li>1.1.1.1</li></ul>"));
        assert!(body.contains("<span id=\"request-text\"></span>"));
        assert!(!body.contains("dynamic-panel-rendered"));
        assert!(!body.contains("data-chart=\"{"));
        assert!(body.ends_with("</html>"));
    }

    #[tokio::test]
    async fn index_streams_dynamic_panel_while_static_hangs() {
        let app = Router::new()
            .route(
                "/api/static",
                get(|| async {
                    std::future::pending::<()>().await;
                    "never"
                }),
            )
            .route(
                "/api/dynamic",
                get(|| async {
                    Json(json!({
                        "numHits": 40,
                        "numTotal": 100,
                        "topQueryDomains": {},
                        "topQueryTypes": {},
                        "topQuerySources": {},
                        "unknownDomains": {},
                        "lookupTimeline": []
                    }))
                }),
            );
        let state = AppState::new(ApiClient::new(spawn_upstream(app).await), 50);

        let resp = router(state)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let mut body = resp.into_body();
        let mut seen = String::new();
        tokio::time::timeout(Duration::from_secs(5), async {
            while !seen.contains("hits: 40 of 100") {
                let frame = body.frame().await.unwrap().unwrap();
                if let Ok(data) = frame.into_data() {
                    seen.push_str(std::str::from_utf8(&data).unwrap());
                }
            }
        })
        .await
        .expect("dynamic panel streamed while static fetch hangs");

        assert!(seen.contains("<p id=\"version\"></p>"));
        assert!(!seen.contains("static-panel-rendered"));
        assert!(!seen.ends_with("</html>"));
    }
}
