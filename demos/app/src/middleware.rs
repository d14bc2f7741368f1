//! Request logging middleware.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use logkit::{Logger, fields};

/// State of [`request_logging`]: the logger and the message of each record.
#[derive(Clone, Debug)]
pub struct RequestLog {
    pub logger: Logger,
    pub message: &'static str,
}

impl RequestLog {
    pub fn new(logger: Logger, message: &'static str) -> Self {
        Self { logger, message }
    }
}

fn client_ip(req: &Request<Body>) -> String {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
    {
        return forwarded.to_string();
    }
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_default()
}

/// Log one record per request after the handler has produced its response.
pub async fn request_logging(
    State(log): State<RequestLog>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let started = Instant::now();
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let client_ip = client_ip(&req);
    let user_agent = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let response = next.run(req).await;

    log.logger.info_with(
        log.message,
        fields! {
            "method" => method,
            "path" => path,
            "status" => response.status().as_u16(),
            "latency_ms" => started.elapsed().as_millis() as u64,
            "client_ip" => client_ip,
            "user_agent" => user_agent,
        },
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderName, HeaderValue, StatusCode};
    use axum::{Router, middleware, routing::get};
    use axum_test::TestServer;
    use logkit::{Engine, LogOption};
    use serde_json::Value;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_request_is_logged_with_status() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("access.log");
        let logger = Logger::new(&LogOption {
            engine: Engine::Native,
            output_paths: vec![path.display().to_string()],
            ..LogOption::default()
        })
        .unwrap();

        let app = Router::new()
            .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
            .layer(middleware::from_fn_with_state(
                RequestLog::new(logger, "HTTP request"),
                request_logging,
            ));
        let server = TestServer::new(app).unwrap();
        server
            .get("/missing")
            .add_header(
                HeaderName::from_static("x-forwarded-for"),
                HeaderValue::from_static("10.0.0.7, 10.0.0.1"),
            )
            .add_header(header::USER_AGENT, HeaderValue::from_static("curl/8.5.0"))
            .await
            .assert_status(StatusCode::NOT_FOUND);

        let content = std::fs::read_to_string(&path).unwrap();
        let line: Value = serde_json::from_str(content.lines().next().unwrap()).unwrap();
        assert_eq!(line["message"], "HTTP request");
        assert_eq!(line["method"], "GET");
        assert_eq!(line["path"], "/missing");
        assert_eq!(line["status"], 404);
        assert_eq!(line["client_ip"], "10.0.0.7");
        assert_eq!(line["user_agent"], "curl/8.5.0");
        assert!(line["latency_ms"].is_u64());
    }
}
