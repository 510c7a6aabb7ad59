use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::Span;

use crate::echo::EchoServiceOptions;
use crate::observability::ModuleLogger;
use crate::service::ServiceHandler;

pub const ECHO_PROTOCOL: &str = "echo.EchoService";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EchoRequest {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EchoResponse {
    pub text: String,
}

pub struct EchoService {
    module: String,
    component: String,
    span: Span,
}

impl EchoService {
    pub fn new(options: &EchoServiceOptions, logger: &ModuleLogger) -> Self {
        Self {
            module: options.module.clone(),
            component: options.component.clone(),
            span: logger.scope("echo"),
        }
    }

    pub fn echo(&self, request: EchoRequest) -> EchoResponse {
        tracing::debug!(
            parent: &self.span,
            module = %self.module,
            component = %self.component,
            bytes = request.text.len(),
            "Echo"
        );
        EchoResponse { text: request.text }
    }
}

impl ServiceHandler for EchoService {
    fn router(self: Arc<Self>) -> Router {
        Router::new().route("/Echo", post(echo)).with_state(self)
    }
}

async fn echo(State(service): State<Arc<EchoService>>, Json(request): Json<EchoRequest>) -> Json<EchoResponse> {
    Json(service.echo(request))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;
    use uuid::Uuid;

    fn service() -> Arc<EchoService> {
        let logger = ModuleLogger::new("echo", "echo", Uuid::new_v4());
        Arc::new(EchoService::new(
            &EchoServiceOptions {
                module: "echo".into(),
                component: "echo".into(),
            },
            &logger,
        ))
    }

    #[tokio::test]
    async fn echoes_text() {
        let response = service()
            .router()
            .oneshot(
                Request::post("/Echo")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"text":"hello"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let reply: EchoResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(reply.text, "hello");
    }

    #[tokio::test]
    async fn rejects_get() {
        let response = service()
            .router()
            .oneshot(Request::get("/Echo").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
