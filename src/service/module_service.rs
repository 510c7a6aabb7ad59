//! Built-in service every module exposes.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use uuid::Uuid;

use crate::lifecycle::{ModuleHandle, ModuleState};
use crate::service::ServiceHandler;

pub const MODULE_SERVICE_PROTOCOL: &str = "module.ModuleService";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub name: String,
    pub component: String,
    pub instance: Uuid,
    pub status: ModuleState,
}

/// Reports the identity and state of the module it belongs to.
pub struct ModuleService {
    module: Arc<ModuleHandle>,
}

impl ModuleService {
    pub fn new(module: Arc<ModuleHandle>) -> Self {
        Self { module }
    }

    pub fn health(&self) -> HealthResponse {
        HealthResponse {
            name: self.module.name().to_string(),
            component: self.module.component().to_string(),
            instance: self.module.instance_id(),
            status: self.module.state(),
        }
    }
}

impl ServiceHandler for ModuleService {
    fn router(self: Arc<Self>) -> Router {
        Router::new().route("/Health", get(health)).with_state(self)
    }
}

async fn health(State(service): State<Arc<ModuleService>>) -> Json<HealthResponse> {
    Json(service.health())
}
