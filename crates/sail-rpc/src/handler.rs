//! JSON-RPC request handlers.

use crate::server::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use sail_core::{AppRef, ObjectKind, SailApi, SailError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error};

/// JSON-RPC 2.0 request structure.
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 error structure.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn error(id: Option<Value>, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(JsonRpcError {
                code,
                message,
                data: None,
            }),
            id,
        }
    }
}

/// Health check endpoint.
pub async fn handle_health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

/// Main JSON-RPC handler.
pub async fn handle_rpc(
    State(state): State<Arc<AppState>>,
    Json(request): Json<JsonRpcRequest>,
) -> impl IntoResponse {
    let method = &request.method;
    let params = request.params.unwrap_or(Value::Object(Default::default()));
    let id = request.id.clone();

    debug!("RPC call: {}({:?})", method, params);

    if method == "health_check" {
        return (
            StatusCode::OK,
            Json(JsonRpcResponse::success(id, json!({"status": "ok"}))),
        );
    }

    match dispatch_method(&state.api, method, &params).await {
        Ok(value) => (StatusCode::OK, Json(JsonRpcResponse::success(id, value))),
        Err(e) => {
            error!("RPC error for {}: {}", method, e);
            let code = e.to_rpc_error_code();
            (
                StatusCode::OK,
                Json(JsonRpcResponse::error(id, code, e.to_string())),
            )
        }
    }
}

// ============================================================================
// Helper macros for extracting parameters
// ============================================================================

/// Extract a string parameter, supporting both snake_case and camelCase.
macro_rules! get_str_param {
    ($params:expr, $snake:literal, $camel:literal) => {
        $params
            .get($snake)
            .or_else(|| $params.get($camel))
            .and_then(|v| v.as_str())
    };
    ($params:expr, $name:literal) => {
        $params.get($name).and_then(|v| v.as_str())
    };
}

/// Extract a required string parameter or return an error.
macro_rules! require_str_param {
    ($params:expr, $($names:literal),+) => {
        match get_str_param!($params, $($names),+) {
            Some(s) => s.to_string(),
            None => {
                return Err(SailError::InvalidParams {
                    message: format!("Missing required parameter: {}", ($($names,)+).0),
                });
            }
        }
    };
}

/// Extract an optional bool parameter, supporting both snake_case and camelCase.
macro_rules! get_bool_param {
    ($params:expr, $snake:literal, $camel:literal) => {
        $params
            .get($snake)
            .or_else(|| $params.get($camel))
            .and_then(|v| v.as_bool())
    };
}

/// Extract an optional u64 parameter.
macro_rules! get_u64_param {
    ($params:expr, $name:literal) => {
        $params.get($name).and_then(|v| v.as_u64())
    };
}

// ============================================================================
// Method dispatcher
// ============================================================================

/// Dispatch a method call to the appropriate API handler.
async fn dispatch_method(api: &SailApi, method: &str, params: &Value) -> sail_core::Result<Value> {
    match method {
        // ====================================================================
        // Loading & application management
        // ====================================================================
        "load_application" => {
            let label = require_str_param!(params, "label");
            let force_refresh =
                get_bool_param!(params, "force_refresh", "forceRefresh").unwrap_or(false);

            let app_ref = if let Some(path) = get_str_param!(params, "zip_path", "zipPath") {
                AppRef::local(path)
            } else if let Some(uuid) = get_str_param!(params, "app_uuid", "appUuid") {
                AppRef::remote(uuid)
            } else if let Some(uuid) = api.default_app_uuid() {
                AppRef::remote(uuid)
            } else {
                return Err(SailError::InvalidParams {
                    message: "Provide zip_path or app_uuid (no default application uuid \
                              is configured)"
                        .to_string(),
                });
            };

            let report = api.load_application(&label, &app_ref, force_refresh).await?;
            Ok(serde_json::to_value(report)?)
        }

        "list_applications" => {
            let labels = api.list_applications().await;
            Ok(json!({ "applications": labels }))
        }

        // ====================================================================
        // Object queries
        // ====================================================================
        "list_objects" => {
            let label = require_str_param!(params, "label");
            let kind = match get_str_param!(params, "kind") {
                Some(s) => Some(ObjectKind::from_str(s).ok_or_else(|| {
                    SailError::InvalidParams {
                        message: format!("Unknown object kind: {}", s),
                    }
                })?),
                None => None,
            };
            let pattern = get_str_param!(params, "name_pattern", "namePattern");

            let objects = api.list_objects(&label, kind, pattern).await?;
            Ok(json!({ "objects": objects }))
        }

        "get_sail_source" => {
            let label = require_str_param!(params, "label");
            let object_id = require_str_param!(params, "id");
            let record = api.get_source(&label, &object_id).await?;
            Ok(serde_json::to_value(record)?)
        }

        "search_objects" => {
            let label = require_str_param!(params, "label");
            let query = require_str_param!(params, "query");
            let hits = api.search(&label, &query).await?;
            Ok(json!({ "hits": hits }))
        }

        "find_component_users" => {
            let label = require_str_param!(params, "label");
            let component = require_str_param!(params, "component");
            let users = api.find_users_of_component(&label, &component).await?;
            Ok(json!({ "component": component, "users": users }))
        }

        "find_references" => {
            let label = require_str_param!(params, "label");
            let object_id = require_str_param!(params, "id");
            let depth = get_u64_param!(params, "depth").map(|d| d as u32);
            let references = api.find_references(&label, &object_id, depth).await?;
            Ok(json!({ "references": references }))
        }

        // ====================================================================
        // Accessibility checklist
        // ====================================================================
        "get_a11y_checklist" => {
            let checklist = api.a11y_checklist().await;
            Ok(json!({ "checklist": checklist }))
        }

        _ => Err(SailError::InvalidParams {
            message: format!("Unknown method: {}", method),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn api() -> (TempDir, SailApi) {
        let dir = TempDir::new().unwrap();
        let api = SailApi::with_connection(dir.path(), None).unwrap();
        (dir, api)
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let (_dir, api) = api();
        let err = dispatch_method(&api, "no_such_method", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, SailError::InvalidParams { .. }));
    }

    #[tokio::test]
    async fn test_missing_required_param() {
        let (_dir, api) = api();
        let err = dispatch_method(&api, "list_objects", &json!({}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("label"));
    }

    #[tokio::test]
    async fn test_load_without_source_or_default() {
        let (_dir, api) = api();
        let err = dispatch_method(&api, "load_application", &json!({"label": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, SailError::InvalidParams { .. }));
    }

    #[tokio::test]
    async fn test_bad_kind_rejected() {
        let (_dir, api) = api();
        let err = dispatch_method(
            &api,
            "list_objects",
            &json!({"label": "x", "kind": "gadget"}),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SailError::InvalidParams { .. }));
    }

    #[tokio::test]
    async fn test_unknown_label_error_code() {
        let (_dir, api) = api();
        let err = dispatch_method(&api, "search_objects", &json!({"label": "x", "query": "q"}))
            .await
            .unwrap_err();
        assert_eq!(err.to_rpc_error_code(), -32003);
    }
}
