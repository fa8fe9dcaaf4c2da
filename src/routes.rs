//! HTTP surface: five routes under `/<pool>/`, each validating its own
//! parameter set before touching storage, and a uniform success/error
//! envelope that always echoes the caller's `request_id`.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, put},
    Json, Router,
};
use serde_json::{Map, Value as JsonValue};
use sqlx::PgPool;

use crate::content_hash::content_md5_base64;
use crate::csv_import::parse_csv;
use crate::error::VoucherError;
use crate::models::{AuditKey, ErrorBody, ExportRequest, ExportResponse};
use crate::params::{require_str, validate_params};
use crate::pool_name::PoolName;
use crate::routes::health::{health_live, health_ready};
use crate::services::{audit_query_service, count_service, export_service, import_service, issue_service};

pub mod health;

pub fn router(pool: PgPool) -> Router {
    Router::new()
        .route("/health/live", get(health_live))
        .route("/health/ready", get(health_ready))
        .route("/{pool}/issue/{operator}/{request_id}", put(issue))
        .route("/{pool}/import/{request_id}", put(import))
        .route("/{pool}/export/{request_id}", put(export))
        .route("/{pool}/audit_query", get(audit_query))
        .route("/{pool}/voucher_counts", get(voucher_counts))
        .with_state(pool)
}

/// Builds the uniform `{request_id, error}` envelope as a `JsonValue`
/// response so every handler's error and success arms share one return
/// type, however the success body happens to be shaped.
fn err_resp(request_id: Option<String>, err: VoucherError) -> (StatusCode, Json<JsonValue>) {
    let (status, message) = err.status_and_message();
    let body = ErrorBody {
        request_id,
        error: message,
    };
    (status, Json(serde_json::to_value(body).expect("ErrorBody always serializes")))
}

fn parse_pool(raw: &str, request_id: Option<String>) -> Result<PoolName, (StatusCode, Json<JsonValue>)> {
    PoolName::parse(raw).map_err(|e| err_resp(request_id, e))
}

async fn issue(
    State(pool): State<PgPool>,
    Path((pool_name, operator, request_id)): Path<(String, String, String)>,
    Json(body): Json<JsonValue>,
) -> (StatusCode, Json<JsonValue>) {
    let rid = Some(request_id.clone());
    let pool_name = match parse_pool(&pool_name, rid.clone()) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    let obj = match body.as_object() {
        Some(o) => o.clone(),
        None => Map::new(),
    };
    if let Err(e) = validate_params(&obj, &["transaction_id", "user_id", "denomination"], &[]) {
        return err_resp(rid, e);
    }

    let (transaction_id, user_id, denomination) =
        match (|| -> Result<_, VoucherError> {
            Ok((
                require_str(&obj, "transaction_id")?,
                require_str(&obj, "user_id")?,
                require_str(&obj, "denomination")?,
            ))
        })() {
            Ok(t) => t,
            Err(e) => {
                return err_resp(rid, e);
            }
        };

    let key = AuditKey {
        request_id: request_id.clone(),
        transaction_id,
        user_id,
    };

    match issue_service::issue(&pool, &pool_name, &operator, &denomination, &key).await {
        Ok(voucher) => (
            StatusCode::OK,
            Json(serde_json::json!({"request_id": request_id, "voucher": voucher})),
        ),
        Err(e) => err_resp(rid, e),
    }
}

async fn import(
    State(pool): State<PgPool>,
    Path((pool_name, request_id)): Path<(String, String)>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> (StatusCode, Json<JsonValue>) {
    let rid = Some(request_id.clone());
    let pool_name = match parse_pool(&pool_name, rid.clone()) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    let claimed_md5 = match headers.get("content-md5").and_then(|v| v.to_str().ok()) {
        Some(v) => v.to_string(),
        None => {
            return err_resp(rid, VoucherError::BadRequest("Missing 'Content-MD5' header.".to_string()));
        }
    };

    let computed_md5 = content_md5_base64(&body);
    if computed_md5 != claimed_md5 {
        return err_resp(rid, VoucherError::BadRequest("Content-MD5 header does not match body.".to_string()));
    }

    let rows = match parse_csv(&body) {
        Ok(rows) => rows,
        Err(e) => return err_resp(rid, e),
    };

    match import_service::import(&pool, &pool_name, &request_id, &claimed_md5, &rows).await {
        Ok(()) => (
            StatusCode::CREATED,
            Json(serde_json::json!({"request_id": request_id, "imported": true})),
        ),
        Err(e) => err_resp(rid, e),
    }
}

async fn export(
    State(pool): State<PgPool>,
    Path((pool_name, request_id)): Path<(String, String)>,
    Json(body): Json<JsonValue>,
) -> (StatusCode, Json<JsonValue>) {
    let rid = Some(request_id.clone());
    let pool_name = match parse_pool(&pool_name, rid.clone()) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    let obj = match body.as_object() {
        Some(o) => o.clone(),
        None => Map::new(),
    };
    if let Err(e) = validate_params(&obj, &[], &["count", "operators", "denominations"]) {
        return err_resp(rid, e);
    }
    let request: ExportRequest = match serde_json::from_value(JsonValue::Object(obj)) {
        Ok(r) => r,
        Err(e) => {
            return err_resp(rid, VoucherError::BadRequest(format!("Invalid export request: {e}")));
        }
    };

    match export_service::export(&pool, &pool_name, &request_id, request).await {
        Ok(ExportResponse { vouchers, warnings }) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "request_id": request_id,
                "vouchers": vouchers,
                "warnings": warnings,
            })),
        ),
        Err(e) => err_resp(rid, e),
    }
}

async fn audit_query(
    State(pool): State<PgPool>,
    Path(pool_name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<JsonValue>) {
    let request_id = params.get("request_id").cloned();
    let pool_name = match parse_pool(&pool_name, request_id.clone()) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    let field_raw = match params.get("field") {
        Some(f) => f,
        None => {
            return err_resp(request_id, VoucherError::BadRequest("Missing request parameters: 'field'".to_string()));
        }
    };
    let value = match params.get("value") {
        Some(v) => v,
        None => {
            return err_resp(request_id, VoucherError::BadRequest("Missing request parameters: 'value'".to_string()));
        }
    };

    let field = match audit_query_service::Field::parse(field_raw) {
        Ok(f) => f,
        Err(e) => return err_resp(request_id, e),
    };

    match audit_query_service::query(&pool, &pool_name, field, value).await {
        Ok(results) => (
            StatusCode::OK,
            Json(serde_json::json!({"request_id": request_id, "results": results})),
        ),
        Err(e) => err_resp(request_id, e),
    }
}

async fn voucher_counts(
    State(pool): State<PgPool>,
    Path(pool_name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<JsonValue>) {
    let request_id = params.get("request_id").cloned();
    let pool_name = match parse_pool(&pool_name, request_id.clone()) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    match count_service::count(&pool, &pool_name).await {
        Ok(counts) => (
            StatusCode::OK,
            Json(serde_json::json!({"request_id": request_id, "voucher_counts": counts})),
        ),
        Err(e) => err_resp(request_id, e),
    }
}
