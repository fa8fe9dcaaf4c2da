use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// The triple attached to every mutating request: who sent it, in what
/// transaction, and under what client-chosen request id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditKey {
    pub request_id: String,
    pub transaction_id: String,
    pub user_id: String,
}

/// Full voucher row as stored, including the timestamps the engine's public
/// projection excludes.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VoucherRow {
    pub id: i32,
    pub operator: String,
    pub denomination: String,
    pub voucher: String,
    pub used: bool,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Projection returned by `pick_and_consume`. Excludes `created_at` and
/// `modified_at`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VoucherProjection {
    pub id: i32,
    pub operator: String,
    pub denomination: String,
    pub voucher: String,
    pub used: bool,
    pub reason: Option<String>,
}

/// A voucher as returned to callers from `issue`/`export`. No id, no
/// timestamps, just the fields a caller needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
pub struct ExportedVoucher {
    pub operator: String,
    pub denomination: String,
    pub voucher: String,
}

impl From<VoucherProjection> for ExportedVoucher {
    fn from(v: VoucherProjection) -> Self {
        ExportedVoucher {
            operator: v.operator,
            denomination: v.denomination,
            voucher: v.voucher,
        }
    }
}

/// One row of `P_vouchers` as imported from CSV, before insertion.
#[derive(Debug, Clone, Deserialize)]
pub struct VoucherImportRow {
    pub operator: String,
    pub denomination: String,
    pub voucher: String,
}

/// `GROUP BY operator, denomination, used` projection.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct VoucherCount {
    pub operator: String,
    pub denomination: String,
    pub used: bool,
    pub count: i64,
}

/// Raw `P_audit` row as stored.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuditRow {
    pub request_id: String,
    pub transaction_id: String,
    pub user_id: String,
    pub request_data: JsonValue,
    pub response_data: JsonValue,
    pub error: bool,
    pub created_at: DateTime<Utc>,
}

/// `P_audit` row projected for `audit_query` responses.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub request_id: String,
    pub transaction_id: String,
    pub user_id: String,
    pub request_data: JsonValue,
    pub response_data: JsonValue,
    pub error: bool,
    pub created_at: String,
}

impl From<AuditRow> for AuditEntry {
    fn from(row: AuditRow) -> Self {
        AuditEntry {
            request_id: row.request_id,
            transaction_id: row.transaction_id,
            user_id: row.user_id,
            request_data: row.request_data,
            response_data: row.response_data,
            error: row.error,
            created_at: format_micros(row.created_at),
        }
    }
}

/// Formats a timestamp as ISO-8601 with microsecond precision, matching the
/// `created_at` format audit query responses carry.
pub fn format_micros(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Standard error envelope: `{request_id, error}`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub request_id: Option<String>,
    pub error: String,
}

/// Body of `PUT /<pool>/export/<request_id>`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExportRequest {
    pub count: Option<i64>,
    pub operators: Option<Vec<String>>,
    pub denominations: Option<Vec<String>>,
}

/// Result of a (possibly replayed) export.
#[derive(Debug, Clone, Serialize)]
pub struct ExportResponse {
    pub vouchers: Vec<ExportedVoucher>,
    pub warnings: Vec<String>,
}
