//! Idempotency ledger for `export`. A replayed export must return exactly
//! the vouchers it handed out the first time, so the ledger tracks not just
//! the request but which voucher rows were linked to it via
//! `exported_vouchers`.

use serde_json::Value as JsonValue;
use sqlx::{Postgres, Transaction};

use crate::error::{classify, VoucherError};
use crate::models::ExportedVoucher;
use crate::pool_name::PoolName;

pub enum Outcome {
    Absent,
    Match(Vec<ExportedVoucher>, Vec<String>),
    Mismatch,
}

pub async fn lookup(
    tx: &mut Transaction<'_, Postgres>,
    pool_name: &PoolName,
    request_id: &str,
    request_data: &JsonValue,
) -> Result<Outcome, VoucherError> {
    let export_audit = pool_name.export_audit_table();
    let sql = format!(
        "SELECT request_data, warnings FROM {export_audit} WHERE request_id = $1"
    );
    let row: Option<(JsonValue, JsonValue)> = sqlx::query_as(&sql)
        .bind(request_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| classify(e, pool_name.as_str()))?;

    let Some((stored_request_data, stored_warnings)) = row else {
        return Ok(Outcome::Absent);
    };

    if &stored_request_data != request_data {
        return Ok(Outcome::Mismatch);
    }

    let warnings: Vec<String> = serde_json::from_value(stored_warnings)
        .map_err(|e| VoucherError::Internal(format!("corrupt warnings payload: {e}")))?;

    let vouchers_table = pool_name.vouchers_table();
    let exported_table = pool_name.exported_vouchers_table();
    let sql = format!(
        "SELECT v.operator, v.denomination, v.voucher \
         FROM {exported_table} e JOIN {vouchers_table} v ON v.id = e.voucher_id \
         WHERE e.request_id = $1 ORDER BY e.id ASC"
    );
    let vouchers: Vec<ExportedVoucher> = sqlx::query_as(&sql)
        .bind(request_id)
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| classify(e, pool_name.as_str()))?;

    Ok(Outcome::Match(vouchers, warnings))
}

pub async fn record(
    tx: &mut Transaction<'_, Postgres>,
    pool_name: &PoolName,
    request_id: &str,
    request_data: &JsonValue,
    warnings: &[String],
) -> Result<(), VoucherError> {
    let table = pool_name.export_audit_table();
    let sql = format!(
        "INSERT INTO {table} (request_id, request_data, warnings, created_at) VALUES ($1, $2, $3, NOW())"
    );
    let warnings_json = serde_json::to_value(warnings)
        .map_err(|e| VoucherError::Internal(format!("cannot serialize warnings: {e}")))?;
    sqlx::query(&sql)
        .bind(request_id)
        .bind(request_data)
        .bind(warnings_json)
        .execute(&mut **tx)
        .await
        .map_err(|e| classify(e, pool_name.as_str()))?;
    Ok(())
}

/// Links a consumed voucher row to the export request that took it, so a
/// replay can reconstruct exactly the same vouchers.
pub async fn link_voucher(
    tx: &mut Transaction<'_, Postgres>,
    pool_name: &PoolName,
    request_id: &str,
    voucher_id: i32,
) -> Result<(), VoucherError> {
    let table = pool_name.exported_vouchers_table();
    let sql = format!(
        "INSERT INTO {table} (request_id, voucher_id, created_at) VALUES ($1, $2, NOW())"
    );
    sqlx::query(&sql)
        .bind(request_id)
        .bind(voucher_id)
        .execute(&mut **tx)
        .await
        .map_err(|e| classify(e, pool_name.as_str()))?;
    Ok(())
}
