//! The audit ledger: idempotency lookups keyed on `request_id`, with the
//! stored `transaction_id`/`user_id`/`request_data` compared against the
//! incoming request to distinguish a genuine replay from a reused
//! `request_id` with different parameters.

use serde_json::Value as JsonValue;
use sqlx::{Postgres, Transaction};

use crate::error::{classify, VoucherError};
use crate::models::{AuditKey, AuditRow};
use crate::pool_name::PoolName;

/// What a prior-request lookup for a given `request_id` found.
pub enum Outcome {
    /// No row for this `request_id`. This is a fresh request.
    Absent,
    /// Same `request_id` with identical `transaction_id`/`user_id`/request
    /// parameters. A true replay. Carries the stored success response.
    Match(JsonValue),
    /// Same `request_id` but different parameters: a reused key, rejected
    /// outright.
    Mismatch,
    /// Same `request_id`, identical parameters, but the original attempt
    /// recorded "no voucher available". Replayed as the same error rather
    /// than re-attempting the pick.
    ReplayedNoVoucher,
}

/// Looks up any prior attempt at `key.request_id` and classifies it against
/// the incoming `transaction_id`/`user_id`/`request_data`.
pub async fn lookup_prior(
    tx: &mut Transaction<'_, Postgres>,
    pool_name: &PoolName,
    key: &AuditKey,
    request_data: &JsonValue,
) -> Result<Outcome, VoucherError> {
    let table = pool_name.audit_table();
    let sql = format!(
        "SELECT request_id, transaction_id, user_id, request_data, response_data, error, created_at \
         FROM {table} WHERE request_id = $1"
    );
    let row = sqlx::query_as::<_, AuditRow>(&sql)
        .bind(&key.request_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| classify(e, pool_name.as_str()))?;

    let Some(row) = row else {
        return Ok(Outcome::Absent);
    };

    if row.transaction_id != key.transaction_id
        || row.user_id != key.user_id
        || &row.request_data != request_data
    {
        return Ok(Outcome::Mismatch);
    }

    if row.error {
        return Ok(Outcome::ReplayedNoVoucher);
    }

    Ok(Outcome::Match(row.response_data))
}

/// Records the outcome of a fresh request, keyed on `request_id`.
/// `response_data` is the success payload for a non-error outcome, or an
/// opaque marker (`{"kind": "no_voucher"}`) for the one error outcome the
/// ledger records.
pub async fn record_request(
    tx: &mut Transaction<'_, Postgres>,
    pool_name: &PoolName,
    key: &AuditKey,
    request_data: &JsonValue,
    response_data: &JsonValue,
    is_error: bool,
) -> Result<(), VoucherError> {
    let table = pool_name.audit_table();
    let sql = format!(
        "INSERT INTO {table} (request_id, transaction_id, user_id, request_data, response_data, error, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, NOW())"
    );
    sqlx::query(&sql)
        .bind(&key.request_id)
        .bind(&key.transaction_id)
        .bind(&key.user_id)
        .bind(request_data)
        .bind(response_data)
        .bind(is_error)
        .execute(&mut **tx)
        .await
        .map_err(|e| classify(e, pool_name.as_str()))?;
    Ok(())
}

/// Audit rows matching one of `request_id`, `transaction_id` or `user_id`,
/// oldest first.
pub async fn query_by_request_id(
    pool: &sqlx::PgPool,
    pool_name: &PoolName,
    request_id: &str,
) -> Result<Vec<AuditRow>, VoucherError> {
    query_by_field(pool, pool_name, "request_id", request_id).await
}

pub async fn query_by_transaction_id(
    pool: &sqlx::PgPool,
    pool_name: &PoolName,
    transaction_id: &str,
) -> Result<Vec<AuditRow>, VoucherError> {
    query_by_field(pool, pool_name, "transaction_id", transaction_id).await
}

pub async fn query_by_user_id(
    pool: &sqlx::PgPool,
    pool_name: &PoolName,
    user_id: &str,
) -> Result<Vec<AuditRow>, VoucherError> {
    query_by_field(pool, pool_name, "user_id", user_id).await
}

async fn query_by_field(
    pool: &sqlx::PgPool,
    pool_name: &PoolName,
    field: &str,
    value: &str,
) -> Result<Vec<AuditRow>, VoucherError> {
    let table = pool_name.audit_table();
    let sql = format!(
        "SELECT request_id, transaction_id, user_id, request_data, response_data, error, created_at \
         FROM {table} WHERE {field} = $1 ORDER BY created_at ASC"
    );
    sqlx::query_as::<_, AuditRow>(&sql)
        .bind(value)
        .fetch_all(pool)
        .await
        .map_err(|e| classify(e, pool_name.as_str()))
}
