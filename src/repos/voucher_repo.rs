//! The voucher engine: picking and atomically consuming a voucher, grouped
//! counts, and the distinct operator/denomination lists `export` needs when
//! a filter is left null.

use sqlx::{Postgres, Transaction};

use crate::error::{classify, VoucherError};
use crate::models::{VoucherCount, VoucherImportRow, VoucherProjection};
use crate::pool_name::PoolName;

/// Why a voucher was consumed. Set atomically with `used = true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    Issued,
    Exported,
}

impl Reason {
    fn as_str(self) -> &'static str {
        match self {
            Reason::Issued => "issued",
            Reason::Exported => "exported",
        }
    }
}

/// Selects one unused voucher matching `(operator, denomination)` and marks
/// it used, in a single statement. `FOR UPDATE SKIP LOCKED` in the subquery
/// closes the read-then-update window: two concurrent callers racing for
/// the same row never both win, and neither blocks behind a row a third
/// transaction is already consuming.
pub async fn pick_and_consume(
    tx: &mut Transaction<'_, Postgres>,
    pool_name: &PoolName,
    operator: &str,
    denomination: &str,
    reason: Reason,
) -> Result<Option<VoucherProjection>, VoucherError> {
    let table = pool_name.vouchers_table();
    let sql = format!(
        r#"
        UPDATE {table}
        SET used = true, reason = $1, modified_at = NOW()
        WHERE id = (
            SELECT id FROM {table}
            WHERE operator = $2 AND denomination = $3 AND used = false
            ORDER BY id
            FOR UPDATE SKIP LOCKED
            LIMIT 1
        )
        RETURNING id, operator, denomination, voucher, used, reason
        "#
    );
    sqlx::query_as::<_, VoucherProjection>(&sql)
        .bind(reason.as_str())
        .bind(operator)
        .bind(denomination)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| classify(e, pool_name.as_str()))
}

/// Bulk-inserts freshly imported voucher rows, all initially unused.
/// Mirrors `journal_repo::bulk_insert_lines`'s per-row loop rather than a
/// single multi-row statement. Import batches are small enough (one CSV
/// upload) that statement-building complexity isn't worth it.
pub async fn bulk_insert(
    tx: &mut Transaction<'_, Postgres>,
    pool_name: &PoolName,
    rows: &[VoucherImportRow],
) -> Result<(), VoucherError> {
    let table = pool_name.vouchers_table();
    let sql = format!(
        r#"
        INSERT INTO {table} (operator, denomination, voucher, used, created_at, modified_at)
        VALUES ($1, $2, $3, false, NOW(), NOW())
        "#
    );
    for row in rows {
        sqlx::query(&sql)
            .bind(&row.operator)
            .bind(&row.denomination)
            .bind(&row.voucher)
            .execute(&mut **tx)
            .await
            .map_err(|e| classify(e, pool_name.as_str()))?;
    }
    Ok(())
}

pub async fn count(pool: &sqlx::PgPool, pool_name: &PoolName) -> Result<Vec<VoucherCount>, VoucherError> {
    let table = pool_name.vouchers_table();
    let sql = format!(
        r#"
        SELECT operator, denomination, used, COUNT(*) AS count
        FROM {table}
        GROUP BY operator, denomination, used
        "#
    );
    sqlx::query_as::<_, VoucherCount>(&sql)
        .fetch_all(pool)
        .await
        .map_err(|e| classify(e, pool_name.as_str()))
}

pub async fn list_operators(
    tx: &mut Transaction<'_, Postgres>,
    pool_name: &PoolName,
) -> Result<Vec<String>, VoucherError> {
    let table = pool_name.vouchers_table();
    let sql = format!("SELECT DISTINCT operator FROM {table}");
    sqlx::query_scalar::<_, String>(&sql)
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| classify(e, pool_name.as_str()))
}

pub async fn list_denominations(
    tx: &mut Transaction<'_, Postgres>,
    pool_name: &PoolName,
) -> Result<Vec<String>, VoucherError> {
    let table = pool_name.vouchers_table();
    let sql = format!("SELECT DISTINCT denomination FROM {table}");
    sqlx::query_scalar::<_, String>(&sql)
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| classify(e, pool_name.as_str()))
}
