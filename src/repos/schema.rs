//! DDL for a pool's five tables. Creation is unconditional and idempotent;
//! `CREATE TABLE IF NOT EXISTS` sidesteps the "swallow already-exists"
//! dance a driver without native idempotent DDL would otherwise need,
//! since Postgres gives us idempotent DDL natively.

use sqlx::PgPool;

use crate::error::{classify, VoucherError};
use crate::pool_name::PoolName;

pub async fn ensure_tables(pool: &PgPool, name: &PoolName) -> Result<(), VoucherError> {
    let mut tx = pool.begin().await.map_err(VoucherError::Database)?;

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {vouchers} (
            id SERIAL PRIMARY KEY,
            operator TEXT NOT NULL,
            denomination TEXT NOT NULL,
            voucher TEXT NOT NULL,
            used BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            modified_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            reason TEXT
        )
        "#,
        vouchers = name.vouchers_table(),
    ))
    .execute(&mut *tx)
    .await
    .map_err(|e| classify(e, name.as_str()))?;

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {audit} (
            id SERIAL PRIMARY KEY,
            request_id TEXT NOT NULL UNIQUE,
            transaction_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            request_data JSONB NOT NULL,
            response_data JSONB NOT NULL,
            error BOOLEAN NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
        audit = name.audit_table(),
    ))
    .execute(&mut *tx)
    .await
    .map_err(|e| classify(e, name.as_str()))?;

    sqlx::query(&format!(
        r#"
        CREATE INDEX IF NOT EXISTS {idx_tx} ON {audit} (transaction_id)
        "#,
        idx_tx = format!("idx_{}_audit_transaction_id", sanitize(name.as_str())),
        audit = name.audit_table(),
    ))
    .execute(&mut *tx)
    .await
    .map_err(|e| classify(e, name.as_str()))?;

    sqlx::query(&format!(
        r#"
        CREATE INDEX IF NOT EXISTS {idx_user} ON {audit} (user_id)
        "#,
        idx_user = format!("idx_{}_audit_user_id", sanitize(name.as_str())),
        audit = name.audit_table(),
    ))
    .execute(&mut *tx)
    .await
    .map_err(|e| classify(e, name.as_str()))?;

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {import_audit} (
            id SERIAL PRIMARY KEY,
            request_id TEXT NOT NULL UNIQUE,
            content_md5 TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
        import_audit = name.import_audit_table(),
    ))
    .execute(&mut *tx)
    .await
    .map_err(|e| classify(e, name.as_str()))?;

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {export_audit} (
            id SERIAL PRIMARY KEY,
            request_id TEXT NOT NULL UNIQUE,
            request_data JSONB NOT NULL,
            warnings JSONB NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
        export_audit = name.export_audit_table(),
    ))
    .execute(&mut *tx)
    .await
    .map_err(|e| classify(e, name.as_str()))?;

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {exported_vouchers} (
            id SERIAL PRIMARY KEY,
            request_id TEXT NOT NULL,
            voucher_id INTEGER NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
        exported_vouchers = name.exported_vouchers_table(),
    ))
    .execute(&mut *tx)
    .await
    .map_err(|e| classify(e, name.as_str()))?;

    sqlx::query(&format!(
        r#"
        CREATE INDEX IF NOT EXISTS {idx_req} ON {exported_vouchers} (request_id)
        "#,
        idx_req = format!("idx_{}_exported_vouchers_request_id", sanitize(name.as_str())),
        exported_vouchers = name.exported_vouchers_table(),
    ))
    .execute(&mut *tx)
    .await
    .map_err(|e| classify(e, name.as_str()))?;

    tx.commit().await.map_err(VoucherError::Database)?;
    Ok(())
}

/// Index names can't be quoted identifiers containing `-`, so hyphens are
/// folded to underscores for the (unquoted) index name only; the table name
/// itself stays quoted and unmodified.
fn sanitize(name: &str) -> String {
    name.replace('-', "_")
}
