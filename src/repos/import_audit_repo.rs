//! Idempotency ledger for `import`, keyed on `request_id` and the request
//! body's `Content-MD5`, rather than on parsed parameters. Import's payload
//! is the CSV body itself.

use sqlx::{Postgres, Transaction};

use crate::error::{classify, VoucherError};
use crate::pool_name::PoolName;

pub enum Outcome {
    /// No prior import under this `request_id`.
    Absent,
    /// Same `request_id`, same `Content-MD5`. A true replay, already done.
    AlreadyImported,
    /// Same `request_id`, different `Content-MD5`. A reused key, reject.
    Mismatch,
}

pub async fn lookup(
    tx: &mut Transaction<'_, Postgres>,
    pool_name: &PoolName,
    request_id: &str,
    content_md5: &str,
) -> Result<Outcome, VoucherError> {
    let table = pool_name.import_audit_table();
    let sql = format!("SELECT content_md5 FROM {table} WHERE request_id = $1");
    let stored: Option<String> = sqlx::query_scalar(&sql)
        .bind(request_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| classify(e, pool_name.as_str()))?;

    Ok(match stored {
        None => Outcome::Absent,
        Some(md5) if md5 == content_md5 => Outcome::AlreadyImported,
        Some(_) => Outcome::Mismatch,
    })
}

pub async fn record(
    tx: &mut Transaction<'_, Postgres>,
    pool_name: &PoolName,
    request_id: &str,
    content_md5: &str,
) -> Result<(), VoucherError> {
    let table = pool_name.import_audit_table();
    let sql = format!(
        "INSERT INTO {table} (request_id, content_md5, created_at) VALUES ($1, $2, NOW())"
    );
    sqlx::query(&sql)
        .bind(request_id)
        .bind(content_md5)
        .execute(&mut **tx)
        .await
        .map_err(|e| classify(e, pool_name.as_str()))?;
    Ok(())
}
