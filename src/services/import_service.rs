//! `import`: create the pool's tables on first use, then idempotently
//! bulk-load voucher rows keyed on `request_id` + `Content-MD5`.

use sqlx::PgPool;

use crate::error::VoucherError;
use crate::models::VoucherImportRow;
use crate::pool_name::PoolName;
use crate::repos::{import_audit_repo, schema, voucher_repo};

pub async fn import(
    pool: &PgPool,
    pool_name: &PoolName,
    request_id: &str,
    content_md5: &str,
    rows: &[VoucherImportRow],
) -> Result<(), VoucherError> {
    schema::ensure_tables(pool, pool_name).await?;

    let mut tx = pool.begin().await.map_err(VoucherError::Database)?;
    match import_audit_repo::lookup(&mut tx, pool_name, request_id, content_md5).await? {
        import_audit_repo::Outcome::AlreadyImported => {
            tx.rollback().await.map_err(VoucherError::Database)?;
            Ok(())
        }
        import_audit_repo::Outcome::Mismatch => {
            tx.rollback().await.map_err(VoucherError::Database)?;
            Err(VoucherError::AuditMismatch)
        }
        import_audit_repo::Outcome::Absent => {
            import_audit_repo::record(&mut tx, pool_name, request_id, content_md5).await?;
            voucher_repo::bulk_insert(&mut tx, pool_name, rows).await?;
            tx.commit().await.map_err(VoucherError::Database)?;
            Ok(())
        }
    }
}
