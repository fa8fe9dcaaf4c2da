//! `issue`: hand out one voucher, exactly once per `request_id`.

use serde_json::json;
use sqlx::PgPool;

use crate::error::VoucherError;
use crate::models::AuditKey;
use crate::pool_name::PoolName;
use crate::repos::voucher_repo::Reason;
use crate::repos::{audit_repo, voucher_repo};

pub async fn issue(
    pool: &PgPool,
    pool_name: &PoolName,
    operator: &str,
    denomination: &str,
    key: &AuditKey,
) -> Result<String, VoucherError> {
    let mut tx = pool.begin().await.map_err(VoucherError::Database)?;
    let request_data = json!({"operator": operator, "denomination": denomination});

    match audit_repo::lookup_prior(&mut tx, pool_name, key, &request_data).await? {
        audit_repo::Outcome::Match(response) => {
            tx.rollback().await.map_err(VoucherError::Database)?;
            response
                .get("voucher")
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .ok_or_else(|| VoucherError::Internal("corrupt audit response".into()))
        }
        audit_repo::Outcome::Mismatch => {
            tx.rollback().await.map_err(VoucherError::Database)?;
            Err(VoucherError::AuditMismatch)
        }
        audit_repo::Outcome::ReplayedNoVoucher => {
            tx.rollback().await.map_err(VoucherError::Database)?;
            Err(VoucherError::NoVoucher)
        }
        audit_repo::Outcome::Absent => {
            match voucher_repo::pick_and_consume(&mut tx, pool_name, operator, denomination, Reason::Issued)
                .await?
            {
                None => {
                    // The no-voucher outcome is itself recorded and committed,
                    // so a retry replays the same failure rather than
                    // re-scanning an empty pool.
                    audit_repo::record_request(
                        &mut tx,
                        pool_name,
                        key,
                        &request_data,
                        &json!({"kind": "no_voucher"}),
                        true,
                    )
                    .await?;
                    tx.commit().await.map_err(VoucherError::Database)?;
                    Err(VoucherError::NoVoucher)
                }
                Some(voucher) => {
                    let response = json!({"voucher": voucher.voucher});
                    audit_repo::record_request(&mut tx, pool_name, key, &request_data, &response, false)
                        .await?;
                    tx.commit().await.map_err(VoucherError::Database)?;
                    Ok(voucher.voucher)
                }
            }
        }
    }
}
