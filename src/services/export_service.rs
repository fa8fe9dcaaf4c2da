//! `export`: bulk-consume vouchers across the cartesian product of
//! requested operators and denominations, idempotently.

use sqlx::PgPool;

use crate::error::VoucherError;
use crate::models::{ExportRequest, ExportResponse, ExportedVoucher};
use crate::pool_name::PoolName;
use crate::repos::voucher_repo::Reason;
use crate::repos::{export_audit_repo, voucher_repo};

pub async fn export(
    pool: &PgPool,
    pool_name: &PoolName,
    request_id: &str,
    request: ExportRequest,
) -> Result<ExportResponse, VoucherError> {
    let mut tx = pool.begin().await.map_err(VoucherError::Database)?;
    let request_data = serde_json::to_value(&request)
        .map_err(|e| VoucherError::Internal(format!("cannot serialize export request: {e}")))?;

    match export_audit_repo::lookup(&mut tx, pool_name, request_id, &request_data).await? {
        export_audit_repo::Outcome::Match(vouchers, warnings) => {
            tx.rollback().await.map_err(VoucherError::Database)?;
            Ok(ExportResponse { vouchers, warnings })
        }
        export_audit_repo::Outcome::Mismatch => {
            tx.rollback().await.map_err(VoucherError::Database)?;
            Err(VoucherError::AuditMismatch)
        }
        export_audit_repo::Outcome::Absent => {
            let operators = match &request.operators {
                Some(ops) => ops.clone(),
                None => voucher_repo::list_operators(&mut tx, pool_name).await?,
            };
            let denominations = match &request.denominations {
                Some(denoms) => denoms.clone(),
                None => voucher_repo::list_denominations(&mut tx, pool_name).await?,
            };

            let mut vouchers: Vec<ExportedVoucher> = Vec::new();
            let mut warnings: Vec<String> = Vec::new();

            for operator in &operators {
                for denomination in &denominations {
                    let mut taken: i64 = 0;
                    loop {
                        if let Some(target) = request.count {
                            if taken >= target {
                                break;
                            }
                        }
                        match voucher_repo::pick_and_consume(
                            &mut tx,
                            pool_name,
                            operator,
                            denomination,
                            Reason::Exported,
                        )
                        .await?
                        {
                            None => break,
                            Some(voucher) => {
                                export_audit_repo::link_voucher(
                                    &mut tx,
                                    pool_name,
                                    request_id,
                                    voucher.id,
                                )
                                .await?;
                                vouchers.push(ExportedVoucher::from(voucher));
                                taken += 1;
                            }
                        }
                    }
                    if let Some(target) = request.count {
                        if taken < target {
                            warnings.push(format!(
                                "Insufficient vouchers available for '{operator}' '{denomination}'."
                            ));
                        }
                    }
                }
            }

            export_audit_repo::record(&mut tx, pool_name, request_id, &request_data, &warnings)
                .await?;
            tx.commit().await.map_err(VoucherError::Database)?;
            Ok(ExportResponse { vouchers, warnings })
        }
    }
}
