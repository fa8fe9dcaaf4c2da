//! `audit_query`: read-only lookup by one of three indexed fields, oldest
//! first.

use sqlx::PgPool;

use crate::error::VoucherError;
use crate::models::AuditEntry;
use crate::pool_name::PoolName;
use crate::repos::audit_repo;

/// The three fields `audit_query` may filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    RequestId,
    TransactionId,
    UserId,
}

impl Field {
    pub fn parse(raw: &str) -> Result<Self, VoucherError> {
        match raw {
            "request_id" => Ok(Field::RequestId),
            "transaction_id" => Ok(Field::TransactionId),
            "user_id" => Ok(Field::UserId),
            other => Err(VoucherError::BadRequest(format!(
                "'field' must be one of 'request_id', 'transaction_id', 'user_id', got '{other}'."
            ))),
        }
    }
}

pub async fn query(
    pool: &PgPool,
    pool_name: &PoolName,
    field: Field,
    value: &str,
) -> Result<Vec<AuditEntry>, VoucherError> {
    let rows = match field {
        Field::RequestId => audit_repo::query_by_request_id(pool, pool_name, value).await?,
        Field::TransactionId => audit_repo::query_by_transaction_id(pool, pool_name, value).await?,
        Field::UserId => audit_repo::query_by_user_id(pool, pool_name, value).await?,
    };
    Ok(rows.into_iter().map(AuditEntry::from).collect())
}
