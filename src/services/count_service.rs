//! `voucher_counts`: grouped counts, read-only, no transaction required.

use sqlx::PgPool;

use crate::error::VoucherError;
use crate::models::VoucherCount;
use crate::pool_name::PoolName;
use crate::repos::voucher_repo;

pub async fn count(pool: &PgPool, pool_name: &PoolName) -> Result<Vec<VoucherCount>, VoucherError> {
    voucher_repo::count(pool, pool_name).await
}
