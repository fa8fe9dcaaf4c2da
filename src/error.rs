use axum::http::StatusCode;

/// Postgres SQLSTATE for "undefined_table", the structural signal that a
/// pool's tables have never been created, as opposed to any other storage
/// failure. We key off this code rather than substring-matching the driver's
/// error message, which is fragile across Postgres versions and drivers.
const UNDEFINED_TABLE: &str = "42P01";

/// The closed set of domain-level outcomes a request can produce. Storage
/// errors are classified into this enum at the repository boundary
/// (`classify`, below) and never leak past it as raw `sqlx::Error`.
#[derive(Debug, thiserror::Error)]
pub enum VoucherError {
    #[error("voucher pool '{0}' does not exist")]
    NoPool(String),

    #[error("no voucher available")]
    NoVoucher,

    #[error("request already performed with different parameters")]
    AuditMismatch,

    #[error("{0}")]
    BadRequest(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl VoucherError {
    /// Maps a domain error to its caller-visible (status, message) pair per
    /// the service's error taxonomy. Callers own the response envelope
    /// (which also needs the echoed `request_id`), so this stops short of
    /// an `IntoResponse` impl.
    pub fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            VoucherError::NoPool(_) => (
                StatusCode::NOT_FOUND,
                "Voucher pool does not exist.".to_string(),
            ),
            VoucherError::NoVoucher => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "No voucher available.".to_string(),
            ),
            VoucherError::AuditMismatch => (
                StatusCode::BAD_REQUEST,
                "This request has already been performed with different parameters."
                    .to_string(),
            ),
            VoucherError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            VoucherError::Database(e) => {
                tracing::error!(error = %e, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error.".to_string(),
                )
            }
            VoucherError::Internal(msg) => {
                tracing::error!(%msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error.".to_string(),
                )
            }
        }
    }
}

/// Classifies a storage error raised while operating on `pool`'s tables.
/// A missing-table error becomes `NoPool`; everything else is an opaque
/// `Database` error. This is the only place storage errors are interpreted.
pub fn classify(e: sqlx::Error, pool: &str) -> VoucherError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.code().as_deref() == Some(UNDEFINED_TABLE) {
            return VoucherError::NoPool(pool.to_string());
        }
    }
    VoucherError::Database(e)
}
