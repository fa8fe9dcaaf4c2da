use std::fmt;

use crate::error::VoucherError;

/// Longest table-name suffix we append (`_exported_vouchers`), used to keep
/// the quoted identifier under Postgres's 63-byte limit.
const LONGEST_SUFFIX: &str = "_exported_vouchers";

/// A validated pool name, safe to interpolate into a quoted SQL identifier.
///
/// Pool tables are named dynamically (`<pool>_vouchers`, `<pool>_audit`,
/// ...), so the name reaches raw SQL as a format-string fragment rather than
/// a bind parameter. We validate the charset up front so that is safe: only
/// ASCII alphanumerics, `_` and `-` are accepted, which excludes the double
/// quote and statement terminator a Postgres quoted identifier would
/// otherwise need escaping for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolName(String);

impl PoolName {
    pub fn parse(raw: &str) -> Result<Self, VoucherError> {
        if raw.is_empty() {
            return Err(VoucherError::BadRequest(
                "Voucher pool name must not be empty.".to_string(),
            ));
        }
        let max_len = 63 - LONGEST_SUFFIX.len();
        if raw.len() > max_len {
            return Err(VoucherError::BadRequest(format!(
                "Voucher pool name '{raw}' is too long (max {max_len} characters)."
            )));
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(VoucherError::BadRequest(format!(
                "Voucher pool name '{raw}' contains invalid characters."
            )));
        }
        Ok(PoolName(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn table(&self, suffix: &str) -> String {
        format!("\"{}_{suffix}\"", self.0)
    }

    pub fn vouchers_table(&self) -> String {
        self.table("vouchers")
    }

    pub fn audit_table(&self) -> String {
        self.table("audit")
    }

    pub fn import_audit_table(&self) -> String {
        self.table("import_audit")
    }

    pub fn export_audit_table(&self) -> String {
        self.table("export_audit")
    }

    pub fn exported_vouchers_table(&self) -> String {
        self.table("exported_vouchers")
    }
}

impl fmt::Display for PoolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
