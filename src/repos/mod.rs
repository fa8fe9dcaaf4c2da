pub mod audit_repo;
pub mod export_audit_repo;
pub mod import_audit_repo;
pub mod schema;
pub mod voucher_repo;
