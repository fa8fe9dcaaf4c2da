pub mod audit_query_service;
pub mod count_service;
pub mod export_service;
pub mod import_service;
pub mod issue_service;
