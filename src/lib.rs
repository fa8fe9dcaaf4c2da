pub mod cli;
pub mod content_hash;
pub mod csv_import;
pub mod db;
pub mod error;
pub mod models;
pub mod params;
pub mod pool_name;
pub mod repos;
pub mod routes;
pub mod services;
