use clap::Parser;

/// Command-line options for the voucher service. `-d` has no default: clap
/// generates a usage error and non-zero exit when it's missing.
#[derive(Debug, Parser)]
#[command(name = "voucher-rs", about = "Multi-tenant prepaid airtime voucher issuance service")]
pub struct Cli {
    #[arg(short = 'p', long = "port", default_value_t = 8080)]
    pub port: u16,

    #[arg(short = 'd', long = "database-connection-string")]
    pub database_connection_string: String,
}
