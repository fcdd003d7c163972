use crate::build_info;
use crate::config::ConfigOverrides;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    about = "Assigns sequential ticket numbers to Notion database pages in creation order",
    version = build_info::VERSION_WITH_COMMIT,
    long_version = build_info::VERSION_WITH_COMMIT
)]
pub struct Cli {
    #[arg(long = "database-id")]
    /// Target database (overrides NOTION_DATABASE_ID)
    pub database_id: Option<String>,

    #[arg(long = "id-prop")]
    /// Number property to fill (overrides NOTION_ID_PROP, default "Ticket ID")
    pub id_prop: Option<String>,

    #[arg(long = "page-size")]
    /// Records per query page, 1-100
    pub page_size: Option<u32>,

    #[arg(long = "rate-limit-rps")]
    /// Client-side request pacing; 0 disables it
    pub rate_limit_rps: Option<u32>,

    #[arg(long = "retry-attempts")]
    /// Total attempts per request when throttled, including the first
    pub retry_attempts: Option<u32>,

    #[arg(long = "retry-backoff-ms")]
    /// Backoff before the first retry; doubles on each further retry
    pub retry_backoff_ms: Option<u64>,

    #[arg(long, default_value_t = false)]
    /// Print the numbers that would be assigned without writing them
    pub dry_run: bool,

    #[arg(long = "log-level", default_value = "info")]
    pub log_level: String,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            database_id: self.database_id.clone(),
            id_property: self.id_prop.clone(),
            page_size: self.page_size,
            requests_per_second: self.rate_limit_rps,
            retry_attempts: self.retry_attempts,
            retry_backoff_ms: self.retry_backoff_ms,
        }
    }
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
