use crate::application::context::WorkflowConfig;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Command line and environment configuration of the `topup-ledger` binary.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Input events CSV file
    pub input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// Telegram user ids allowed to run admin commands.
    #[arg(long, env = "ADMIN_IDS", value_delimiter = ',')]
    pub admin_ids: Vec<String>,

    /// Chat id of the admin group receiving alerts.
    #[arg(long, env = "ADMIN_GROUP_ID", default_value_t = 0, allow_hyphen_values = true)]
    pub admin_group_id: i64,

    #[arg(long, env = "STORE_TIMEOUT_MS", default_value_t = 5_000)]
    pub store_timeout_ms: u64,

    /// How long a declared top-up waits for its payment proof.
    #[arg(long, env = "INTENT_TTL_SECS", default_value_t = 30 * 60)]
    pub intent_ttl_secs: u64,
}

impl Cli {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn workflow_config(&self) -> WorkflowConfig {
        WorkflowConfig {
            admin_ids: self
                .admin_ids
                .iter()
                .map(|id| id.trim())
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect(),
            admin_group_id: self.admin_group_id,
            intent_ttl: Duration::from_secs(self.intent_ttl_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from([
            "topup-ledger",
            "events.csv",
            "--admin-ids",
            "900, 901,",
            "--admin-group-id",
            "-100",
            "--intent-ttl-secs",
            "60",
        ])
        .unwrap();

        let config = cli.workflow_config();
        assert_eq!(
            config.admin_ids.into_iter().collect::<Vec<_>>(),
            vec!["900".to_string(), "901".to_string()]
        );
        assert_eq!(config.admin_group_id, -100);
        assert_eq!(config.intent_ttl, Duration::from_secs(60));
        assert_eq!(cli.store_timeout(), Duration::from_millis(5_000));
        assert!(cli.db_path.is_none());
    }
}
