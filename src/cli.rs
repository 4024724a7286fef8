use std::fmt::Write;
use std::path::Path;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::core::{AdminQueries, AppResult, StatsAggregator};
use crate::storage::RecordStore;

#[derive(Parser)]
#[command(name = "mediagrab")]
#[command(author, version, about = "Telegram bot that downloads videos and images from links", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot (long polling)
    Run,

    /// Print totals from the data file
    Stats {
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the stored record of one user
    User {
        /// Telegram user id
        id: i64,
    },

    /// Verify that every message is translated, then exit
    CheckLocales,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Renders the totals of the data file at `data_file`.
pub async fn stats_report(data_file: &Path, json: bool) -> AppResult<String> {
    let store = Arc::new(RecordStore::new(data_file));
    let report = StatsAggregator::new(store).report().await?;

    if json {
        return Ok(serde_json::to_string_pretty(&report)?);
    }

    let mut out = String::new();
    let _ = writeln!(out, "Total users:     {}", report.totals.total_users);
    let _ = writeln!(out, "Total downloads: {}", report.totals.total_downloads);
    for (code, count) in &report.totals.downloads_by_language {
        let _ = writeln!(out, "  {:<4} {}", code, count);
    }
    let _ = writeln!(out, "Version:         {}", report.version);
    let _ = writeln!(out, "Running since:   {}", report.start_date.to_rfc3339());
    if !report.totals.is_consistent() {
        let _ = writeln!(
            out,
            "WARNING: per-user downloads ({}) differ from per-language downloads ({})",
            report.totals.total_downloads,
            report.totals.language_total()
        );
    }
    Ok(out)
}

/// Renders the stored record of one user.
pub async fn user_report(data_file: &Path, id: i64) -> AppResult<String> {
    let store = Arc::new(RecordStore::new(data_file));
    let Some(record) = AdminQueries::new(store).lookup_user(id).await? else {
        return Ok(format!("User {} not found\n", id));
    };

    let mut out = String::new();
    let _ = writeln!(out, "User ID:        {}", record.user_id);
    let _ = writeln!(out, "First seen:     {}", record.first_seen.to_rfc3339());
    let _ = writeln!(out, "Language:       {}", record.language);
    let _ = writeln!(out, "Download count: {}", record.download_count);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::UserDirectory;
    use crate::Language;
    use tempfile::TempDir;

    #[test]
    fn defaults_to_no_subcommand() {
        let cli = Cli::try_parse_from(["mediagrab"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_subcommands() {
        let cli = Cli::try_parse_from(["mediagrab", "stats", "--json"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Stats { json: true }));

        let cli = Cli::try_parse_from(["mediagrab", "user", "42"]).unwrap();
        assert_eq!(cli.command, Some(Commands::User { id: 42 }));

        let cli = Cli::try_parse_from(["mediagrab", "check-locales"]).unwrap();
        assert_eq!(cli.command, Some(Commands::CheckLocales));
    }

    #[test]
    fn rejects_non_numeric_user_id() {
        assert!(Cli::try_parse_from(["mediagrab", "user", "bob"]).is_err());
    }

    #[tokio::test]
    async fn stats_report_reads_the_data_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bot_data.json");
        let users = UserDirectory::new(Arc::new(RecordStore::new(&path)), Language::En);
        users.set_language(5, Language::Ar).await.unwrap();
        users.record_download(5, Language::Ar).await.unwrap();

        let text = stats_report(&path, false).await.unwrap();
        assert!(text.contains("Total users:     1"));
        assert!(text.contains("Total downloads: 1"));
        assert!(!text.contains("WARNING"));

        let json: serde_json::Value = serde_json::from_str(&stats_report(&path, true).await.unwrap()).unwrap();
        assert_eq!(json["total_users"], 1);
        assert_eq!(json["downloads_by_language"]["ar"], 1);
    }

    #[tokio::test]
    async fn user_report_handles_unknown_ids() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bot_data.json");
        let users = UserDirectory::new(Arc::new(RecordStore::new(&path)), Language::En);
        users.set_language(8, Language::En).await.unwrap();

        assert!(user_report(&path, 8).await.unwrap().contains("Download count: 0"));
        assert_eq!(user_report(&path, 9).await.unwrap(), "User 9 not found\n");
    }

    #[tokio::test]
    async fn unreadable_data_file_is_a_store_error() {
        let dir = TempDir::new().unwrap();
        // A directory cannot be read as a data file.
        let result = stats_report(dir.path(), false).await;
        assert!(matches!(result, Err(crate::AppError::Store(_))));
    }
}
