use crate::app::cast::{parse_selection, CastRequest, Selection};
use crate::app::report::ReportFormat;
use crate::config::AppConfig;
use crate::core::{Category, MemberId};
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "asamblea")]
#[command(about = "Ballot client for the university assembly elections")]
pub struct CliConfig {
    #[arg(long, global = true, help = "Path to a TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Override the voting API base URL")]
    pub base_url: Option<String>,

    #[arg(long, global = true, help = "Request timeout in seconds")]
    pub timeout: Option<u64>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Show the current vote ranking
    Ranking {
        #[arg(long, value_enum, default_value_t = ReportFormat::Table)]
        format: ReportFormat,

        #[arg(long, help = "Only show one category")]
        category: Option<Category>,
    },
    /// Cast a ballot for one assembly member
    Vote {
        #[arg(long)]
        voter: MemberId,

        #[arg(long = "select", value_parser = parse_selection, help = "CATEGORY=ID[,ID...]")]
        selections: Vec<Selection>,

        #[arg(long = "abstain", help = "Abstain in CATEGORY")]
        abstentions: Vec<Category>,

        #[arg(short, long, help = "Submit without asking for confirmation")]
        yes: bool,
    },
}

impl CliConfig {
    /// Config file (or environment) first, then command-line overrides.
    pub fn load_app_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::from_env()?,
        };

        if let Some(base_url) = &self.base_url {
            config.api.base_url = base_url.clone();
        }
        if let Some(timeout) = self.timeout {
            config.api.timeout_seconds = Some(timeout);
        }
        if self.json_logs {
            config.logging.json = true;
        }

        config.validate()?;
        Ok(config)
    }
}

impl Command {
    pub fn cast_request(&self) -> Option<CastRequest> {
        match self {
            Command::Vote {
                voter,
                selections,
                abstentions,
                ..
            } => Some(CastRequest {
                voter_id: *voter,
                selections: selections.clone(),
                abstentions: abstentions.clone(),
            }),
            Command::Ranking { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vote_command() {
        let cli = CliConfig::try_parse_from([
            "asamblea",
            "--base-url",
            "http://votos.local",
            "vote",
            "--voter",
            "12",
            "--select",
            "principales=1,2",
            "--select",
            "asociados=5",
            "--abstain",
            "estudiantes",
            "--yes",
        ])
        .unwrap();

        let request = cli.command.cast_request().unwrap();
        assert_eq!(request.voter_id, 12);
        assert_eq!(request.selections.len(), 2);
        assert_eq!(request.selections[0].candidate_ids, vec![1, 2]);
        assert_eq!(request.abstentions, vec![Category::Students]);

        let config = cli.load_app_config().unwrap();
        assert_eq!(config.api.base_url, "http://votos.local");
    }

    #[test]
    fn test_parse_ranking_command() {
        let cli = CliConfig::try_parse_from([
            "asamblea",
            "ranking",
            "--format",
            "csv",
            "--category",
            "Docentes Asociados",
            "--verbose",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Command::Ranking { format, category } => {
                assert_eq!(format, ReportFormat::Csv);
                assert_eq!(category, Some(Category::AssociateFaculty));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_bad_selection_is_rejected() {
        let result = CliConfig::try_parse_from([
            "asamblea", "vote", "--voter", "1", "--select", "decanos=1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_base_url_override_fails_validation() {
        let cli = CliConfig::try_parse_from(["asamblea", "--base-url", "ftp://x", "ranking"]).unwrap();
        assert!(cli.load_app_config().is_err());
    }
}
