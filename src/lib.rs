pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::{CliConfig, Command};

pub use adapters::http::HttpVotingApi;
pub use app::cast::{cast_ballot, CastOutcome, CastRequest};
pub use config::AppConfig;
pub use domain::ports::{ConfigProvider, VotingApi};
pub use crate::core::{ballot::BallotValidator, ranking::Ranking, session::VotingSession};
pub use utils::error::{Result, VotingError};
