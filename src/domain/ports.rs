use crate::domain::model::{Ballot, RankingRecord};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn timeout_seconds(&self) -> Option<u64>;
}

/// The external voting backend.
#[async_trait]
pub trait VotingApi: Send + Sync {
    async fn fetch_ranking(&self) -> Result<Vec<RankingRecord>>;
    async fn register_ballot(&self, ballot: &Ballot) -> Result<()>;
}
