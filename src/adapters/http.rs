use crate::core::{Ballot, ConfigProvider, RankingRecord, Result, VotingApi};
use crate::utils::error::VotingError;
use reqwest::Client;
use std::time::Duration;

/// `VotingApi` over HTTP against the assembly voting backend.
#[derive(Debug, Clone)]
pub struct HttpVotingApi {
    base_url: String,
    client: Client,
}

impl HttpVotingApi {
    pub fn new<C: ConfigProvider>(config: &C) -> Result<Self> {
        let mut builder = Client::builder();
        // 未設定時沿用 reqwest 預設值
        if let Some(timeout) = config.timeout_seconds() {
            builder = builder.timeout(Duration::from_secs(timeout));
        }

        Ok(Self {
            base_url: config.base_url().trim_end_matches('/').to_string(),
            client: builder.build()?,
        })
    }

    pub fn ranking_url(&self) -> String {
        format!("{}/ranking/", self.base_url)
    }

    pub fn register_url(&self) -> String {
        format!("{}/registrar-voto", self.base_url)
    }
}

#[async_trait::async_trait]
impl VotingApi for HttpVotingApi {
    async fn fetch_ranking(&self) -> Result<Vec<RankingRecord>> {
        let url = self.ranking_url();
        tracing::debug!("📡 Requesting ranking from: {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        tracing::debug!("📡 Ranking response status: {}", status);

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::error!("❌ Ranking request failed with status: {}", status);
            return Err(VotingError::RetrievalError {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let records: Vec<RankingRecord> = serde_json::from_str(&body)?;
        tracing::info!("📡 Fetched {} ranking records", records.len());
        Ok(records)
    }

    async fn register_ballot(&self, ballot: &Ballot) -> Result<()> {
        let url = self.register_url();
        tracing::debug!("📡 Registering ballot for voter {} at: {}", ballot.voter_id, url);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .body(serde_json::to_vec(ballot)?)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("❌ Could not reach voting API: {}", e);
                VotingError::TransportError(e)
            })?;

        let status = response.status();
        tracing::debug!("📡 Register response status: {}", status);

        if status.is_success() {
            return Ok(());
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("⚠️ Could not read error body: {}", e);
                String::new()
            }
        };
        tracing::error!("❌ Ballot rejected with status {}: {}", status, body);
        Err(VotingError::SubmissionError {
            status: status.as_u16(),
            body,
        })
    }
}
