//! HTTP peer client on `reqwest`.

use async_trait::async_trait;
use reqwest::{Client, Response};
use shared_types::{Block, RulesEnvelope};

use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::ports::{BlocksQuery, PeerClient};

/// Speaks the peer protocol over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPeerClient {
    client: Client,
}

impl HttpPeerClient {
    /// Build a client with the configured timeouts.
    pub fn new(config: &SyncConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| SyncError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

fn endpoint(url: &str, path: &str) -> String {
    format!("{}/{}", url.trim_end_matches('/'), path)
}

fn unreachable(url: &str, error: reqwest::Error) -> SyncError {
    SyncError::PeerUnreachable {
        url: url.to_string(),
        reason: error.to_string(),
    }
}

fn check_status(url: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(SyncError::Rejected {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}

#[async_trait]
impl PeerClient for HttpPeerClient {
    async fn get_rules(&self, url: &str) -> Result<RulesEnvelope> {
        let response = self
            .client
            .get(endpoint(url, "rules"))
            .send()
            .await
            .map_err(|e| unreachable(url, e))?;
        check_status(url, response)?
            .json::<RulesEnvelope>()
            .await
            .map_err(|e| SyncError::Parse {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }

    async fn get_blocks(&self, url: &str, query: &BlocksQuery) -> Result<Vec<Block>> {
        let response = self
            .client
            .get(endpoint(url, "blocks"))
            .query(query)
            .send()
            .await
            .map_err(|e| unreachable(url, e))?;
        check_status(url, response)?
            .json::<Vec<Block>>()
            .await
            .map_err(|e| SyncError::Parse {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }

    async fn post_block(&self, url: &str, block: &Block) -> Result<()> {
        let response = self
            .client
            .post(endpoint(url, "blocks"))
            .header("cache-control", "no-cache")
            .json(block)
            .send()
            .await
            .map_err(|e| unreachable(url, e))?;
        check_status(url, response)?;
        Ok(())
    }
}
