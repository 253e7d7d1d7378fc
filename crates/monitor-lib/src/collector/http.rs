//! HTTP endpoint probing with reqwest

use super::{async_trait, HttpProber};
use crate::error::ProbeFailure;
use reqwest::Client;
use std::time::Duration;

/// HTTP prober backed by a shared reqwest client
#[derive(Debug, Clone, Default)]
pub struct ReqwestHttpProber {
    client: Client,
}

impl ReqwestHttpProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpProber for ReqwestHttpProber {
    async fn get_status(&self, url: &str, timeout: Duration) -> Result<u16, ProbeFailure> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| ProbeFailure::from_reqwest(e, timeout))?;

        Ok(response.status().as_u16())
    }
}
