use crate::config::Settings;
use crate::domain::error::DomainError;
use crate::domain::ports::mapping_api::{MappingApi, MappingReply};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

/// OpenFIGI v3 `/mapping` client. Returns raw status and body; retry and
/// fallback policy live in the identifier resolver.
pub struct OpenFigiClient {
    client: Client,
    url: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MappingJob<'a> {
    id_type: &'a str,
    id_value: &'a str,
}

impl OpenFigiClient {
    pub fn new(settings: &Settings) -> Self {
        Self {
            client: Client::builder()
                .connect_timeout(settings.connect_timeout)
                .timeout(settings.request_timeout)
                .build()
                .unwrap_or_default(),
            url: settings.openfigi_url.clone(),
            api_key: settings.openfigi_api_key.clone(),
        }
    }
}

#[async_trait]
impl MappingApi for OpenFigiClient {
    async fn map_cusip(&self, cusip: &str) -> Result<MappingReply, DomainError> {
        let jobs = [MappingJob {
            id_type: "ID_CUSIP",
            id_value: cusip,
        }];
        let mut req = self.client.post(&self.url).json(&jobs);
        if let Some(key) = &self.api_key {
            req = req.header("X-OPENFIGI-APIKEY", key);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| DomainError::Network(format!("OpenFIGI request for {cusip}: {e}")))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| DomainError::Network(format!("OpenFIGI body for {cusip}: {e}")))?;
        Ok(MappingReply { status, body })
    }

    fn name(&self) -> &str {
        "openfigi"
    }
}
