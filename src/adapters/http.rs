use crate::domain::model::ServerInfo;
use crate::domain::ports::ServerProbe;
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// 以 `GET {url}api` 確認 server 是否可用（兩代 server 都不需驗證）
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    pub async fn server_version(&self, server: &ServerInfo) -> Result<Option<String>> {
        let endpoint = server.url.join("api")?;
        let response = self.client.get(endpoint).send().await?.error_for_status()?;
        let body: serde_json::Value = response.json().await?;
        Ok(body
            .get("version")
            .and_then(|v| v.as_str())
            .map(str::to_string))
    }
}

#[async_trait]
impl ServerProbe for HttpProbe {
    async fn is_responsive(&self, server: &ServerInfo) -> bool {
        match self.server_version(server).await {
            Ok(version) => {
                tracing::debug!(
                    "Server at {} answered (version {})",
                    server.url,
                    version.as_deref().unwrap_or("unknown")
                );
                true
            }
            Err(e) => {
                tracing::debug!("Probe of {} failed: {}", server.url, e);
                false
            }
        }
    }
}
