use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::debug;

use super::{LedgerError, LedgerReader, ViewRequest};

/// [`LedgerReader`] backed by a fullnode REST API (`POST <node>/view`).
#[derive(Debug, Clone)]
pub struct HttpLedger {
    client: Client,
    view_url: Url,
}

impl HttpLedger {
    pub fn new(client: Client, node_url: &str) -> Result<Self, LedgerError> {
        Ok(Self {
            client,
            view_url: view_url(node_url)?,
        })
    }

    pub fn view_url(&self) -> &Url {
        &self.view_url
    }
}

/// `https://node/v1` and `https://node/v1/` both resolve to `https://node/v1/view`.
fn view_url(node_url: &str) -> Result<Url, LedgerError> {
    let base = Url::parse(&format!("{}/", node_url.trim_end_matches('/')))?;
    Ok(base.join("view")?)
}

#[async_trait]
impl LedgerReader for HttpLedger {
    async fn view(&self, request: &ViewRequest) -> Result<Value, LedgerError> {
        debug!(function = %request.function, "view request");
        let resp = self
            .client
            .post(self.view_url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(request)
            .send()
            .await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;
        let body: Value = match serde_json::from_slice(&bytes) {
            Ok(body) => body,
            // proxies answer errors with html pages
            Err(_) if !status.is_success() => return Err(LedgerError::Status(status.as_u16())),
            Err(e) => return Err(LedgerError::Decode(e)),
        };

        if let Some(code) = body.get("error_code") {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            return Err(LedgerError::Endpoint {
                code: code.as_str().map(str::to_string).unwrap_or_else(|| code.to_string()),
                message,
            });
        }
        if !status.is_success() {
            return Err(LedgerError::Status(status.as_u16()));
        }
        Ok(body)
    }
}
