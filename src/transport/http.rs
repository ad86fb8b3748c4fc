//! HTTP implementation of the transport boundary.
//!
//! One instance holds one optional bearer token, so each logical caller
//! identity gets its own transport (and its own dispatcher on top of it).
//! Retry and timeout policy live here, not in the engine.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{EntityTransport, QueryOptions, TransportError};

/// Configuration for the HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Gateway base URL, e.g. `https://gw.example.com:44300`.
    pub base_url: String,
    /// Bearer token for this caller identity, if any.
    pub token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            token: None,
            timeout: Duration::from_secs(30),
        }
    }
}

pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpTransport {
    pub fn new(config: HttpTransportConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TransportError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token,
        })
    }

    fn collection_url(&self, base_path: &str, entity_set: &str) -> String {
        let base_path = base_path.trim_matches('/');
        format!("{}/{}/{}", self.base_url, base_path, entity_set)
    }

    fn entity_url(&self, base_path: &str, entity_set: &str, key_expression: &str) -> String {
        format!(
            "{}({})",
            self.collection_url(base_path, entity_set),
            key_expression
        )
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send, enforce status, and decode the JSON body (if one is expected).
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        expect_body: bool,
    ) -> Result<Value, TransportError> {
        let response = self
            .apply_auth(request)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or("error").to_string());
            return Err(TransportError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        if !expect_body {
            return Ok(Value::Null);
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| TransportError::Request(format!("invalid JSON response: {e}")))
    }
}

#[async_trait]
impl EntityTransport for HttpTransport {
    async fn fetch_entity_set(
        &self,
        base_path: &str,
        entity_set: &str,
        options: &QueryOptions,
    ) -> Result<Value, TransportError> {
        let url = self.collection_url(base_path, entity_set);
        let params = options.to_query_params();
        log::debug!("GET {url} ({} query option(s))", params.len());
        self.send(self.client.get(&url).query(&params), true).await
    }

    async fn fetch_entity(
        &self,
        base_path: &str,
        entity_set: &str,
        key_expression: &str,
    ) -> Result<Value, TransportError> {
        let url = self.entity_url(base_path, entity_set, key_expression);
        log::debug!("GET {url}");
        self.send(self.client.get(&url), true).await
    }

    async fn create_entity(
        &self,
        base_path: &str,
        entity_set: &str,
        payload: &Value,
    ) -> Result<Value, TransportError> {
        let url = self.collection_url(base_path, entity_set);
        log::debug!("POST {url}");
        self.send(self.client.post(&url).json(payload), true).await
    }

    async fn update_entity(
        &self,
        base_path: &str,
        entity_set: &str,
        key_expression: &str,
        payload: &Value,
    ) -> Result<Value, TransportError> {
        let url = self.entity_url(base_path, entity_set, key_expression);
        log::debug!("PATCH {url}");
        // PATCH semantics: only the supplied fields change. Some v2 gateways
        // answer 204 with no body; tolerate both.
        let response = self
            .apply_auth(self.client.patch(&url).json(payload))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or("error").to_string());
            return Err(TransportError::Upstream {
                status: status.as_u16(),
                message,
            });
        }
        let body = response.text().await.unwrap_or_default();
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body)
            .map_err(|e| TransportError::Request(format!("invalid JSON response: {e}")))
    }

    async fn delete_entity(
        &self,
        base_path: &str,
        entity_set: &str,
        key_expression: &str,
    ) -> Result<(), TransportError> {
        let url = self.entity_url(base_path, entity_set, key_expression);
        log::debug!("DELETE {url}");
        self.send(self.client.delete(&url), false).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> HttpTransport {
        HttpTransport::new(HttpTransportConfig {
            base_url: "https://gw.example.com/".to_string(),
            token: None,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_collection_url_normalizes_slashes() {
        let t = transport();
        assert_eq!(
            t.collection_url("/sap/opu/odata/sap/SALES_SRV/", "SalesOrderHeader"),
            "https://gw.example.com/sap/opu/odata/sap/SALES_SRV/SalesOrderHeader"
        );
    }

    #[test]
    fn test_entity_url_wraps_key_expression() {
        let t = transport();
        assert_eq!(
            t.entity_url("/odata/SALES_SRV", "SalesOrderHeader", "'1000'"),
            "https://gw.example.com/odata/SALES_SRV/SalesOrderHeader('1000')"
        );
    }
}
