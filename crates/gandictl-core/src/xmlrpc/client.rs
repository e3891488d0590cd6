//! HTTP transport for XML-RPC calls

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use super::codec::{decode_response, encode_call};
use super::error::{Result, RpcError};
use super::value::{Value, from_value};

/// User agent string for gandictl XML-RPC requests
const GANDICTL_USER_AGENT: &str = concat!("gandictl/", env!("CARGO_PKG_VERSION"));

/// Per-request timeout; operation waits poll with many short requests
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Longest response body kept in [`RpcError::Http`]
const MAX_ERROR_BODY: usize = 512;

/// XML-RPC client bound to a single endpoint
#[derive(Debug, Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl RpcClient {
    /// Create a client for the given endpoint URL
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| RpcError::InvalidEndpoint {
            url: endpoint.to_string(),
            message: e.to_string(),
        })?;
        let http = reqwest::Client::builder()
            .user_agent(GANDICTL_USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Invoke `method` with positional parameters and return the raw result
    pub async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        debug!(method, endpoint = %self.endpoint, "XML-RPC call");
        let body = encode_call(method, &params);

        let response = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "text/xml")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        trace!(method, %status, bytes = text.len(), "XML-RPC response received");

        if !status.is_success() {
            let mut body = text;
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(RpcError::Http {
                status: status.as_u16(),
                body,
            });
        }

        decode_response(&text)
    }

    /// Invoke `method` and decode the result into `T`
    pub async fn call_as<T: DeserializeOwned>(&self, method: &str, params: Vec<Value>) -> Result<T> {
        from_value(self.call(method, params).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_invalid_url() {
        let err = RpcClient::new("not a url").unwrap_err();
        assert!(matches!(err, RpcError::InvalidEndpoint { .. }));
    }

    #[test]
    fn test_new_keeps_endpoint() {
        let client = RpcClient::new("https://rpc.gandi.net/xmlrpc/").unwrap();
        assert_eq!(client.endpoint().as_str(), "https://rpc.gandi.net/xmlrpc/");
    }
}
