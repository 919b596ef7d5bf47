//! IPFS HTTP API client
//!
//! Writes go through `/api/v0/add` with pinning; reads stream from
//! `/api/v0/cat` and abort as soon as the accumulated size passes the
//! cap, so an oversized object never buffers fully in memory.

use futures_util::StreamExt;
use std::time::Duration;
use url::Url;

use async_trait::async_trait;
use veridian_core::Cid;

use crate::{ContentStore, StoreError, DEFAULT_GET_TIMEOUT_SECS, DEFAULT_MAX_CONTENT_SIZE};

pub struct IpfsStore {
    http: reqwest::Client,
    base: Url,
    get_timeout: Duration,
    max_size: usize,
}

impl IpfsStore {
    pub fn new(base: Url) -> Self {
        Self::with_limits(
            base,
            Duration::from_secs(DEFAULT_GET_TIMEOUT_SECS),
            DEFAULT_MAX_CONTENT_SIZE,
        )
    }

    pub fn with_limits(base: Url, get_timeout: Duration, max_size: usize) -> Self {
        Self {
            http: reqwest::Client::new(),
            base,
            get_timeout,
            max_size,
        }
    }

    fn api_url(&self, path: &str) -> Result<Url, StoreError> {
        self.base
            .join(path)
            .map_err(|e| StoreError::Unavailable(format!("malformed IPFS API URL: {e}")))
    }

    async fn cat(&self, cid: &Cid) -> Result<Vec<u8>, StoreError> {
        let mut url = self.api_url("/api/v0/cat")?;
        url.query_pairs_mut().append_pair("arg", cid.as_str());

        let response = self.http.post(url).send().await?;
        if response.status().as_u16() == 404 {
            return Err(StoreError::NotFound(cid.to_string()));
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            // go-ipfs reports missing blocks as a 500 with an error body
            if body.contains("not found") || body.contains("no link named") {
                return Err(StoreError::NotFound(cid.to_string()));
            }
            return Err(StoreError::Unavailable(format!(
                "IPFS cat failed with {status}: {body}"
            )));
        }

        let mut stream = response.bytes_stream();
        let mut out: Vec<u8> = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if out.len() + chunk.len() > self.max_size {
                return Err(StoreError::TooLarge {
                    limit: self.max_size,
                });
            }
            out.extend_from_slice(&chunk);
        }
        Ok(out)
    }
}

#[async_trait]
impl ContentStore for IpfsStore {
    async fn put(&self, bytes: Vec<u8>, pin: bool) -> Result<Cid, StoreError> {
        let mut url = self.api_url("/api/v0/add")?;
        url.query_pairs_mut()
            .append_pair("pin", if pin { "true" } else { "false" })
            .append_pair("cid-version", "1");

        let part = reqwest::multipart::Part::bytes(bytes).file_name("blob");
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self.http.post(url).multipart(form).send().await?;
        if !response.status().is_success() {
            return Err(StoreError::Unavailable(format!(
                "IPFS add failed with {}",
                response.status()
            )));
        }
        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| StoreError::Unavailable(format!("malformed IPFS add response: {e}")))?;
        let hash = payload
            .get("Hash")
            .and_then(|v| v.as_str())
            .ok_or_else(|| StoreError::Unavailable("IPFS add response missing Hash".into()))?;

        tracing::debug!(cid = %hash, pinned = pin, "stored content");
        Ok(Cid::new(hash))
    }

    async fn get(&self, cid: &Cid) -> Result<Vec<u8>, StoreError> {
        let secs = self.get_timeout.as_secs();
        tokio::time::timeout(self.get_timeout, self.cat(cid))
            .await
            .map_err(|_| StoreError::Timeout(secs))?
    }
}
