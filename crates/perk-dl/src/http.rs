use ureq::{http::Response, Body};

use crate::{error::DownloadError, http_client::shared_agent};

pub struct Http;

impl Http {
    /// Issues a GET request through the shared agent.
    pub fn fetch(url: &str) -> Result<Response<Body>, DownloadError> {
        let resp = shared_agent().get(url).call().map_err(DownloadError::from)?;

        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(DownloadError::HttpError {
                status,
                url: url.to_string(),
            });
        }

        Ok(resp)
    }

    /// Fetches and deserializes a JSON document.
    ///
    /// Repository providers use this to pull their build indexes.
    pub fn json<T: serde::de::DeserializeOwned>(url: &str) -> Result<T, DownloadError> {
        Self::fetch(url)?
            .body_mut()
            .read_json()
            .map_err(|_| DownloadError::InvalidResponse)
    }
}
