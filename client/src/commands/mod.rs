pub mod api;
pub mod chats;
pub mod interactions;
pub mod login;

use crate::config::Config;
use crate::Error;
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;
use url::Url;

/// HTTP client for the Labadain backend.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    config: Config,
}

impl Client {
    pub fn new(config: Config) -> Self {
        Client {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        self.config.endpoint(path)
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<Value>,
}

/// Lets 2xx responses through. Anything else becomes an error carrying the
/// body's `detail`, or `fallback` when there is none.
async fn check(res: Response, fallback: &str) -> Result<Response, Error> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|body| body.detail)
        .map(|detail| match detail {
            Value::String(detail) => detail,
            other => other.to_string(),
        })
        .unwrap_or_else(|| fallback.to_string());
    warn!(status = status.as_u16(), "Request failed: {detail}");
    if status == StatusCode::UNAUTHORIZED {
        Err(Error::Unauthorized(detail))
    } else {
        Err(Error::Api {
            status: status.as_u16(),
            detail,
        })
    }
}
