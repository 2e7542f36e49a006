use async_trait::async_trait;
use md5::{Digest, Md5};
use serde::Deserialize;

use super::{ProviderError, Translator};
use crate::models::Language;

const PROVIDER: &str = "baidu";

/// Baidu Translate general text API.
///
/// Requests are signed with `md5(appid + q + salt + secret)`.
pub struct Baidu {
    client: reqwest::Client,
    url: String,
    app_id: String,
    secret: String,
}

impl Baidu {
    pub fn new(client: reqwest::Client, url: &str, app_id: String, secret: String) -> Self {
        Self {
            client,
            url: url.to_string(),
            app_id,
            secret,
        }
    }
}

pub(crate) fn sign(app_id: &str, query: &str, salt: &str, secret: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(app_id.as_bytes());
    hasher.update(query.as_bytes());
    hasher.update(salt.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Deserialize)]
struct BaiduResponse {
    #[serde(default)]
    error_code: Option<serde_json::Value>,
    #[serde(default)]
    error_msg: Option<String>,
    #[serde(default)]
    trans_result: Vec<BaiduSegment>,
}

#[derive(Deserialize)]
struct BaiduSegment {
    dst: String,
}

fn code_string(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl Translator for Baidu {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn translate(&self, text: &str, target: Language) -> Result<String, ProviderError> {
        let salt = chrono::Utc::now().timestamp_millis().to_string();
        let sign = sign(&self.app_id, text, &salt, &self.secret);

        let resp = self
            .client
            .get(&self.url)
            .query(&[
                ("q", text),
                ("from", "zh"),
                ("to", target.code()),
                ("appid", self.app_id.as_str()),
                ("salt", salt.as_str()),
                ("sign", sign.as_str()),
            ])
            .send()
            .await
            .map_err(ProviderError::transport(PROVIDER))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::status(PROVIDER, status, &body));
        }

        let parsed: BaiduResponse = resp.json().await.map_err(ProviderError::transport(PROVIDER))?;
        if let Some(code) = parsed.error_code.as_ref().map(code_string) {
            // "52000" is the documented success code
            if code != "52000" {
                return Err(ProviderError::Remote {
                    provider: PROVIDER,
                    code,
                    message: parsed.error_msg.unwrap_or_default(),
                });
            }
        }

        let joined = parsed
            .trans_result
            .into_iter()
            .map(|s| s.dst)
            .collect::<Vec<_>>()
            .join("\n");
        if joined.trim().is_empty() {
            return Err(ProviderError::EmptyResponse { provider: PROVIDER });
        }
        Ok(joined)
    }
}
