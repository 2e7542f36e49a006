use async_trait::async_trait;
use serde::Deserialize;

use super::{ProviderError, Translator};
use crate::models::Language;

const PROVIDER: &str = "deepl";

/// DeepL REST API (`/v2/translate`).
pub struct DeepL {
    client: reqwest::Client,
    url: String,
    auth_key: String,
}

impl DeepL {
    pub fn new(client: reqwest::Client, url: &str, auth_key: String) -> Self {
        Self {
            client,
            url: url.to_string(),
            auth_key,
        }
    }
}

fn target_code(target: Language) -> &'static str {
    match target {
        Language::En => "EN",
        Language::De => "DE",
        Language::Zh => "ZH",
    }
}

#[derive(Deserialize)]
struct DeepLResponse {
    #[serde(default)]
    translations: Vec<DeepLTranslation>,
}

#[derive(Deserialize)]
struct DeepLTranslation {
    text: String,
}

#[async_trait]
impl Translator for DeepL {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn translate(&self, text: &str, target: Language) -> Result<String, ProviderError> {
        let resp = self
            .client
            .post(&self.url)
            .header("Authorization", format!("DeepL-Auth-Key {}", self.auth_key))
            .form(&[
                ("text", text),
                ("source_lang", "ZH"),
                ("target_lang", target_code(target)),
            ])
            .send()
            .await
            .map_err(ProviderError::transport(PROVIDER))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::status(PROVIDER, status, &body));
        }

        let parsed: DeepLResponse = resp.json().await.map_err(ProviderError::transport(PROVIDER))?;
        parsed
            .translations
            .into_iter()
            .next()
            .map(|t| t.text)
            .filter(|t| !t.trim().is_empty())
            .ok_or(ProviderError::EmptyResponse { provider: PROVIDER })
    }
}
