//! Gemini `generateContent` client.

use std::time::Duration;

use rand::Rng;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{Oracle, EMPTY_QUOTE, FALLBACK_QUOTE};
use crate::error::ProviderError;
use crate::fortune::{FortuneRecord, Luck};
use crate::storage::OracleConfig;

const QUOTE_PROMPT: &str = "Generate a very short, profound Zen Buddhist-style quote or blessing \
in Chinese (Simplified). Maximum 20 characters. Do not include quotes or explanations. Just the text.";

pub struct GeminiOracle {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiOracle {
    pub fn new(config: &OracleConfig, api_key: String) -> Result<Self, ProviderError> {
        if api_key.trim().is_empty() {
            return Err(ProviderError::MissingApiKey);
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    /// POST one prompt and return the first candidate's text, trimmed.
    async fn generate(&self, body: Value) -> Result<String, ProviderError> {
        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = resp.json().await?;
        let text = parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .find_map(|p| p.text)
            .map(|t| t.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(text)
    }

    async fn try_fortune(&self, fortune_id: u32) -> Result<FortuneRecord, ProviderError> {
        let text = self.generate(fortune_request(fortune_id)).await?;
        FortuneRecord::parse_provider_json(&text)
    }
}

fn quote_request() -> Value {
    json!({
        "contents": [{ "parts": [{ "text": QUOTE_PROMPT }] }],
        "generationConfig": {
            "temperature": 0.9,
            "thinkingConfig": { "thinkingBudget": 0 }
        }
    })
}

fn fortune_prompt(fortune_id: u32) -> String {
    let tiers: Vec<&str> = Luck::ALL.iter().map(|l| l.label()).collect();
    format!(
        "Create a traditional Buddhist fortune stick (Omikuji) result in the style of \
         Asakusa Senso-ji Temple. It should be poetic, mysterious, and Zen-like.\n\
         1. Luck: randomly assign a luck status from this list: [{tiers}].\n\
         2. Poem: write a 4-line classical Chinese poem (5 or 7 characters per line) \
         that reflects the luck.\n\
         3. Explanation: a brief, warm, and wise interpretation in Simplified Chinese.\n\
         The Fortune ID is {fortune_id}.\n\
         Return a JSON object with: id (the integer {fortune_id}), luck (the luck string), \
         poem (an array of 4 strings), explanation (the interpretation string).",
        tiers = tiers.join(", "),
    )
}

fn fortune_request(fortune_id: u32) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": fortune_prompt(fortune_id) }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "id": { "type": "INTEGER" },
                    "luck": { "type": "STRING" },
                    "poem": { "type": "ARRAY", "items": { "type": "STRING" } },
                    "explanation": { "type": "STRING" }
                },
                "required": ["id", "luck", "poem", "explanation"]
            }
        }
    })
}

impl Oracle for GeminiOracle {
    async fn short_quote(&self) -> String {
        match self.generate(quote_request()).await {
            Ok(text) => text,
            Err(ProviderError::EmptyResponse) => EMPTY_QUOTE.to_string(),
            Err(e) => {
                warn!(error = %e, "quote request failed");
                FALLBACK_QUOTE.to_string()
            }
        }
    }

    async fn fortune(&self) -> FortuneRecord {
        let fortune_id = rand::thread_rng().gen_range(1..=100u32);
        debug!(fortune_id, model = %self.model, "requesting fortune");
        match self.try_fortune(fortune_id).await {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "fortune request failed, using fallback");
                FortuneRecord::fallback()
            }
        }
    }
}
