// src/commentary/gemini.rs
use crate::commentary::{CommentaryProvider, CommentaryRequest};
use crate::error::{BotError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

/// Two-sentence market read via Gemini `generateContent`.
pub struct GeminiCommentator {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

impl GeminiCommentator {
    pub fn new(api_key: String, model: String) -> Result<Self> {
        Self::with_base_url(api_key, model, GEMINI_API_URL.to_string())
    }

    pub fn with_base_url(api_key: String, model: String, base_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| BotError::Configuration(format!("http client: {}", e)))?;
        Ok(Self {
            api_key,
            model,
            base_url,
            client,
        })
    }

    fn create_prompt(request: &CommentaryRequest) -> String {
        let ind = &request.indicators;
        format!(
            "You are a crypto trading assistant. My bot just opened a LONG position on {}.\n\
             Current price: {}\n\
             EMA 200: {:.4}\n\
             RSI 14: {:.2}\n\
             MACD: {:.4} (signal {:.4})\n\
             Give a very short market read (two sentences at most) based on these indicators.",
            request.symbol, request.price, ind.ema_long, ind.rsi, ind.macd.macd, ind.macd.signal
        )
    }
}

#[async_trait]
impl CommentaryProvider for GeminiCommentator {
    async fn comment(&self, request: &CommentaryRequest) -> Result<String> {
        let url = format!("{}/{}:generateContent", self.base_url, self.model);
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Self::create_prompt(request),
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BotError::Network(format!("Gemini API error {}: {}", status, body)));
        }

        let parsed: GenerateResponse = response.json().await?;
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        Ok(text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IndicatorSnapshot, MacdPoint};
    use mockito::Server;
    use rust_decimal::Decimal;

    fn request() -> CommentaryRequest {
        CommentaryRequest {
            symbol: "BNBUSDT".into(),
            price: Decimal::from(600),
            indicators: IndicatorSnapshot {
                ema_long: 580.0,
                rsi: 55.0,
                bollinger_upper: 620.0,
                macd: MacdPoint {
                    macd: 0.3,
                    signal: 0.1,
                },
                prev_macd: MacdPoint {
                    macd: -0.1,
                    signal: 0.0,
                },
            },
        }
    }

    #[tokio::test]
    async fn test_comment_joins_parts() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/gemini-2.5-flash:generateContent")
            .match_header("x-goog-api-key", "g-key")
            .with_status(200)
            .with_body(
                r#"{"candidates":[{"content":{"parts":[{"text":"Uptrend intact. "},{"text":"Momentum improving.\n"}]}}]}"#,
            )
            .create_async()
            .await;

        let commentator =
            GeminiCommentator::with_base_url("g-key".into(), "gemini-2.5-flash".into(), server.url())
                .unwrap();
        let text = commentator.comment(&request()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(text, "Uptrend intact. Momentum improving.");
    }

    #[tokio::test]
    async fn test_api_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/gemini-2.5-flash:generateContent")
            .with_status(429)
            .with_body("quota")
            .create_async()
            .await;

        let commentator =
            GeminiCommentator::with_base_url("g-key".into(), "gemini-2.5-flash".into(), server.url())
                .unwrap();
        assert!(matches!(
            commentator.comment(&request()).await,
            Err(BotError::Network(_))
        ));
    }

    #[test]
    fn test_prompt_mentions_indicators() {
        let prompt = GeminiCommentator::create_prompt(&request());
        assert!(prompt.contains("BNBUSDT"));
        assert!(prompt.contains("RSI 14: 55.00"));
    }
}
