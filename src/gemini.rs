//! Gemini `generateContent` client with the Google Search grounding tool.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::data::CitationSource;
use crate::error::FetchError;

/// Raw answer from the AI backend: the model's text plus any citations it
/// attached through grounding metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackendReply {
    pub text: String,
    pub grounding: Vec<CitationSource>,
}

/// Seam between the fetcher and the network, so the fetch pipeline can be
/// driven without an HTTP backend.
#[async_trait::async_trait]
pub trait DisruptionBackend: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<BackendReply, FetchError>;
}

pub struct GeminiClient {
    api_key: Option<String>,
    model: String,
    endpoint: String,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>, model: String, endpoint: String) -> Self {
        Self {
            api_key,
            model,
            endpoint,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.api_key().map(str::to_string),
            config.model.clone(),
            config.endpoint.clone(),
        )
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            urlencoding::encode(&self.model)
        )
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    tools: Vec<RequestTool>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct RequestTool {
    google_search: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Deserialize, Default)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Default)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Deserialize, Default)]
struct GroundingChunk {
    web: Option<WebChunk>,
}

#[derive(Deserialize, Default)]
struct WebChunk {
    uri: Option<String>,
    title: Option<String>,
}

#[derive(Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

#[derive(Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

#[async_trait::async_trait]
impl DisruptionBackend for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<BackendReply, FetchError> {
        let api_key = self.api_key.as_deref().ok_or(FetchError::MissingApiKey)?;

        let request = GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            tools: vec![RequestTool {
                google_search: serde_json::Map::new(),
            }],
        };

        log::info!("Requesting disruptions from {} ({})", self.url(), self.model);

        let resp = self
            .client
            .post(self.url())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|err| err.error.message)
                .unwrap_or_else(|_| body.chars().take(200).collect());
            return Err(FetchError::Status {
                status: status.as_u16(),
                message,
            });
        }

        parse_reply(&body)
    }
}

fn parse_reply(body: &str) -> Result<BackendReply, FetchError> {
    let response: GenerateResponse = serde_json::from_str(body)?;

    let Some(candidate) = response.candidates.into_iter().next() else {
        log::warn!("Backend response had no candidates");
        return Ok(BackendReply::default());
    };

    let text = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .unwrap_or_default();

    // Only chunks carrying both a URI and a title are usable citations.
    let grounding = candidate
        .grounding_metadata
        .map(|meta| {
            meta.grounding_chunks
                .into_iter()
                .filter_map(|chunk| chunk.web)
                .filter_map(|web| match (web.uri, web.title) {
                    (Some(uri), Some(title)) if !uri.is_empty() && !title.is_empty() => {
                        Some(CitationSource { title, uri })
                    }
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(BackendReply { text, grounding })
}
