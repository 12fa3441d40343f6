use std::time::Duration;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{InsightsError, ModelAttempt, Result};

/// Candidate model identifiers, tried in order; the first that answers wins.
pub static DEFAULT_MODELS: Lazy<Vec<&'static str>> =
    Lazy::new(|| vec!["gemini-1.5-flash", "gemini-pro"]);

/// Environment variables consulted for credentials, in priority order.
pub const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// Pins a single model identifier, bypassing the candidate list.
pub const MODEL_OVERRIDE_VAR: &str = "ADMETRICS_MODEL";

const GENERATE_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A remote text-generation backend. The narrative layer only ever needs
/// prompt-in, prose-out.
pub trait TextModel {
    fn name(&self) -> &str;
    fn generate(&self, prompt: &str) -> Result<String>;
}

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
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    content: Content,
}

pub struct GeminiClient {
    http: reqwest::blocking::Client,
    api_key: String,
    models: Vec<String>,
}

impl GeminiClient {
    /// Resolve credentials and the model list from the environment. Key
    /// sources are tried in `API_KEY_VARS` order; `ADMETRICS_MODEL` replaces
    /// the default candidate list when set.
    pub fn from_env() -> Result<Self> {
        let api_key = API_KEY_VARS
            .iter()
            .find_map(|var| {
                std::env::var(var)
                    .ok()
                    .filter(|value| !value.trim().is_empty())
            })
            .ok_or(InsightsError::MissingCredentials)?;

        let models = match std::env::var(MODEL_OVERRIDE_VAR) {
            Ok(name) if !name.trim().is_empty() => vec![name.trim().to_string()],
            _ => DEFAULT_MODELS.iter().map(|name| name.to_string()).collect(),
        };

        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            api_key,
            models,
        })
    }

    fn generate_with(&self, model: &str, prompt: &str) -> Result<String> {
        let url = format!("{GENERATE_ENDPOINT}/{model}:generateContent");
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()?
            .error_for_status()?;

        let parsed: GenerateResponse = response.json()?;
        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| InsightsError::EmptyResponse {
                model: model.to_string(),
            })
    }
}

impl TextModel for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    fn generate(&self, prompt: &str) -> Result<String> {
        let mut attempts = Vec::new();
        for model in &self.models {
            match self.generate_with(model, prompt) {
                Ok(text) => return Ok(text),
                Err(err) => {
                    debug!(model = model.as_str(), error = %err, "candidate model failed");
                    attempts.push(ModelAttempt::new(model.clone(), err.to_string()));
                }
            }
        }
        Err(InsightsError::NoUsableModel { attempts })
    }
}
