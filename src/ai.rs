// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! AI-backed bucket name suggestion.
//!
//! Providers are plain name producers: they return candidate strings and
//! the generator's validation/dedup decides what actually gets scanned.
//!
//! Supported backends:
//! - OpenAI-compatible chat completions (covers OpenAI itself and any
//!   compatible endpoint via a base-URL override)
//! - Anthropic Claude messages API
//! - Google Gemini generateContent API
//! - Ollama (local, offline)

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_COMPLETION_TOKENS: u32 = 2000;

const OPENAI_DEFAULT_BASE: &str = "https://api.openai.com";
const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";
const ANTHROPIC_DEFAULT_BASE: &str = "https://api.anthropic.com";
const ANTHROPIC_DEFAULT_MODEL: &str = "claude-3-haiku-20240307";
const ANTHROPIC_API_VERSION: &str = "2023-06-01";
const GEMINI_DEFAULT_BASE: &str = "https://generativelanguage.googleapis.com";
const GEMINI_DEFAULT_MODEL: &str = "gemini-3-flash-preview";
const OLLAMA_DEFAULT_BASE: &str = "http://localhost:11434";
const OLLAMA_DEFAULT_MODEL: &str = "llama3";

/// Suggester configuration, filled from CLI flags / environment. An
/// empty model selects the provider's default.
#[derive(Debug, Clone)]
pub struct SuggesterConfig {
    pub provider: String,
    pub model: String,
    pub api_key: String,
    pub base_url: Option<String>,
    pub temperature: f64,
}

impl Default for SuggesterConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: String::new(),
            api_key: String::new(),
            base_url: None,
            temperature: 0.7,
        }
    }
}

impl SuggesterConfig {
    fn model_or(&self, default: &str) -> String {
        if self.model.is_empty() {
            default.to_string()
        } else {
            self.model.clone()
        }
    }

    fn base_or(&self, default: &str) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| default.to_string())
            .trim_end_matches('/')
            .to_string()
    }
}

/// A provider that can propose bucket names for a seed keyword.
#[async_trait]
pub trait Suggester: Send + Sync {
    /// Generates roughly `count` candidate names. `context_words` are
    /// tokens harvested from recon (subdomains) that hint at the
    /// target's naming habits.
    async fn suggest(
        &self,
        seed: &str,
        context_words: &[String],
        count: usize,
    ) -> Result<Vec<String>>;

    /// Provider identifier, e.g. "openai".
    fn name(&self) -> &str;

    /// Model in use.
    fn model(&self) -> &str;
}

impl std::fmt::Debug for dyn Suggester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Suggester")
            .field("name", &self.name())
            .field("model", &self.model())
            .finish()
    }
}

/// Builds a suggester for the configured provider.
pub fn new_suggester(config: &SuggesterConfig) -> Result<Box<dyn Suggester>> {
    match config.provider.as_str() {
        "openai" => Ok(Box::new(OpenAiSuggester::new(config)?)),
        "anthropic" => Ok(Box::new(AnthropicSuggester::new(config)?)),
        "gemini" => Ok(Box::new(GeminiSuggester::new(config)?)),
        "ollama" => Ok(Box::new(OllamaSuggester::new(config)?)),
        other => {
            bail!("unsupported AI provider '{other}' (supported: openai, anthropic, gemini, ollama)")
        }
    }
}

fn build_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("failed to build AI HTTP client")
}

fn build_prompt(seed: &str, context_words: &[String], count: usize) -> String {
    let context = if context_words.is_empty() {
        String::new()
    } else {
        format!(
            "\nDiscovered naming context for this target: {}\n",
            context_words.join(", ")
        )
    };

    format!(
        "You generate S3 bucket name candidates for authorized security research.\n\
         \n\
         Given the seed keyword \"{seed}\", generate {count} realistic S3 bucket names \
         an organization might use.{context}\n\
         Rules:\n\
         - Valid S3 bucket names only (lowercase, 3-63 chars, no underscores)\n\
         - Include variations: backups, logs, assets, internal, dev, prod, staging\n\
         - Mix patterns: seed-suffix, prefix-seed, seed-year, seed-region\n\
         - Think like a rushed sysadmin: predictable patterns, years, abbreviations\n\
         - NO explanations, just bucket names, one per line"
    )
}

/// Splits a model response into candidate names. Validation happens in
/// the generator; this only normalizes the obvious line noise.
fn parse_name_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.trim().trim_start_matches(['-', '*', ' ']).to_lowercase())
        .filter(|line| !line.is_empty() && !line.contains(' '))
        .collect()
}

// ---------------------------------------------------------------------------
// OpenAI-compatible backend
// ---------------------------------------------------------------------------

pub struct OpenAiSuggester {
    http: reqwest::Client,
    model: String,
    api_key: String,
    base_url: String,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

impl OpenAiSuggester {
    pub fn new(config: &SuggesterConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            bail!("openai provider requires an API key (--ai-key or OPENAI_API_KEY)");
        }

        Ok(Self {
            http: build_client()?,
            model: config.model_or(OPENAI_DEFAULT_MODEL),
            api_key: config.api_key.clone(),
            base_url: config.base_or(OPENAI_DEFAULT_BASE),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl Suggester for OpenAiSuggester {
    async fn suggest(
        &self,
        seed: &str,
        context_words: &[String],
        count: usize,
    ) -> Result<Vec<String>> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let body = json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [{
                "role": "user",
                "content": build_prompt(seed, context_words, count),
            }],
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("openai request failed")?;

        if !response.status().is_success() {
            bail!("openai returned status {}", response.status().as_u16());
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .context("failed to parse openai response")?;

        let content = parsed
            .choices
            .first()
            .map(|choice| choice.message.content.as_str())
            .unwrap_or_default();

        Ok(parse_name_lines(content))
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ---------------------------------------------------------------------------
// Anthropic Claude backend
// ---------------------------------------------------------------------------

pub struct AnthropicSuggester {
    http: reqwest::Client,
    model: String,
    api_key: String,
    base_url: String,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicContent>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl AnthropicSuggester {
    pub fn new(config: &SuggesterConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            bail!("anthropic provider requires an API key (--ai-key or ANTHROPIC_API_KEY)");
        }

        Ok(Self {
            http: build_client()?,
            model: config.model_or(ANTHROPIC_DEFAULT_MODEL),
            api_key: config.api_key.clone(),
            base_url: config.base_or(ANTHROPIC_DEFAULT_BASE),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl Suggester for AnthropicSuggester {
    async fn suggest(
        &self,
        seed: &str,
        context_words: &[String],
        count: usize,
    ) -> Result<Vec<String>> {
        let url = format!("{}/v1/messages", self.base_url);

        let body = json!({
            "model": self.model,
            "max_tokens": MAX_COMPLETION_TOKENS,
            "temperature": self.temperature,
            "messages": [{
                "role": "user",
                "content": build_prompt(seed, context_words, count),
            }],
        });

        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .json(&body)
            .send()
            .await
            .context("anthropic request failed")?;

        let parsed: AnthropicResponse = response
            .json()
            .await
            .context("failed to parse anthropic response")?;

        if let Some(error) = parsed.error {
            bail!("anthropic error: {}", error.message);
        }

        let text = parsed
            .content
            .iter()
            .find(|block| block.kind == "text")
            .map(|block| block.text.as_str())
            .unwrap_or_default();
        if text.is_empty() {
            bail!("no response from anthropic");
        }

        Ok(parse_name_lines(text))
    }

    fn name(&self) -> &str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ---------------------------------------------------------------------------
// Google Gemini backend
// ---------------------------------------------------------------------------

pub struct GeminiSuggester {
    http: reqwest::Client,
    model: String,
    api_key: String,
    base_url: String,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

impl GeminiSuggester {
    pub fn new(config: &SuggesterConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            bail!("gemini provider requires an API key (--ai-key or GEMINI_API_KEY)");
        }

        Ok(Self {
            http: build_client()?,
            model: config.model_or(GEMINI_DEFAULT_MODEL),
            api_key: config.api_key.clone(),
            base_url: config.base_or(GEMINI_DEFAULT_BASE),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl Suggester for GeminiSuggester {
    async fn suggest(
        &self,
        seed: &str,
        context_words: &[String],
        count: usize,
    ) -> Result<Vec<String>> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let body = json!({
            "contents": [{
                "parts": [{ "text": build_prompt(seed, context_words, count) }],
            }],
            "generationConfig": {
                "temperature": self.temperature,
                "maxOutputTokens": MAX_COMPLETION_TOKENS,
            },
        });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("gemini request failed")?;

        let parsed: GeminiResponse = response
            .json()
            .await
            .context("failed to parse gemini response")?;

        if let Some(error) = parsed.error {
            bail!("gemini error: {}", error.message);
        }

        let text = parsed
            .candidates
            .first()
            .and_then(|candidate| candidate.content.parts.first())
            .map(|part| part.text.as_str())
            .unwrap_or_default();
        if text.is_empty() {
            bail!("no response from gemini");
        }

        Ok(parse_name_lines(text))
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ---------------------------------------------------------------------------
// Ollama backend
// ---------------------------------------------------------------------------

pub struct OllamaSuggester {
    http: reqwest::Client,
    model: String,
    base_url: String,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

impl OllamaSuggester {
    pub fn new(config: &SuggesterConfig) -> Result<Self> {
        Ok(Self {
            http: build_client()?,
            model: config.model_or(OLLAMA_DEFAULT_MODEL),
            base_url: config.base_or(OLLAMA_DEFAULT_BASE),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl Suggester for OllamaSuggester {
    async fn suggest(
        &self,
        seed: &str,
        context_words: &[String],
        count: usize,
    ) -> Result<Vec<String>> {
        let url = format!("{}/api/generate", self.base_url);

        let body = json!({
            "model": self.model,
            "prompt": build_prompt(seed, context_words, count),
            "stream": false,
            "options": { "temperature": self.temperature },
        });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("ollama request failed")?;

        if !response.status().is_success() {
            bail!("ollama returned status {}", response.status().as_u16());
        }

        let parsed: OllamaResponse = response
            .json()
            .await
            .context("failed to parse ollama response")?;

        Ok(parse_name_lines(&parsed.response))
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
