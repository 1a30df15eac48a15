use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    models::{chat::Preferences, property::Property},
};

const PREFERENCES_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that extracts property search preferences. Always return valid JSON only.";
const PROPERTY_NAME_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that extracts property names from user messages. Return only the property name or null.";
const RESPONSE_SYSTEM_PROMPT: &str =
    "You are a friendly, helpful real estate assistant. Be conversational and natural.";

/// Capability the chat pipeline needs from a language model.
///
/// Implementations report failures as errors; the pipeline owns the
/// timeouts and the fallbacks.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn extract_preferences(&self, message: &str) -> Result<Preferences>;

    /// `Ok(None)` when the message does not name a specific property.
    async fn extract_property_name(&self, message: &str) -> Result<Option<String>>;

    async fn generate_response(
        &self,
        message: &str,
        properties: &[Property],
        preferences: &Preferences,
    ) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Client for any OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiClient {
    api_key: String,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(api_key: &str, base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for language model")?;

        Ok(OpenAiClient {
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
        })
    }

    /// `None` when no API key is configured or the client cannot be built.
    pub fn from_config(config: &Config) -> Option<Self> {
        let Some(api_key) = config.openai_api_key.as_deref() else {
            warn!("OpenAI API key not found. LLM features disabled.");
            return None;
        };

        match OpenAiClient::new(
            api_key,
            &config.llm_base_url,
            &config.llm_model,
            Duration::from_secs(config.llm_timeout_seconds),
        ) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("Failed to initialize language model client: {:?}", e);
                None
            }
        }
    }

    async fn complete(
        &self,
        system_prompt: &str,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let payload = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ApiMessage {
                    role: "system",
                    content: system_prompt,
                },
                ApiMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature,
            max_tokens,
        };

        debug!("Sending completion request to {} ({})", url, self.model);

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .context("Failed to reach language model service")?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(anyhow!("Language model rejected the API key (401)"));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "Language model responded with error {}: {}",
                status,
                body
            ));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .context("Failed to deserialize language model response")?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| anyhow!("Language model returned no content"))
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn extract_preferences(&self, message: &str) -> Result<Preferences> {
        let content = self
            .complete(
                PREFERENCES_SYSTEM_PROMPT,
                &preferences_prompt(message),
                0.3,
                200,
            )
            .await?;
        parse_preferences(&content)
    }

    async fn extract_property_name(&self, message: &str) -> Result<Option<String>> {
        let content = self
            .complete(
                PROPERTY_NAME_SYSTEM_PROMPT,
                &property_name_prompt(message),
                0.3,
                50,
            )
            .await?;
        Ok(parse_property_name(&content))
    }

    async fn generate_response(
        &self,
        message: &str,
        properties: &[Property],
        preferences: &Preferences,
    ) -> Result<String> {
        self.complete(
            RESPONSE_SYSTEM_PROMPT,
            &response_prompt(message, properties, preferences),
            0.7,
            300,
        )
        .await
    }
}

fn preferences_prompt(message: &str) -> String {
    format!(
        r#"Extract property search preferences from this user message. Return ONLY a valid JSON object with these fields:
- location: string or null (city name if mentioned)
- max_price: number or null (maximum budget if mentioned)
- min_price: number or null (minimum budget if mentioned)
- bedrooms: number or null (number of bedrooms if mentioned)
- bathrooms: number or null (number of bathrooms if mentioned)
- amenities: array of strings or null (amenities like pool, garage, gym, etc.)
- sort_by: string or null ("price_asc" for cheapest/lowest, "price_desc" for most expensive/highest, or null)
- property_name: string or null (specific property title/name if user is asking about a particular property)

User message: "{message}"

Return ONLY the JSON object, no other text:"#
    )
}

fn property_name_prompt(message: &str) -> String {
    format!(
        r#"Extract the specific property name or title that the user is asking about from this message.
If the user is asking about a specific property, return ONLY the property name/title as a string.
If no specific property is mentioned, return null.

Examples:
- "show me Luxury Condo" -> "Luxury Condo"
- "yes i want more details of Penthouse with Panoramic Views" -> "Penthouse with Panoramic Views"
- "show me properties under 500k" -> null
- "find 3 bedroom houses" -> null

User message: "{message}"

Return ONLY the property name as a string, or null if no specific property is mentioned. No other text:"#
    )
}

fn response_prompt(message: &str, properties: &[Property], preferences: &Preferences) -> String {
    let preferences_json =
        serde_json::to_string_pretty(preferences).unwrap_or_else(|_| "{}".to_string());

    format!(
        r#"You are a friendly real estate assistant chatbot. Generate a natural, conversational response to the user.

User's query: "{message}"

User's preferences detected: {preferences_json}

Properties found ({count}):
{summary}

Generate a friendly, helpful response that:
1. Acknowledges what the user is looking for
2. Mentions the properties found (if any)
3. Provides helpful information about prices, locations, or features
4. Is conversational and natural, like talking to a helpful agent
5. Keep it concise (2-3 sentences max)

Response:"#,
        count = properties.len(),
        summary = summarize_properties(properties),
    )
}

/// One line per property, at most five.
pub fn summarize_properties(properties: &[Property]) -> String {
    if properties.is_empty() {
        return "No properties found.".to_string();
    }

    properties
        .iter()
        .take(5)
        .map(|p| {
            format!(
                "- {} in {}: ${}, {} bed, {} bath",
                p.title,
                p.location,
                format_price(p.price),
                p.bedrooms.unwrap_or_default(),
                p.bathrooms.unwrap_or_default()
            )
        })
        .collect::<Vec<String>>()
        .join("\n")
}

/// Reply used whenever the model cannot narrate.
pub fn fallback_response(properties: &[Property]) -> String {
    let cheapest = properties
        .iter()
        .min_by(|a, b| a.price.total_cmp(&b.price));

    match cheapest {
        None => "I couldn't find properties matching your criteria. Try adjusting your search parameters.".to_string(),
        Some(cheapest) => format!(
            "I found {} properties for you. The most affordable option is {} at ${}.",
            properties.len(),
            cheapest.title,
            format_price(cheapest.price)
        ),
    }
}

/// Whole dollars with thousands separators, e.g. `450,000`.
pub fn format_price(price: f64) -> String {
    let rounded = price.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    if rounded < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

fn strip_code_fence(content: &str) -> &str {
    lazy_static! {
        static ref CODE_FENCE_REGEX: Regex =
            Regex::new(r"(?s)^\s*```(?:json)?\s*(.*?)\s*```").unwrap();
    }

    CODE_FENCE_REGEX
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or_else(|| content.trim())
}

pub fn parse_preferences(content: &str) -> Result<Preferences> {
    serde_json::from_str(strip_code_fence(content))
        .with_context(|| format!("Language model returned invalid preferences: {content}"))
}

pub fn parse_property_name(content: &str) -> Option<String> {
    let name = content.trim().trim_matches(|c| c == '"' || c == '\'').trim();

    match name.to_lowercase().as_str() {
        "" | "null" | "none" => None,
        _ => Some(name.to_string()),
    }
}
