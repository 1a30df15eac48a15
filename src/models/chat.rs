use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::property::{PropertyFilter, PropertyResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    User,
    Bot,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::User => "user",
            MessageKind::Bot => "bot",
        }
    }

    pub fn from_name(name: &str) -> Option<MessageKind> {
        match name {
            "user" => Some(MessageKind::User),
            "bot" => Some(MessageKind::Bot),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub text: String,
    pub timestamp: String,
    #[serde(default)]
    pub properties: Vec<PropertyResponse>,
    #[serde(rename = "isError", default)]
    pub is_error: bool,
}

impl ChatMessage {
    /// Ids are millisecond timestamps; callers offset the bot reply by one so
    /// the pair keeps its order when both land in the same millisecond.
    pub fn user(sent_at: DateTime<Utc>, text: &str) -> Self {
        ChatMessage {
            id: sent_at.timestamp_millis().to_string(),
            kind: MessageKind::User,
            text: text.to_string(),
            timestamp: sent_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            properties: Vec::new(),
            is_error: false,
        }
    }

    pub fn bot(sent_at: DateTime<Utc>, text: &str, properties: Vec<PropertyResponse>) -> Self {
        ChatMessage {
            id: (sent_at.timestamp_millis() + 1).to_string(),
            kind: MessageKind::Bot,
            text: text.to_string(),
            timestamp: sent_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            properties,
            is_error: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub user_id: Option<String>,
    // Accepted for compatibility with existing clients, not used for search
    #[serde(default)]
    pub preferences: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub message: String,
    pub properties: Vec<PropertyResponse>,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatHistoryResponse {
    pub messages: Vec<ChatMessage>,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortIntent {
    PriceAscending,
    PriceDescending,
}

/// Search preferences extracted from a chat message by the language model.
///
/// Model output is loosely typed, so numbers may arrive as strings and
/// amenities as a single string. Anything that does not parse is dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_count", skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u32>,
    #[serde(default, deserialize_with = "lenient_count", skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<u32>,
    #[serde(default, deserialize_with = "lenient_tags", skip_serializing_if = "Option::is_none")]
    pub amenities: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub property_name: Option<String>,
}

impl Preferences {
    pub fn sort_intent(&self) -> Option<SortIntent> {
        match self.sort_by.as_deref() {
            Some("price_asc") => Some(SortIntent::PriceAscending),
            Some("price_desc") => Some(SortIntent::PriceDescending),
            _ => None,
        }
    }

    /// Only present, non-zero and non-empty preferences become constraints.
    /// Returns `None` when nothing carries over.
    pub fn to_filter(&self) -> Option<PropertyFilter> {
        let filter = PropertyFilter {
            location: self.location.clone().filter(|l| !l.is_empty()),
            min_price: self.min_price.filter(|p| *p != 0.0),
            max_price: self.max_price.filter(|p| *p != 0.0),
            bedrooms: self.bedrooms.filter(|b| *b != 0),
            bathrooms: self.bathrooms.filter(|b| *b != 0),
            min_size: None,
            amenities: self.amenities.clone().filter(|a| !a.is_empty()),
        };

        if filter == PropertyFilter::default() {
            None
        } else {
            Some(filter)
        }
    }
}

fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(num) => num.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    })
}

fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    Ok(lenient_number(deserializer)?
        .filter(|n| n.is_finite() && *n >= 0.0 && n.fract() == 0.0)
        .filter(|n| *n <= f64::from(u32::MAX))
        .map(|n| n as u32))
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    })
}

fn lenient_tags<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<String>>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
        ),
        Value::String(s) => Some(vec![s]),
        _ => None,
    })
}
