use std::{future::Future, sync::Arc, time::Duration};

use chrono::Utc;
use log::{debug, warn};

use crate::{
    llm_client::{fallback_response, LanguageModel},
    models::{
        chat::{ChatMessage, ChatResponse, Preferences, SortIntent},
        property::{Property, PropertyResponse},
    },
    pricing::estimator::PricingEstimator,
    properties::{
        search::{SearchEngine, SearchQuery, SortOrder},
        store::PropertyStore,
    },
    services::chat_history::ChatHistory,
};

const CHAT_SEARCH_LIMIT: usize = 100;

const GREETING_WORDS: [&str; 15] = [
    "hi", "hello", "hey", "greetings", "hii", "hiii", "hiiii", "hiiiii", "hola", "namaste",
    "howdy", "sup", "yo", "greeting", "greet",
];

const PREDICTION_KEYWORDS: [&str; 14] = [
    "predict",
    "prediction",
    "estimate",
    "estimated",
    "ml",
    "machine learning",
    "ai price",
    "predicted price",
    "what is the price",
    "how much",
    "value",
    "worth",
    "appraisal",
    "evaluate",
];

const GREETING_RESPONSE: &str = "Hello! 👋 I'm your Real Estate AI assistant. \
I can help you find properties based on your preferences like location, price, bedrooms, and amenities. \
Try asking me something like 'Show me properties under $500,000' or 'Find 3 bedroom houses in San Francisco'.";

pub fn suggestions() -> Vec<String> {
    vec![
        "Try: 'Show me cheapest properties in San Francisco'".to_string(),
        "Ask: 'Find 3 bedroom houses under $500,000'".to_string(),
        "Say: 'I need a place with pool and garage'".to_string(),
        "Query: 'Most expensive properties available'".to_string(),
    ]
}

/// A message of at most three words containing a greeting word.
pub fn is_greeting(message: &str) -> bool {
    let cleaned: String = message
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    let words: Vec<&str> = cleaned.split_whitespace().collect();

    words.len() <= 3 && words.iter().any(|word| GREETING_WORDS.contains(word))
}

pub fn wants_prediction(message: &str) -> bool {
    let message = message.to_lowercase();
    PREDICTION_KEYWORDS
        .iter()
        .any(|keyword| message.contains(keyword))
}

/// Turns a chat message into a search, optional price predictions and a
/// narrated reply. Every language model step has a local fallback, so a
/// message always gets an answer.
pub struct ConversationPipeline {
    properties: Arc<PropertyStore>,
    search: SearchEngine,
    pricing: Arc<PricingEstimator>,
    llm: Option<Arc<dyn LanguageModel>>,
    history: Arc<ChatHistory>,
    llm_timeout: Duration,
}

impl ConversationPipeline {
    pub fn new(
        properties: Arc<PropertyStore>,
        search: SearchEngine,
        pricing: Arc<PricingEstimator>,
        llm: Option<Arc<dyn LanguageModel>>,
        history: Arc<ChatHistory>,
        llm_timeout: Duration,
    ) -> Self {
        ConversationPipeline {
            properties,
            search,
            pricing,
            llm,
            history,
            llm_timeout,
        }
    }

    pub async fn process_message(&self, message: &str, user_id: &str) -> ChatResponse {
        if is_greeting(message) {
            self.record(user_id, message, GREETING_RESPONSE, Vec::new())
                .await;
            return ChatResponse {
                message: GREETING_RESPONSE.to_string(),
                properties: Vec::new(),
                suggestions: suggestions(),
            };
        }

        let preferences = self.extract_preferences(message).await;
        let property_name = self
            .extract_property_name(message)
            .await
            .or_else(|| preferences.property_name.clone());
        debug!(
            "Chat preferences for {}: {:?}, property name: {:?}",
            user_id, preferences, property_name
        );

        let filter = preferences.to_filter();
        let (sort_by, sort_order) = match preferences.sort_intent() {
            Some(SortIntent::PriceAscending) => (Some("price"), SortOrder::Asc),
            Some(SortIntent::PriceDescending) => (Some("price"), SortOrder::Desc),
            None => (None, SortOrder::Asc),
        };

        let all = self.properties.all().await;
        let found = self.search.search(
            &all,
            &SearchQuery {
                text: property_name.as_deref(),
                filter: filter.as_ref(),
                sort_by,
                sort_order,
                limit: Some(CHAT_SEARCH_LIMIT),
            },
        );

        let properties = self.attach_predictions(message, &found);
        let reply = self.narrate(message, &found, &preferences).await;

        self.record(user_id, message, &reply, properties.clone())
            .await;

        ChatResponse {
            message: reply,
            properties,
            suggestions: suggestions(),
        }
    }

    fn attach_predictions(&self, message: &str, found: &[Property]) -> Vec<PropertyResponse> {
        let mut responses: Vec<PropertyResponse> =
            found.iter().map(PropertyResponse::from).collect();

        let wanted = wants_prediction(message) || (1..=3).contains(&found.len());
        if !wanted || !self.pricing.is_available() {
            return responses;
        }

        for (response, property) in responses.iter_mut().zip(found) {
            match self.pricing.predict_for_property(property) {
                Ok(prediction) => response.prediction = Some(prediction),
                Err(e) => warn!("Prediction error for property {}: {}", property.id, e),
            }
        }

        responses
    }

    async fn extract_preferences(&self, message: &str) -> Preferences {
        match &self.llm {
            Some(llm) => self
                .call_model("preference extraction", llm.extract_preferences(message))
                .await
                .unwrap_or_default(),
            None => Preferences::default(),
        }
    }

    async fn extract_property_name(&self, message: &str) -> Option<String> {
        let llm = self.llm.as_ref()?;
        self.call_model("property name extraction", llm.extract_property_name(message))
            .await
            .flatten()
    }

    async fn narrate(
        &self,
        message: &str,
        found: &[Property],
        preferences: &Preferences,
    ) -> String {
        let narrated = match &self.llm {
            Some(llm) => {
                self.call_model(
                    "response generation",
                    llm.generate_response(message, found, preferences),
                )
                .await
            }
            None => None,
        };

        narrated
            .filter(|reply| !reply.trim().is_empty())
            .unwrap_or_else(|| fallback_response(found))
    }

    async fn call_model<T>(
        &self,
        step: &str,
        call: impl Future<Output = anyhow::Result<T>>,
    ) -> Option<T> {
        match tokio::time::timeout(self.llm_timeout, call).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                warn!("Language model {} failed, using fallback: {:?}", step, e);
                None
            }
            Err(_) => {
                warn!(
                    "Language model {} timed out after {:?}, using fallback",
                    step, self.llm_timeout
                );
                None
            }
        }
    }

    async fn record(
        &self,
        user_id: &str,
        message: &str,
        reply: &str,
        properties: Vec<PropertyResponse>,
    ) {
        let now = Utc::now();
        let messages = [
            ChatMessage::user(now, message),
            ChatMessage::bot(now, reply, properties),
        ];
        self.history.append(user_id, &messages).await;
    }
}
