pub mod chat_history;
pub mod chatbot;
pub mod saved_properties;
