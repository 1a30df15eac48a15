pub mod chat;
pub mod chat_record;
pub mod prediction;
pub mod property;
pub mod saved_property;
