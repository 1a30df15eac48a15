use diesel::prelude::*;
use diesel::result::Error;

use super::schema::chat_messages::{self, dsl::*};
use crate::models::chat_record::{ChatMessageRecord, InsertableChatMessage};

pub fn insert(connection: &mut PgConnection, messages: &[InsertableChatMessage]) -> Result<usize, Error> {
    diesel::insert_into(chat_messages::table)
        .values(messages)
        .execute(connection)
}

pub fn get_for_user(
    connection: &mut PgConnection,
    owner: &str,
) -> Result<Vec<ChatMessageRecord>, Error> {
    chat_messages
        .filter(user_id.eq(owner))
        .order((timestamp.asc(), id.asc()))
        .select(ChatMessageRecord::as_select())
        .load(connection)
}

pub fn delete_for_user(connection: &mut PgConnection, owner: &str) -> Result<usize, Error> {
    diesel::delete(chat_messages.filter(user_id.eq(owner))).execute(connection)
}
