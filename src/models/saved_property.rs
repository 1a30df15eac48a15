use chrono::{DateTime, Utc};
use diesel::prelude::*;

#[derive(Debug, Queryable, Selectable, Clone)]
#[diesel(table_name = crate::db::schema::saved_properties)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SavedProperty {
    pub id: i32,
    pub user_id: String,
    pub property_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::db::schema::saved_properties)]
pub struct InsertableSavedProperty<'a> {
    pub user_id: &'a str,
    pub property_id: i64,
}
