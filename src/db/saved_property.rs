use diesel::prelude::*;
use diesel::result::Error;

use super::schema::saved_properties::{self, dsl::*};
use crate::models::saved_property::{InsertableSavedProperty, SavedProperty};

/// Saving the same property twice is a no-op.
pub fn insert(connection: &mut PgConnection, owner: &str, saved_id: i64) -> Result<usize, Error> {
    diesel::insert_into(saved_properties::table)
        .values(InsertableSavedProperty {
            user_id: owner,
            property_id: saved_id,
        })
        .on_conflict((user_id, property_id))
        .do_nothing()
        .execute(connection)
}

/// Saved property ids in the order they were saved.
pub fn get_for_user(connection: &mut PgConnection, owner: &str) -> Result<Vec<i64>, Error> {
    let rows: Vec<SavedProperty> = saved_properties
        .filter(user_id.eq(owner))
        .order(id.asc())
        .select(SavedProperty::as_select())
        .load(connection)?;

    Ok(rows.into_iter().map(|row| row.property_id).collect())
}

pub fn delete(connection: &mut PgConnection, owner: &str, saved_id: i64) -> Result<usize, Error> {
    diesel::delete(
        saved_properties
            .filter(user_id.eq(owner))
            .filter(property_id.eq(saved_id)),
    )
    .execute(connection)
}
