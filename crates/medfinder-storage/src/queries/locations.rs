// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Last-known user locations.

use medfinder_core::{MedfinderError, UserLocation};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

pub async fn get(db: &Database, user: &str) -> Result<Option<UserLocation>, MedfinderError> {
    let user = user.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<UserLocation>, rusqlite::Error> {
            conn.query_row(
                "SELECT latitude, longitude FROM user_locations WHERE user_id = ?1",
                params![user],
                |row| {
                    Ok(UserLocation {
                        latitude: row.get(0)?,
                        longitude: row.get(1)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn put(db: &Database, user: &str, location: UserLocation) -> Result<(), MedfinderError> {
    let user = user.to_string();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO user_locations (user_id, latitude, longitude) VALUES (?1, ?2, ?3)
                 ON CONFLICT (user_id) DO UPDATE SET
                     latitude = excluded.latitude,
                     longitude = excluded.longitude,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![user, location.latitude, location.longitude],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
