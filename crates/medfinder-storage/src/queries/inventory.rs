// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inventory-side writes: branch and medicine upserts and stock adjustments.
//!
//! The pipeline itself only reads the catalog. These helpers back the CSV
//! import command and test fixtures.

use medfinder_core::MedfinderError;
use rusqlite::{Connection, params};

use crate::database::{Database, map_tr_err};
use crate::models::{NewBranch, NewMedicine};

/// Insert or update a branch (creating its pharmacy on first sight). Returns the branch id.
pub(crate) fn upsert_branch_in(conn: &Connection, branch: &NewBranch) -> rusqlite::Result<i64> {
    let pharmacy_id: i64 = conn.query_row(
        "INSERT INTO pharmacies (name) VALUES (?1)
         ON CONFLICT (name) DO UPDATE SET name = excluded.name
         RETURNING id",
        params![branch.pharmacy],
        |row| row.get(0),
    )?;
    conn.query_row(
        "INSERT INTO branches (pharmacy_id, name, address, phone, latitude, longitude,
                               opening_hours, closing_hours)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT (pharmacy_id, name) DO UPDATE SET
             address = excluded.address,
             phone = excluded.phone,
             latitude = excluded.latitude,
             longitude = excluded.longitude,
             opening_hours = excluded.opening_hours,
             closing_hours = excluded.closing_hours
         RETURNING id",
        params![
            pharmacy_id,
            branch.name,
            branch.address,
            branch.phone,
            branch.latitude,
            branch.longitude,
            branch.opening_hours,
            branch.closing_hours,
        ],
        |row| row.get(0),
    )
}

/// Insert or update a medicine at a branch. Returns the medicine id.
pub(crate) fn upsert_medicine_in(conn: &Connection, medicine: &NewMedicine) -> rusqlite::Result<i64> {
    conn.query_row(
        "INSERT INTO medicines (branch_id, name, scientific_name, price, quantity)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (branch_id, name) DO UPDATE SET
             scientific_name = excluded.scientific_name,
             price = excluded.price,
             quantity = excluded.quantity,
             updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
         RETURNING id",
        params![
            medicine.branch_id,
            medicine.name,
            medicine.scientific_name,
            medicine.price,
            medicine.quantity,
        ],
        |row| row.get(0),
    )
}

pub async fn upsert_branch(db: &Database, branch: NewBranch) -> Result<i64, MedfinderError> {
    db.connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> { upsert_branch_in(conn, &branch) })
        .await
        .map_err(map_tr_err)
}

pub async fn upsert_medicine(db: &Database, medicine: NewMedicine) -> Result<i64, MedfinderError> {
    db.connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> { upsert_medicine_in(conn, &medicine) })
        .await
        .map_err(map_tr_err)
}

/// Atomically add `delta` (possibly negative) to a medicine's stock.
///
/// Returns `false` without changing anything when the medicine does not exist
/// or the adjustment would take the quantity below zero.
pub async fn adjust_stock(db: &Database, medicine_id: i64, delta: i64) -> Result<bool, MedfinderError> {
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let changed = conn.execute(
                "UPDATE medicines
                 SET quantity = quantity + ?1,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2 AND quantity + ?1 >= 0",
                params![delta, medicine_id],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}
