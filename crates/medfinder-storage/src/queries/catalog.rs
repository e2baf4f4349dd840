// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stock-filtered catalog lookups, one function per search tier.
//!
//! Every query joins branch and pharmacy metadata, drops rows with no stock,
//! and orders by descending quantity with the medicine id as tie-breaker.
//! Names are compared through the `medfinder_normalize` SQL function so the
//! stored spelling never has to be pre-folded.

use medfinder_core::{CatalogEntry, MedfinderError};
use rusqlite::{Row, params, params_from_iter};

use crate::database::{Database, map_tr_err};

const SELECT_ENTRY: &str = "
    SELECT m.id, m.name, m.scientific_name, m.price, m.quantity,
           b.id, b.name, b.address, b.phone, b.latitude, b.longitude,
           b.opening_hours, b.closing_hours,
           p.id, p.name
    FROM medicines m
    JOIN branches b ON b.id = m.branch_id
    JOIN pharmacies p ON p.id = b.pharmacy_id
    WHERE m.quantity > 0";

const ORDER: &str = "ORDER BY m.quantity DESC, m.id ASC";

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<CatalogEntry> {
    Ok(CatalogEntry {
        medicine_id: row.get(0)?,
        medicine_name: row.get(1)?,
        scientific_name: row.get(2)?,
        price: row.get(3)?,
        quantity: row.get(4)?,
        branch_id: row.get(5)?,
        branch_name: row.get(6)?,
        address: row.get(7)?,
        phone: row.get(8)?,
        latitude: row.get(9)?,
        longitude: row.get(10)?,
        opening_hours: row.get(11)?,
        closing_hours: row.get(12)?,
        pharmacy_id: row.get(13)?,
        pharmacy_name: row.get(14)?,
    })
}

/// Entries whose normalized name or scientific name equals `term`.
pub async fn find_exact(db: &Database, term: &str) -> Result<Vec<CatalogEntry>, MedfinderError> {
    let term = term.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<CatalogEntry>, rusqlite::Error> {
            let sql = format!(
                "{SELECT_ENTRY}
                   AND (medfinder_normalize(m.name) = ?1
                        OR medfinder_normalize(m.scientific_name) = ?1)
                 {ORDER}"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![term], entry_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Entries whose normalized name or scientific name contains `term`.
pub async fn find_containing(
    db: &Database,
    term: &str,
    limit: usize,
) -> Result<Vec<CatalogEntry>, MedfinderError> {
    let term = term.to_string();
    let limit = limit as i64;
    db.connection()
        .call(move |conn| -> Result<Vec<CatalogEntry>, rusqlite::Error> {
            let sql = format!(
                "{SELECT_ENTRY}
                   AND (instr(medfinder_normalize(m.name), ?1) > 0
                        OR instr(medfinder_normalize(m.scientific_name), ?1) > 0)
                 {ORDER}
                 LIMIT ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![term, limit], entry_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Entries whose normalized name or scientific name contains any of `words`.
///
/// An empty word list matches nothing.
pub async fn find_any_word(
    db: &Database,
    words: &[String],
    limit: usize,
) -> Result<Vec<CatalogEntry>, MedfinderError> {
    if words.is_empty() {
        return Ok(Vec::new());
    }
    let words = words.to_vec();
    let limit = limit as i64;
    db.connection()
        .call(move |conn| -> Result<Vec<CatalogEntry>, rusqlite::Error> {
            let clauses = (1..=words.len())
                .map(|i| {
                    format!(
                        "instr(medfinder_normalize(m.name), ?{i}) > 0
                         OR instr(medfinder_normalize(m.scientific_name), ?{i}) > 0"
                    )
                })
                .collect::<Vec<_>>()
                .join(" OR ");
            let sql = format!(
                "{SELECT_ENTRY}
                   AND ({clauses})
                 {ORDER}
                 LIMIT {limit}"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(words.iter()), entry_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
