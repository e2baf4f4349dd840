// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bulk catalog import from an inventory CSV export.
//!
//! Expected header:
//!
//! ```text
//! pharmacy,branch,address,phone,latitude,longitude,opening_hours,closing_hours,medicine,scientific_name,price,quantity
//! ```
//!
//! The whole file is applied in one transaction; a malformed row aborts the
//! import and leaves the catalog untouched.

use std::io::Read;

use medfinder_core::MedfinderError;
use tracing::info;

use crate::database::{Database, map_tr_err};
use crate::models::InventoryRecord;
use crate::queries::inventory::{upsert_branch_in, upsert_medicine_in};

/// Counts reported after a successful import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub rows: usize,
    pub branches: usize,
    pub medicines: usize,
}

/// Parse every record up front so a bad row fails before anything is written.
pub fn parse_inventory<R: Read>(reader: R) -> Result<Vec<InventoryRecord>, MedfinderError> {
    let mut csv = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    csv.deserialize()
        .enumerate()
        .map(|(index, record)| {
            let record: InventoryRecord = record.map_err(|e| {
                MedfinderError::InvalidPayload(format!("inventory row {}: {e}", index + 1))
            })?;
            if record.quantity < 0 || record.price < 0.0 {
                return Err(MedfinderError::InvalidPayload(format!(
                    "inventory row {}: price and quantity must not be negative",
                    index + 1
                )));
            }
            Ok(record)
        })
        .collect()
}

/// Upsert every record into the catalog inside a single transaction.
pub async fn import_records(
    db: &Database,
    records: Vec<InventoryRecord>,
) -> Result<ImportSummary, MedfinderError> {
    let summary = db
        .connection()
        .call(move |conn| -> Result<ImportSummary, rusqlite::Error> {
            let tx = conn.transaction()?;
            let mut branches = std::collections::HashSet::new();
            let mut medicines = std::collections::HashSet::new();
            for record in &records {
                let branch_id = upsert_branch_in(&tx, &record.branch())?;
                branches.insert(branch_id);
                medicines.insert(upsert_medicine_in(&tx, &record.medicine(branch_id))?);
            }
            tx.commit()?;
            Ok(ImportSummary {
                rows: records.len(),
                branches: branches.len(),
                medicines: medicines.len(),
            })
        })
        .await
        .map_err(map_tr_err)?;

    info!(
        rows = summary.rows,
        branches = summary.branches,
        medicines = summary.medicines,
        "inventory imported"
    );
    Ok(summary)
}

/// Read and import a CSV file.
pub async fn import_csv_file(db: &Database, path: &std::path::Path) -> Result<ImportSummary, MedfinderError> {
    let file = std::fs::File::open(path).map_err(|e| MedfinderError::Storage {
        source: Box::new(e),
    })?;
    let records = parse_inventory(file)?;
    import_records(db, records).await
}
