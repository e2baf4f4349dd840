// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `medfinder import` command implementation.

use std::path::Path;

use medfinder_config::MedfinderConfig;
use medfinder_core::MedfinderError;
use medfinder_storage::{SqliteStorage, import_csv_file};

pub async fn run_import(config: &MedfinderConfig, csv: &Path) -> Result<(), MedfinderError> {
    let storage = SqliteStorage::new(config.storage.clone(), &config.worker);
    storage.initialize().await?;
    let summary = import_csv_file(storage.db()?, csv).await?;
    println!(
        "imported {} rows: {} branches, {} medicines into {}",
        summary.rows, summary.branches, summary.medicines, config.storage.database_path
    );
    Ok(())
}
