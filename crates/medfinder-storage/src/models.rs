// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types written by the inventory-side helpers.

use serde::Deserialize;

/// A pharmacy branch to insert or update, keyed by `(pharmacy, name)`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBranch {
    pub pharmacy: String,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub opening_hours: Option<String>,
    pub closing_hours: Option<String>,
}

/// A stocked medicine to insert or update, keyed by `(branch_id, name)`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMedicine {
    pub branch_id: i64,
    pub name: String,
    pub scientific_name: Option<String>,
    pub price: f64,
    pub quantity: i64,
}

/// One line of an inventory CSV export.
#[derive(Debug, Clone, Deserialize)]
pub struct InventoryRecord {
    pub pharmacy: String,
    pub branch: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub opening_hours: Option<String>,
    #[serde(default)]
    pub closing_hours: Option<String>,
    pub medicine: String,
    #[serde(default)]
    pub scientific_name: Option<String>,
    pub price: f64,
    pub quantity: i64,
}

impl InventoryRecord {
    pub fn branch(&self) -> NewBranch {
        NewBranch {
            pharmacy: self.pharmacy.trim().to_string(),
            name: self.branch.trim().to_string(),
            address: non_blank(&self.address),
            phone: non_blank(&self.phone),
            latitude: self.latitude,
            longitude: self.longitude,
            opening_hours: non_blank(&self.opening_hours),
            closing_hours: non_blank(&self.closing_hours),
        }
    }

    pub fn medicine(&self, branch_id: i64) -> NewMedicine {
        NewMedicine {
            branch_id,
            name: self.medicine.trim().to_string(),
            scientific_name: non_blank(&self.scientific_name),
            price: self.price,
            quantity: self.quantity,
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
