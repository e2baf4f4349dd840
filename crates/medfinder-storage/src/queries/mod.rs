// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules over the SQLite schema.

pub mod catalog;
pub mod inventory;
pub mod locations;
pub mod queue;
