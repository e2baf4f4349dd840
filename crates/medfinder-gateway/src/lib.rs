// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook gateway.
//!
//! Serves the provider verification handshake and the message POST on the
//! configured webhook path, plus an unauthenticated `/health`. Verified
//! messages are normalized and written to the durable queue; processing
//! happens in the queue workers, never on the request path.

pub mod handlers;
pub mod server;

pub use server::{GatewayState, router, serve};
