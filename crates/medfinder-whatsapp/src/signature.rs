// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook and relay signatures.
//!
//! Two schemes are in use:
//!
//! - `sha256=<hex>`: HMAC-SHA256 over the raw body (Meta's
//!   `X-Hub-Signature-256`, and the generic relay's `X-Signature-256`).
//! - Twilio's `X-Twilio-Signature`: base64 HMAC-SHA1 over the full request
//!   URL followed by every form field's key and value, sorted by key.
//!
//! Verification always goes through [`Mac::verify_slice`], which compares in
//! constant time.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;
type HmacSha1 = Hmac<Sha1>;

pub const META_SIGNATURE_HEADER: &str = "x-hub-signature-256";
pub const TWILIO_SIGNATURE_HEADER: &str = "x-twilio-signature";
pub const SIGNATURE_HEADER: &str = "x-signature-256";

const SHA256_PREFIX: &str = "sha256=";

fn sha256_mac(secret: &[u8], body: &[u8]) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(body);
    Some(mac)
}

fn sha1_mac(secret: &[u8], data: &[u8]) -> Option<HmacSha1> {
    let mut mac = HmacSha1::new_from_slice(secret).ok()?;
    mac.update(data);
    Some(mac)
}

/// `sha256=<hex>` signature of `body`.
pub fn sign_sha256(secret: &[u8], body: &[u8]) -> String {
    let digest = sha256_mac(secret, body)
        .map(|mac| hex::encode(mac.finalize().into_bytes()))
        .unwrap_or_default();
    format!("{SHA256_PREFIX}{digest}")
}

/// Check a `sha256=<hex>` header value against `body`.
pub fn verify_sha256(secret: &[u8], body: &[u8], header: &str) -> bool {
    let Some(hex_digest) = header.trim().strip_prefix(SHA256_PREFIX) else {
        return false;
    };
    let Ok(expected) = hex::decode(hex_digest) else {
        return false;
    };
    sha256_mac(secret, body).is_some_and(|mac| mac.verify_slice(&expected).is_ok())
}

/// The string Twilio signs: URL, then `key + value` for each field sorted by key.
pub fn twilio_signing_input(url: &str, params: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    let mut input = url.to_string();
    for (key, value) in sorted {
        input.push_str(key);
        input.push_str(value);
    }
    input
}

/// Base64 Twilio signature for `url` and `params`.
pub fn sign_twilio(auth_token: &str, url: &str, params: &[(String, String)]) -> String {
    sha1_mac(
        auth_token.as_bytes(),
        twilio_signing_input(url, params).as_bytes(),
    )
    .map(|mac| STANDARD.encode(mac.finalize().into_bytes()))
    .unwrap_or_default()
}

/// Check an `X-Twilio-Signature` header value.
pub fn verify_twilio(
    auth_token: &str,
    url: &str,
    params: &[(String, String)],
    header: &str,
) -> bool {
    let Ok(expected) = STANDARD.decode(header.trim()) else {
        return false;
    };
    sha1_mac(
        auth_token.as_bytes(),
        twilio_signing_input(url, params).as_bytes(),
    )
    .is_some_and(|mac| mac.verify_slice(&expected).is_ok())
}
