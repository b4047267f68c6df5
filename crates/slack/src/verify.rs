use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

use feedhorn_core::config::SlackConfig;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-slack-signature";
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";

/// Outcome of a successful verification pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verification {
    /// Verification is administratively disabled; the request was not checked.
    Passthrough,
    /// The signature matched and the timestamp was inside the replay window.
    Verified,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("missing signature header")]
    MissingSignatureHeader,
    #[error("missing request-timestamp header")]
    MissingTimestampHeader,
    #[error("request age exceeded the replay window")]
    StaleRequest,
    #[error("signature verification failed")]
    SignatureMismatch,
}

/// Verifies Slack request signatures over the exact bytes received.
///
/// The expected signature is `"v0=" + hex(HMAC_SHA256(secret,
/// "v0:{timestamp}:{body}"))`, compared in constant time. When a replay
/// window is configured, `|now - timestamp|` is checked in whole seconds
/// before any HMAC work.
pub struct SignatureVerifier {
    enabled: bool,
    signing_secret: Option<SecretString>,
    max_age_secs: Option<u64>,
}

impl SignatureVerifier {
    pub fn new(signing_secret: SecretString, max_age_secs: Option<u64>) -> Self {
        Self { enabled: true, signing_secret: Some(signing_secret), max_age_secs }
    }

    /// A verifier that accepts every request as a passthrough.
    pub fn disabled() -> Self {
        Self { enabled: false, signing_secret: None, max_age_secs: None }
    }

    pub fn from_config(config: &SlackConfig) -> Self {
        Self {
            enabled: config.verification_enabled,
            signing_secret: config.signing_secret.clone(),
            max_age_secs: config.request_max_age_secs,
        }
    }

    pub fn verify(
        &self,
        signature: Option<&str>,
        timestamp: Option<&str>,
        raw_body: &[u8],
    ) -> Result<Verification, VerifyError> {
        self.verify_at(signature, timestamp, raw_body, unix_now_secs())
    }

    /// Deterministic variant; `now_secs` backs the replay-window check.
    pub fn verify_at(
        &self,
        signature: Option<&str>,
        timestamp: Option<&str>,
        raw_body: &[u8],
        now_secs: u64,
    ) -> Result<Verification, VerifyError> {
        if !self.enabled {
            return Ok(Verification::Passthrough);
        }

        // Config validation rejects enabled-without-secret at startup;
        // mirror the permissive behavior if that invariant is ever bypassed.
        let secret = match &self.signing_secret {
            Some(secret) => secret,
            None => return Ok(Verification::Passthrough),
        };

        let signature = signature.ok_or(VerifyError::MissingSignatureHeader)?;
        let timestamp = timestamp.ok_or(VerifyError::MissingTimestampHeader)?;

        if let Some(max_age) = self.max_age_secs {
            let parsed: i64 =
                timestamp.trim().parse().map_err(|_| VerifyError::StaleRequest)?;
            let age = (now_secs as i64 - parsed).unsigned_abs();
            if age > max_age {
                return Err(VerifyError::StaleRequest);
            }
        }

        let expected = expected_signature(secret.expose_secret(), timestamp, raw_body);

        let expected_bytes = expected.as_bytes();
        let provided_bytes = signature.as_bytes();
        if expected_bytes.len() != provided_bytes.len() {
            // Burn the same comparison time on length mismatch.
            let _ = expected_bytes.ct_eq(expected_bytes);
            return Err(VerifyError::SignatureMismatch);
        }

        if expected_bytes.ct_eq(provided_bytes).into() {
            Ok(Verification::Verified)
        } else {
            Err(VerifyError::SignatureMismatch)
        }
    }
}

/// Compute the `v0=` signature for the given secret, timestamp, and body.
pub fn expected_signature(secret: &str, timestamp: &str, raw_body: &[u8]) -> String {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        // HMAC accepts keys of any length; a bare prefix can never match a
        // 64-digit provided signature.
        Err(_) => return "v0=".to_string(),
    };
    mac.update(b"v0:");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(raw_body);
    format!("v0={}", hex::encode(mac.finalize().into_bytes()))
}

fn unix_now_secs() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}
