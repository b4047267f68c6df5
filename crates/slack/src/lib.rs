//! Slack Integration - signed slash-command webhook pipeline
//!
//! This crate provides the Slack interface for feedhorn:
//! - **Signature verification** (`verify`) - HMAC-SHA256 request authentication
//! - **Form decoding** (`form`) - raw-body slash-command payload parsing
//! - **Slash Commands** (`commands`) - `/rss subscribe`, `/rss fetch`, etc.
//! - **Block Kit** (`blocks`) - flat section-block message rendering
//!
//! # Architecture
//!
//! ```text
//! Raw bytes → SignatureVerifier → SlashPayload → CommandRouter → MessageTemplate
//! ```
//!
//! The raw request body is verified byte-for-byte before any decoding, and
//! the router never fails outward: every outcome renders as a reply.

pub mod blocks;
pub mod commands;
pub mod form;
pub mod verify;
