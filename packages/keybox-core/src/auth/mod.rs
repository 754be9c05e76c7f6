//! # Authentication Module
//!
//! Owns the credential key hierarchy and its three entry points:
//! register, login, and credential reset.
//!
//! ## Why Two Recovery Paths Stay Coherent
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    CROSS-PATH COHERENCE                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Path 1 (login):  Root ──opens──► enc_b ──► B                          │
//! │  Path 2 (reset):  answers ──► A ──opens──► enc_m ──► M ──HKDF──► B     │
//! │                                                                         │
//! │  Both paths must land on the same B, or reset could not re-wrap the   │
//! │  data key it has never seen in the clear. Register and reset enforce  │
//! │  this as a post-condition; a break shows up as CorruptVault on the    │
//! │  reset path while login keeps working.                                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod service;

pub use service::{AuthService, TotpEnrollment};
