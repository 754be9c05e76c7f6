//! # Answer-Share Reconstruction
//!
//! Rebuilds the answer key (Key A) from three security-question answers
//! using Shamir secret sharing over GF(2^8).
//!
//! ## Scheme
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    ANSWER KEY RECONSTRUCTION                            │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  For each answer i ∈ {1, 2, 3}:                                        │
//! │                                                                         │
//! │    y_i = SHA-256(salt ‖ normalize(answer_i))      (32 bytes)           │
//! │    x_i = i                                        (fixed, non-zero)    │
//! │                                                                         │
//! │  Key A = Lagrange interpolation of the three (x_i, y_i) points at     │
//! │  x = 0, computed independently on each of the 32 byte positions in    │
//! │  GF(2^8) with the AES polynomial 0x11B.                               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## No Wrong-Answer Oracle
//!
//! Reconstruction always succeeds and always yields 32 deterministic
//! bytes; wrong answers simply yield a *different* key. Wrongness is only
//! detected downstream, when the resulting key fails to open the
//! master-key envelope. The component deliberately exposes no signal that
//! distinguishes "one answer wrong" from "all three wrong".
//!
//! ## Normalization
//!
//! Answers are trimmed of ASCII whitespace and lowercased (ASCII only).
//! This is the sole input tolerance: no stemming, no Unicode folding.
//! Widening it would silently invalidate every existing account, since
//! changed hashes mean a changed polynomial.

use sha2::{Digest, Sha256};
use sharks::{Share, Sharks};
use zeroize::Zeroizing;

use crate::crypto::keys::SecretKey;
use crate::error::{Error, Result};

/// Number of security answers; reconstruction requires exactly this many
pub const ANSWER_COUNT: usize = 3;

/// Normalize a security answer: trim ASCII whitespace, lowercase ASCII
pub fn normalize_answer(answer: &str) -> String {
    answer
        .trim_matches(|c: char| c.is_ascii_whitespace())
        .to_ascii_lowercase()
}

/// Reconstruct the answer key (Key A) from three answers and the user's
/// public salt
///
/// ## Errors
///
/// An answer count other than three is API misuse and fails loudly with
/// [`Error::ProgrammerError`]. Duplicate share indices cannot occur (the
/// x-coordinates are fixed 1, 2, 3) and empty answers are allowed; they
/// hash to a deterministic value like any other.
pub fn recover_answer_key(answers: &[&str], salt: &[u8]) -> Result<SecretKey> {
    if answers.len() != ANSWER_COUNT {
        return Err(Error::ProgrammerError(format!(
            "answer key reconstruction requires exactly {} answers, got {}",
            ANSWER_COUNT,
            answers.len()
        )));
    }

    let mut shares = Vec::with_capacity(ANSWER_COUNT);
    for (i, answer) in answers.iter().enumerate() {
        let normalized = Zeroizing::new(normalize_answer(answer));

        let mut hasher = Sha256::new();
        hasher.update(salt);
        hasher.update(normalized.as_bytes());
        let digest = hasher.finalize();

        // Share wire format: x-coordinate byte followed by the y bytes
        let mut share_bytes = Zeroizing::new(Vec::with_capacity(1 + digest.len()));
        share_bytes.push((i + 1) as u8);
        share_bytes.extend_from_slice(&digest);

        let share = Share::try_from(share_bytes.as_slice())
            .map_err(|e| Error::KeyDerivationFailed(format!("invalid share: {}", e)))?;
        shares.push(share);
    }

    let secret = Zeroizing::new(
        Sharks(ANSWER_COUNT as u8)
            .recover(&shares)
            .map_err(|e| Error::KeyDerivationFailed(format!("share combination failed: {}", e)))?,
    );

    SecretKey::try_from_slice(&secret)
        .ok_or_else(|| Error::KeyDerivationFailed("reconstructed secret has wrong length".into()))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SALT: [u8; 16] = [7u8; 16];

    #[test]
    fn test_normalize_trims_and_lowercases() {
        assert_eq!(normalize_answer("  Fluffy  "), "fluffy");
        assert_eq!(normalize_answer("\tFLUFFY\n"), "fluffy");
        assert_eq!(normalize_answer("fluffy"), "fluffy");
        assert_eq!(normalize_answer(""), "");
    }

    #[test]
    fn test_normalize_is_ascii_only() {
        // Unicode-equivalent strings stay distinct
        assert_ne!(normalize_answer("Süß"), normalize_answer("SÜSS"));
    }

    #[test]
    fn test_reconstruction_is_deterministic() {
        let answers = ["red", "green", "blue"];
        let k1 = recover_answer_key(&answers, &SALT).unwrap();
        let k2 = recover_answer_key(&answers, &SALT).unwrap();
        assert_eq!(k1, k2);
    }

    #[test]
    fn test_normalized_variants_reconstruct_same_key() {
        let k1 = recover_answer_key(&["Fluffy", " FLUFFY ", "fluffy"], &SALT).unwrap();
        let k2 = recover_answer_key(&["fluffy", "fluffy", "fluffy"], &SALT).unwrap();
        assert_eq!(k1, k2);
    }

    #[test]
    fn test_any_changed_answer_changes_the_key() {
        let base = recover_answer_key(&["red", "green", "blue"], &SALT).unwrap();
        for i in 0..3 {
            let mut answers = ["red", "green", "blue"];
            answers[i] = "yellow";
            let altered = recover_answer_key(&answers, &SALT).unwrap();
            assert_ne!(base, altered, "changing answer {} must change the key", i);
        }
    }

    #[test]
    fn test_salt_changes_the_key() {
        let answers = ["red", "green", "blue"];
        let k1 = recover_answer_key(&answers, &SALT).unwrap();
        let k2 = recover_answer_key(&answers, &[8u8; 16]).unwrap();
        assert_ne!(k1, k2);
    }

    #[test]
    fn test_wrong_answer_count_is_programmer_error() {
        let err = recover_answer_key(&["a", "b"], &SALT).unwrap_err();
        assert!(matches!(err, Error::ProgrammerError(_)));

        let err = recover_answer_key(&["a", "b", "c", "d"], &SALT).unwrap_err();
        assert!(matches!(err, Error::ProgrammerError(_)));
    }

    #[test]
    fn test_empty_answers_are_allowed() {
        let key = recover_answer_key(&["", "", ""], &SALT).unwrap();
        // Deterministic, and distinct from a non-empty set
        let again = recover_answer_key(&["", "", ""], &SALT).unwrap();
        assert_eq!(key, again);
        let other = recover_answer_key(&["x", "", ""], &SALT).unwrap();
        assert_ne!(key, other);
    }
}
