// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Patros Labs

//! EIP-191 wallet signature verification.
//!
//! Wallets sign the challenge message with `personal_sign`, which prefixes
//! the message with `"\x19Ethereum Signed Message:\n" + len` before hashing.
//! Verification recovers the signer address from the 65-byte signature and
//! compares it against the claimed address.

use alloy::primitives::{Address, Signature};

use crate::models::ChainAddress;

use super::AuthError;

/// Verify that `signature_hex` over `message` was produced by `claimed`.
///
/// Accepts the usual wallet output: 0x-prefixed hex, 65 bytes (r ‖ s ‖ v).
pub fn verify_personal_sign(
    claimed: &ChainAddress,
    message: &str,
    signature_hex: &str,
) -> Result<(), AuthError> {
    let bytes = alloy::hex::decode(signature_hex.trim())
        .map_err(|_| AuthError::MalformedSignature)?;

    let signature =
        Signature::try_from(bytes.as_slice()).map_err(|_| AuthError::MalformedSignature)?;

    let recovered = signature
        .recover_address_from_msg(message)
        .map_err(|_| AuthError::MalformedSignature)?;

    let claimed_addr: Address = claimed
        .0
        .parse()
        .map_err(|_| AuthError::InvalidAddress)?;

    if recovered != claimed_addr {
        return Err(AuthError::SignatureMismatch);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::signers::{local::PrivateKeySigner, SignerSync};

    fn signer() -> PrivateKeySigner {
        PrivateKeySigner::random()
    }

    #[test]
    fn valid_signature_verifies() {
        let signer = signer();
        let address = ChainAddress::from(signer.address());
        let message = "Sign in to Patros\n\nAddress: 0xabc\nNonce: n-1";

        let signature = signer.sign_message_sync(message.as_bytes()).unwrap();
        let hex = alloy::hex::encode_prefixed(signature.as_bytes());

        assert!(verify_personal_sign(&address, message, &hex).is_ok());
    }

    #[test]
    fn signature_over_different_message_is_rejected() {
        let signer = signer();
        let address = ChainAddress::from(signer.address());

        let signature = signer.sign_message_sync(b"original message").unwrap();
        let hex = alloy::hex::encode_prefixed(signature.as_bytes());

        let result = verify_personal_sign(&address, "tampered message", &hex);
        assert!(matches!(result, Err(AuthError::SignatureMismatch)));
    }

    #[test]
    fn signature_from_other_key_is_rejected() {
        let honest = signer();
        let imposter = signer();
        let address = ChainAddress::from(honest.address());
        let message = "challenge";

        let signature = imposter.sign_message_sync(message.as_bytes()).unwrap();
        let hex = alloy::hex::encode_prefixed(signature.as_bytes());

        let result = verify_personal_sign(&address, message, &hex);
        assert!(matches!(result, Err(AuthError::SignatureMismatch)));
    }

    #[test]
    fn garbage_signature_is_malformed() {
        let signer = signer();
        let address = ChainAddress::from(signer.address());

        for bad in ["", "0x1234", "not-hex-at-all"] {
            let result = verify_personal_sign(&address, "msg", bad);
            assert!(
                matches!(result, Err(AuthError::MalformedSignature)),
                "expected malformed for {bad:?}"
            );
        }
    }
}
