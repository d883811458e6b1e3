//! OS-random `TokenGenerator`.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;

use crate::domain::ports::{CapabilityError, TokenGenerator};

const TOKEN_BYTES: usize = 32;

/// 256-bit tokens encoded as unpadded URL-safe base64 (43 characters).
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomTokenGenerator;

impl TokenGenerator for RandomTokenGenerator {
    fn generate(&self) -> Result<String, CapabilityError> {
        let mut bytes = [0_u8; TOKEN_BYTES];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|err| CapabilityError::unavailable(format!("OS RNG failed: {err}")))?;
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use rstest::rstest;

    #[rstest]
    fn tokens_are_url_safe() {
        let token = RandomTokenGenerator.generate().expect("token");

        assert_eq!(token.len(), 43);
        assert!(
            token
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        );
    }

    #[rstest]
    fn tokens_do_not_repeat() {
        let tokens: HashSet<String> = (0..64)
            .map(|_| RandomTokenGenerator.generate().expect("token"))
            .collect();
        assert_eq!(tokens.len(), 64);
    }
}
