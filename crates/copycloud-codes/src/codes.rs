use anyhow::{Result, anyhow};
use rand::rngs::OsRng;
use rand::{Rng, TryRngCore};
use tracing::debug;

/// Room code alphabet. `0`, `O`, `1` and `I` are left out so codes survive being read aloud.
pub const CODE_ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const CODE_LEN: usize = 6;
pub const MAX_CODE_ATTEMPTS: usize = 100;

const ID_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";
pub const ID_LEN: usize = 21;

const SECURE_TOKEN_BYTES: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum CodeError {
    #[error("no unused room code found after {attempts} attempts")]
    Exhausted { attempts: usize },
}

/// Draw random room codes until `is_taken` reports one as free.
///
/// Gives up with [`CodeError::Exhausted`] after [`MAX_CODE_ATTEMPTS`] draws
/// rather than handing back a code that is already in use.
pub fn generate_room_code<F>(mut is_taken: F) -> Result<String>
where
    F: FnMut(&str) -> Result<bool>,
{
    let mut rng = rand::rng();

    for attempt in 1..=MAX_CODE_ATTEMPTS {
        let code: String = (0..CODE_LEN)
            .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
            .collect();

        if !is_taken(&code)? {
            if attempt > 1 {
                debug!("Room code found after {} attempts", attempt);
            }
            return Ok(code);
        }
    }

    Err(CodeError::Exhausted {
        attempts: MAX_CODE_ATTEMPTS,
    }
    .into())
}

/// 256 bits from the OS CSPRNG as 64 lowercase hex characters.
pub fn generate_secure_token() -> Result<String> {
    let mut bytes = [0u8; SECURE_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| anyhow!("OS random source unavailable: {}", e))?;
    Ok(hex::encode(bytes))
}

/// Short URL-safe identifier for primary keys and upload filenames.
pub fn generate_id() -> String {
    let mut rng = rand::rng();
    (0..ID_LEN)
        .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
        .collect()
}
