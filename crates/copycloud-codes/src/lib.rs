/// Room codes, secure tokens and row identifiers.
///
/// Human codes are short and typable; secure tokens are 256-bit random values
/// for rooms that should not be guessable. Neither is reused once a room exists.
pub mod codes;

pub use codes::{
    CODE_ALPHABET, CODE_LEN, CodeError, ID_LEN, MAX_CODE_ATTEMPTS, generate_id,
    generate_room_code, generate_secure_token,
};
