use rand::{rngs::OsRng, RngCore};

/// Bytes of entropy behind every invitation token.
pub const INVITATION_TOKEN_BYTES: usize = 32;

/// Hex-encoded random token; `bytes` of entropy yields `2 * bytes` characters.
pub fn generate_token(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    OsRng.fill_bytes(&mut buf);
    hex::encode(buf)
}

pub fn generate_invitation_token() -> String {
    generate_token(INVITATION_TOKEN_BYTES)
}
