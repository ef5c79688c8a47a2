//! Random salt generation.

use snafu::{ResultExt, Snafu};

/// Characters a generated salt is drawn from.
pub const SALT_ALPHABET: &[u8; 62] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Salt length in characters
pub const SALT_LEN: usize = 8;

/// Random bytes at or above this value are discarded to keep the draw uniform.
const REJECTION_LIMIT: u8 = (256 / SALT_ALPHABET.len() * SALT_ALPHABET.len()) as u8;

/// Errors that can occur while generating a salt.
#[derive(Debug, Snafu)]
pub enum Error {
    /// The operating system random source failed.
    #[snafu(display("Can't read random bytes for the salt"))]
    Random { source: getrandom::Error },
}

/// Generate a random salt of [`SALT_LEN`] alphanumeric characters.
///
/// Every character is drawn uniformly from [`SALT_ALPHABET`], so the salt
/// never contains the `$` field separator.
pub fn generate_salt() -> Result<String, Error> {
    let mut salt = String::with_capacity(SALT_LEN);
    let mut buf = [0u8; SALT_LEN * 2];

    while salt.len() < SALT_LEN {
        getrandom::fill(&mut buf).context(RandomSnafu)?;
        for &byte in buf.iter().filter(|&&b| b < REJECTION_LIMIT) {
            if salt.len() == SALT_LEN {
                break;
            }
            salt.push(SALT_ALPHABET[usize::from(byte) % SALT_ALPHABET.len()] as char);
        }
    }

    log::debug!("Generated a random {}-character salt", salt.len());
    Ok(salt)
}
