//! Shadow database line formatting.

use crate::md5_crypt;
use crate::salt::{self, generate_salt};
use snafu::{ResultExt, Snafu};
use std::fmt;
use std::time::{SystemTime, SystemTimeError, UNIX_EPOCH};

/// Minimum number of days between password changes.
pub const MIN_DAYS: u32 = 0;

/// Maximum number of days a password stays valid.
pub const MAX_DAYS: u32 = 99999;

/// Number of days of warning before the password expires.
pub const WARN_DAYS: u32 = 7;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Errors that can occur while building a shadow line.
#[derive(Debug, Snafu)]
pub enum Error {
    /// The supplied clock reads earlier than 1970-01-01.
    #[snafu(display("Clock is set before the Unix epoch"))]
    ClockBeforeEpoch { source: SystemTimeError },

    /// Failed to generate a salt.
    #[snafu(display("Failed to generate a salt"))]
    Salt { source: salt::Error },
}

/// Whole days elapsed between 1970-01-01 UTC and `now`.
pub fn days_since_epoch(now: SystemTime) -> Result<u64, Error> {
    let elapsed = now.duration_since(UNIX_EPOCH).context(ClockBeforeEpochSnafu)?;
    Ok(elapsed.as_secs() / SECONDS_PER_DAY)
}

/// One record of `/etc/shadow`.
///
/// Displays as `user:hash:last_changed:0:99999:7:::`. The aging fields are
/// fixed; the inactive, expire and reserved fields are left empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowEntry {
    /// Login name, as in `/etc/passwd`.
    pub user: String,
    /// Encrypted password.
    pub hash: String,
    /// Days since the epoch of the last password change.
    pub last_changed: u64,
}

impl ShadowEntry {
    /// Create an entry whose last change is the day `now` falls on.
    pub fn new(
        user: impl Into<String>,
        hash: impl Into<String>,
        now: SystemTime,
    ) -> Result<Self, Error> {
        Ok(Self {
            user: user.into(),
            hash: hash.into(),
            last_changed: days_since_epoch(now)?,
        })
    }
}

impl fmt::Display for ShadowEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}:{}:::",
            self.user, self.hash, self.last_changed, MIN_DAYS, MAX_DAYS, WARN_DAYS
        )
    }
}

/// Format `user` and `hash` into a shadow line dated by `now`.
pub fn format_line(user: &str, hash: &str, now: SystemTime) -> Result<String, Error> {
    Ok(ShadowEntry::new(user, hash, now)?.to_string())
}

/// Hash `password` with MD5-crypt and format the shadow line for `user`.
///
/// A random salt is generated when `salt` is `None`.
pub fn generate_shadow_line(
    user: &str,
    password: impl AsRef<[u8]>,
    salt: Option<&str>,
    now: SystemTime,
) -> Result<String, Error> {
    let hash = match salt {
        Some(salt) => md5_crypt::hash(password, salt),
        None => md5_crypt::hash(password, &generate_salt().context(SaltSnafu)?),
    };
    log::debug!("Formatting shadow line for user {}", user);
    format_line(user, &hash, now)
}
