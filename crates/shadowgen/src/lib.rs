#![warn(missing_docs)]

//! Generate `/etc/shadow` entries with MD5-crypt (`$1$`) password hashes.
//!
//! This library computes the traditional Unix MD5-based `crypt(3)` hash,
//! bit-for-bit compatible with glibc and `openssl passwd -1`, and formats it
//! into a shadow database record.
//!
//! # Example
//!
//! ```
//! use shadowgen::{md5_crypt, shadow};
//! use std::time::SystemTime;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let hash = md5_crypt::hash("redhat123", "jp5rCMS4");
//! assert_eq!(hash, "$1$jp5rCMS4$mhvf4utonDubW5M00z0Ow0");
//! assert!(md5_crypt::verify("redhat123", &hash));
//!
//! // Let the library pick a random salt
//! let line = shadow::generate_shadow_line("alice", "password123", None, SystemTime::now())?;
//! println!("{}", line);
//! # Ok(())
//! # }
//! ```

pub mod md5_crypt;
pub mod salt;
pub mod shadow;

pub use salt::{Error as SaltError, generate_salt};
pub use shadow::{Error as ShadowError, ShadowEntry, format_line, generate_shadow_line};
