//! MD5-crypt (`$1$`) password hashing implementation.
//!
//! This module implements the traditional Unix MD5-based `crypt(3)` scheme
//! stored in `/etc/shadow`. The format is: `$1$salt$hash`
//!
//! # Algorithm Source
//!
//! The algorithm originates from Poul-Henning Kamp's FreeBSD `crypt-md5.c`
//! (Beer-Ware License) and is the same one glibc and `openssl passwd -1`
//! implement. Apache's APR1 variant differs only in its magic string.
//!
//! Key references:
//! - FreeBSD crypt.c: https://github.com/freebsd/freebsd-src/blob/master/lib/libcrypt/crypt-md5.c
//! - Step-by-step description: https://www.vidarholen.net/contents/blog/?p=32
//!
//! # Security Warning
//!
//! MD5 is cryptographically broken. This implementation is provided for
//! compatibility with existing shadow databases only.

use md5::{Digest, Md5};

/// Custom base64 alphabet (itoa64) used by `crypt(3)`.
///
/// It differs from standard base64 by starting with `./` instead of `A-Za-z`.
const ITOA64: &[u8; 64] = b"./0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// MD5-crypt hash prefix
pub const MD5_CRYPT_PREFIX: &str = "$1$";

/// Length of the encoded digest that follows the salt.
pub const ENCODED_LEN: usize = 22;

/// Number of MD5 mixing rounds
const ROUNDS: usize = 1000;

const DIGEST_LEN: usize = 16;

/// Source index in the final digest for every output position.
const PERMUTATION: [usize; DIGEST_LEN] = [11, 4, 10, 5, 3, 9, 15, 2, 8, 14, 1, 7, 13, 0, 6, 12];

type Md5Digest = [u8; DIGEST_LEN];

/// Inputs a mixing round feeds into MD5, decided by the round index alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Round {
    /// Odd rounds open with the password and close with the digest.
    odd: bool,
    with_salt: bool,
    with_password: bool,
}

impl Round {
    fn new(index: usize) -> Self {
        Round {
            odd: index % 2 == 1,
            with_salt: index % 3 != 0,
            with_password: index % 7 != 0,
        }
    }
}

/// Compute the initial digest from the password, the magic and the salt.
fn seed_digest(password: &[u8], salt: &[u8]) -> Md5Digest {
    let mut alternate = Md5::new();
    alternate.update(password);
    alternate.update(salt);
    alternate.update(password);
    let alternate = alternate.finalize();

    let mut seed = Md5::new();
    seed.update(password);
    seed.update(MD5_CRYPT_PREFIX.as_bytes());
    seed.update(salt);

    // One byte of the alternate sum per password byte, cycling every 16
    for chunk in password.chunks(DIGEST_LEN) {
        seed.update(&alternate[..chunk.len()]);
    }

    // Bits of the password length, LSB first, up to the highest set bit
    let mut n = password.len();
    while n != 0 {
        if n & 1 == 1 {
            seed.update([0u8]);
        } else {
            seed.update(&password[..1]);
        }
        n >>= 1;
    }

    seed.finalize().into()
}

/// Run the 1000 mixing rounds and return the final digest.
fn crypt_digest(password: &[u8], salt: &[u8]) -> Md5Digest {
    let mut digest = seed_digest(password, salt);

    for index in 0..ROUNDS {
        let round = Round::new(index);
        let mut hasher = Md5::new();

        if round.odd {
            hasher.update(password);
        } else {
            hasher.update(digest);
        }
        if round.with_salt {
            hasher.update(salt);
        }
        if round.with_password {
            hasher.update(password);
        }
        if round.odd {
            hasher.update(digest);
        } else {
            hasher.update(password);
        }

        digest = hasher.finalize().into();
    }

    digest
}

fn permute(digest: &Md5Digest) -> Md5Digest {
    let mut permuted = [0u8; DIGEST_LEN];
    for (dst, &src) in permuted.iter_mut().zip(PERMUTATION.iter()) {
        *dst = digest[src];
    }
    permuted
}

/// Encode a permuted digest into 22 itoa64 characters.
///
/// Bytes are consumed from the last one to the first, each contributing its
/// bits least significant first. Every 6 collected bits form one character;
/// the final character carries the 2 leftover bits.
fn encode(permuted: &Md5Digest) -> String {
    let mut result = String::with_capacity(ENCODED_LEN);
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;

    for &byte in permuted.iter().rev() {
        acc |= u32::from(byte) << bits;
        bits += 8;
        while bits >= 6 {
            result.push(ITOA64[(acc & 0x3f) as usize] as char);
            acc >>= 6;
            bits -= 6;
        }
    }
    if bits > 0 {
        result.push(ITOA64[(acc & 0x3f) as usize] as char);
    }

    result
}

/// Hash a password using the MD5-crypt algorithm.
///
/// # Arguments
///
/// * `password` - The password, treated as opaque bytes
/// * `salt` - The salt, used verbatim (neither truncated nor validated)
///
/// # Returns
///
/// A string in the format `$1$salt$hash`, where `hash` is always
/// [`ENCODED_LEN`] characters long.
///
/// # Algorithm
///
/// 1. alternate = MD5(password + salt + password)
/// 2. seed = password + "$1$" + salt + one alternate byte per password byte
/// 3. For each bit of the password length (LSB first) append a NUL byte if
///    the bit is set, the first password byte otherwise
/// 4. digest = MD5(seed)
/// 5. Run 1000 rounds: for i in 0..999, digest = MD5(...)
///    - If i is odd: start with password, else digest
///    - If i % 3 != 0: add salt
///    - If i % 7 != 0: add password
///    - If i is odd: end with digest, else password
/// 6. Permute the digest bytes and encode them with the itoa64 alphabet
///
/// A salt containing `$` is accepted; the output is still deterministic but
/// naive `$`-splitting parsers will misread it.
pub fn hash(password: impl AsRef<[u8]>, salt: &str) -> String {
    let password = password.as_ref();
    log::trace!(
        "Computing MD5-crypt hash (password length {}, salt {:?})",
        password.len(),
        salt
    );

    let digest = crypt_digest(password, salt.as_bytes());
    let encoded = encode(&permute(&digest));

    format!("{MD5_CRYPT_PREFIX}{salt}${encoded}")
}

/// Extract the salt from an MD5-crypt hash string.
///
/// The salt is everything between the `$1$` prefix and the last `$`, so
/// salts that themselves contain `$` are recovered intact. Returns `None`
/// when the prefix is missing or the encoded part isn't [`ENCODED_LEN`]
/// characters long.
pub fn parse_salt(hash_str: &str) -> Option<&str> {
    let rest = hash_str.strip_prefix(MD5_CRYPT_PREFIX)?;
    let (salt, encoded) = rest.rsplit_once('$')?;
    (encoded.len() == ENCODED_LEN).then_some(salt)
}

/// Verify a password against an MD5-crypt hash.
///
/// # Returns
///
/// `true` if the password matches, `false` otherwise (including when
/// `hash_str` isn't an MD5-crypt hash at all).
pub fn verify(password: impl AsRef<[u8]>, hash_str: &str) -> bool {
    match parse_salt(hash_str) {
        Some(salt) => hash(password, salt) == hash_str,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Vectors cross-checked with: openssl passwd -1 -salt <salt> <password>

    #[test]
    fn test_md5_crypt_redhat123() {
        assert_eq!(
            hash("redhat123", "jp5rCMS4"),
            "$1$jp5rCMS4$mhvf4utonDubW5M00z0Ow0"
        );
    }

    #[test]
    fn test_md5_crypt_password() {
        assert_eq!(
            hash("password", "saltsalt"),
            "$1$saltsalt$qjXMvbEw8oaL.CzflDtaK/"
        );
    }

    #[test]
    fn test_md5_crypt_glibc_vector() {
        // glibc md5c-test: crypt("Hello world!", "$1$saltstring") truncates to 8
        assert_eq!(
            hash("Hello world!", "saltstri"),
            "$1$saltstri$YMyguxXMBpd2TEZ.vS/3q1"
        );
    }

    #[test]
    fn test_md5_crypt_empty_password() {
        let result = hash("", "abcdefgh");
        assert_eq!(result, "$1$abcdefgh$M55TzYaaccxVGbptZWaxX/");
        assert_eq!(result.len(), MD5_CRYPT_PREFIX.len() + 8 + 1 + ENCODED_LEN);
    }

    #[test]
    fn test_md5_crypt_password_longer_than_digest() {
        // 40 bytes cycles through the alternate sum two and a half times
        let password = "a".repeat(40);
        assert_eq!(
            hash(&password, "abcdefgh"),
            "$1$abcdefgh$VWPa5IBhJmBLChLT3OjfP1"
        );
    }

    #[test]
    fn test_md5_crypt_non_utf8_password() {
        let password: &[u8] = b"\xff\xfe\x00pw";
        assert_eq!(
            hash(password, "abcdefgh"),
            "$1$abcdefgh$KZVivUaBwd2TDpAq9JkEo/"
        );
    }

    #[test]
    fn test_salt_with_separator_is_kept() {
        let result = hash("pw", "ab$cd");
        assert_eq!(result, "$1$ab$cd$HjOd73vVhIPeTPzrONdey0");
        assert_eq!(parse_salt(&result), Some("ab$cd"));
        assert!(verify("pw", &result));
    }

    #[test]
    fn test_salt_is_echoed_verbatim() {
        for salt in ["", "a", "jp5rCMS4", "longer_than_eight_chars"] {
            let result = hash("secret", salt);
            let rest = result.strip_prefix(MD5_CRYPT_PREFIX).unwrap();
            let (echoed, encoded) = rest.rsplit_once('$').unwrap();
            assert_eq!(echoed, salt);
            assert_eq!(encoded.len(), ENCODED_LEN);
        }
    }

    #[test]
    fn test_output_format() {
        for (password, salt) in [("", "abcdefgh"), ("x", "s"), ("redhat123", "jp5rCMS4")] {
            let result = hash(password, salt);
            let sections: Vec<&str> = result.split('$').collect();
            assert_eq!(sections.len(), 4, "unexpected layout: {}", result);
            assert_eq!(sections[0], "");
            assert_eq!(sections[1], "1");
            assert_eq!(sections[2], salt);
            assert_eq!(sections[3].len(), ENCODED_LEN);
            assert!(sections[3].bytes().all(|b| ITOA64.contains(&b)));
        }
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(hash("hunter2", "abcdefgh"), hash("hunter2", "abcdefgh"));
    }

    #[test]
    fn test_single_byte_changes_alter_hash() {
        fn encoded(hash_str: &str) -> &str {
            hash_str.rsplit_once('$').unwrap().1
        }
        let base = hash("redhat123", "jp5rCMS4");

        let password = b"redhat123";
        for i in 0..password.len() {
            let mut changed = password.to_vec();
            changed[i] ^= 1;
            assert_ne!(encoded(&hash(&changed, "jp5rCMS4")), encoded(&base));
        }

        for salt in ["kp5rCMS4", "jp5rCMS5", "jp5rcMS4"] {
            assert_ne!(encoded(&hash("redhat123", salt)), encoded(&base));
        }
    }

    #[test]
    fn test_permutation_is_bijective() {
        let mut seen = [false; DIGEST_LEN];
        for &index in PERMUTATION.iter() {
            assert!(!seen[index], "index {} repeated", index);
            seen[index] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_permute_order() {
        let digest: Md5Digest = core::array::from_fn(|i| i as u8);
        assert_eq!(permute(&digest), PERMUTATION.map(|i| i as u8));
    }

    #[test]
    fn test_encode_extremes() {
        assert_eq!(encode(&[0u8; DIGEST_LEN]), ".".repeat(ENCODED_LEN));
        // 21 full groups of ones, then the 2 leftover bits (value 3)
        assert_eq!(encode(&[0xffu8; DIGEST_LEN]), format!("{}1", "z".repeat(21)));
    }

    #[test]
    fn test_encode_bit_order() {
        // Only the lowest bit of the last byte is the first bit collected
        let mut permuted = [0u8; DIGEST_LEN];
        permuted[15] = 0x01;
        assert_eq!(encode(&permuted), format!("/{}", ".".repeat(21)));

        // The first byte is consumed last and ends up in the 2-bit group
        let mut permuted = [0u8; DIGEST_LEN];
        permuted[0] = 0x80;
        assert_eq!(encode(&permuted), format!("{}0", ".".repeat(21)));
    }

    #[test]
    fn test_round_schedule() {
        assert_eq!(
            Round::new(0),
            Round { odd: false, with_salt: false, with_password: false }
        );
        assert_eq!(
            Round::new(1),
            Round { odd: true, with_salt: true, with_password: true }
        );
        assert_eq!(
            Round::new(21),
            Round { odd: true, with_salt: false, with_password: false }
        );
        assert_eq!(
            Round::new(14),
            Round { odd: false, with_salt: true, with_password: false }
        );
    }

    #[test]
    fn test_verify() {
        let hash_str = "$1$jp5rCMS4$mhvf4utonDubW5M00z0Ow0";
        assert!(verify("redhat123", hash_str));
        assert!(!verify("redhat124", hash_str));
        assert!(!verify("redhat123", "$apr1$jp5rCMS4$mhvf4utonDubW5M00z0Ow0"));
        assert!(!verify("redhat123", "$1$jp5rCMS4$mhvf4uton"));
        assert!(!verify("redhat123", "plaintext"));
    }

    #[test]
    fn test_parse_salt() {
        assert_eq!(
            parse_salt("$1$jp5rCMS4$mhvf4utonDubW5M00z0Ow0"),
            Some("jp5rCMS4")
        );
        assert_eq!(parse_salt("$1$$M55TzYaaccxVGbptZWaxX/"), Some(""));
        assert_eq!(parse_salt("$1$jp5rCMS4"), None);
        assert_eq!(parse_salt("$5$jp5rCMS4$mhvf4utonDubW5M00z0Ow0"), None);
    }
}
