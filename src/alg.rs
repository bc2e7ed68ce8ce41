//! The fixed set of digest algorithms and their fold/cycle primitives.
//!
//! RFC 2289 section 5.0: all conforming implementations of both servers and
//! generators MUST support MD5, SHOULD support SHA and MAY also support MD4.
//! The set is closed; extending it means adding a variant and a provider
//! here, never runtime configuration.

use md4::{Digest, Md4};

use crate::error::{Error, Result};
use crate::value::OtpValue;

/// One of the three digest families defined for the OTP system.
///
/// Each algorithm has a stable numeric id and a lowercase name, and maps to
/// a pair of pure primitives: [`fold`](Algorithm::fold) collapses a digest
/// of `seed || password` to 64 bits, and [`cycle`](Algorithm::cycle) walks
/// the hash chain by hashing and re-folding the 8-byte value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Md4,
    Md5,
    Sha1,
}

impl Algorithm {
    pub const fn id(self) -> u32 {
        match self {
            Algorithm::Md4 => 0,
            Algorithm::Md5 => 1,
            Algorithm::Sha1 => 2,
        }
    }

    pub fn from_id(id: u32) -> Result<Algorithm> {
        match id {
            0 => Ok(Algorithm::Md4),
            1 => Ok(Algorithm::Md5),
            2 => Ok(Algorithm::Sha1),
            other => Err(Error::UnsupportedAlgorithm(other.to_string())),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Algorithm::Md4 => "md4",
            Algorithm::Md5 => "md5",
            Algorithm::Sha1 => "sha1",
        }
    }

    pub fn from_name(name: &str) -> Result<Algorithm> {
        match name {
            "md4" => Ok(Algorithm::Md4),
            "md5" => Ok(Algorithm::Md5),
            "sha1" => Ok(Algorithm::Sha1),
            other => Err(Error::UnsupportedAlgorithm(other.to_owned())),
        }
    }

    /// Digests `seed || password` (no separator) and folds the result to the
    /// 64-bit root of the hash chain.
    ///
    /// The seed must already be normalized; [`calculate`](crate::calculate)
    /// lowercases and validates it exactly once before calling this.
    pub fn fold(self, seed: &str, password: &str) -> OtpValue {
        let value = match self {
            Algorithm::Md4 => {
                let mut h = Md4::new();
                h.update(seed.as_bytes());
                h.update(password.as_bytes());
                fold16(&h.finalize().into())
            }
            Algorithm::Md5 => fold16(&md5::compute([seed, password].concat()).0),
            Algorithm::Sha1 => {
                let mut h = sha1_smol::Sha1::new();
                h.update(seed.as_bytes());
                h.update(password.as_bytes());
                fold20(&h.digest().bytes())
            }
        };
        OtpValue::from_bytes(value)
    }

    /// Applies `n` steps of hash-then-fold to `value`, moving `n` positions
    /// down the hash chain. `cycle(v, 0)` is the identity, and
    /// `cycle(cycle(v, a), b) == cycle(v, a + b)`.
    pub fn cycle(self, value: OtpValue, n: u32) -> OtpValue {
        let mut cur = value.to_bytes();
        match self {
            Algorithm::Md4 => {
                for _ in 0..n {
                    let mut h = Md4::new();
                    h.update(cur);
                    cur = fold16(&h.finalize().into());
                }
            }
            Algorithm::Md5 => {
                for _ in 0..n {
                    cur = fold16(&md5::compute(cur).0);
                }
            }
            Algorithm::Sha1 => {
                for _ in 0..n {
                    let mut h = sha1_smol::Sha1::new();
                    h.update(&cur);
                    cur = fold20(&h.digest().bytes());
                }
            }
        }
        OtpValue::from_bytes(cur)
    }
}

/// Folds a 16-byte MD4/MD5 digest to 8 bytes: XOR of the two halves
/// (RFC 2289 Appendix A).
fn fold16(digest: &[u8; 16]) -> [u8; 8] {
    let mut out = [0u8; 8];
    for i in 0..8 {
        out[i] = digest[i] ^ digest[i + 8];
    }
    out
}

/// Folds a 20-byte SHA1 digest to 8 bytes.
///
/// The trailing 4 bytes wrap around into the front of the fold, and each
/// 32-bit half is then byte-swapped: Appendix A's reference code folds SHA1
/// as five native `uint32` words, so a byte-oriented fold must swap to land
/// on the same bit layout.
fn fold20(digest: &[u8; 20]) -> [u8; 8] {
    let mut out = [0u8; 8];
    for i in 0..8 {
        out[i] = digest[i] ^ digest[i + 8];
    }
    for i in 0..4 {
        out[i] ^= digest[i + 16];
    }
    out.swap(0, 3);
    out.swap(1, 2);
    out.swap(4, 7);
    out.swap(5, 6);
    out
}
