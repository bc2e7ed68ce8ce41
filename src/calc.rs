//! The OTP computation engine: validate, fold, cycle, render.

use std::borrow::Cow;

use cow_utils::CowUtils;

use crate::alg::Algorithm;
use crate::codec;
use crate::error::{Error, Result};
use crate::value::OtpValue;

/// A computed one-time password together with both of its renderings.
///
/// Built once per computation by [`calculate`]; the renderings always agree
/// with [`value`](Response::value).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// The 64-bit OTP value.
    pub value: OtpValue,
    /// `XXXX XXXX XXXX XXXX` — grouped uppercase hex.
    pub hex: String,
    /// Six space-separated dictionary words.
    pub words: String,
}

/// Lowercases a seed and checks it against RFC 2289 section 6.0: purely
/// alphanumeric, one to 16 characters.
///
/// Normalization happens here, exactly once, before any hashing; the
/// result of normalizing twice equals normalizing once.
pub(crate) fn normalize_seed(seed: &str) -> Result<Cow<'_, str>> {
    let seed = seed.cow_to_ascii_lowercase();
    if !(1..=16).contains(&seed.len()) || !seed.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(Error::InvalidSeed {
            length: seed.len(),
            seed: seed.into_owned(),
        });
    }
    Ok(seed)
}

/// Computes the one-time password for a position in a hash chain.
///
/// The seed is normalized to lowercase and validated, the chain's root key
/// is derived from `seed || password`, and the key is cycled `sequence`
/// steps. The returned [`Response`] carries the value plus its hex and
/// six-word renderings.
///
/// ```
/// use skey::Algorithm;
///
/// let response = skey::calculate(Algorithm::Md5, 99, "TeSt", "This is a test.").unwrap();
/// assert_eq!(response.hex, "50FE 1962 C496 5880");
/// assert_eq!(response.words, "BAIL TUFT BITS GANG CHEF THY");
/// ```
pub fn calculate(
    algorithm: Algorithm,
    sequence: u32,
    seed: &str,
    password: &str,
) -> Result<Response> {
    let seed = normalize_seed(seed)?;
    let key = algorithm.fold(&seed, password);
    let value = algorithm.cycle(key, sequence);
    Ok(Response {
        value,
        hex: codec::format_hex(value),
        words: codec::format_words(value),
    })
}
