//! The challenge a verifier presents to a generator.

use std::fmt;

use crate::alg::Algorithm;
use crate::error::{Error, Result};

/// A parsed OTP challenge: the algorithm, hash-chain position and seed a
/// generator needs to compute the next response.
///
/// The wire form is a single ASCII line, `otp-<alg> <sequence> <seed>`,
/// e.g. `otp-md5 487 dog2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub algorithm: Algorithm,
    pub sequence: u32,
    pub seed: String,
}

/// The smallest a challenge can be: `otp-md4 0 a`.
const MIN_LEN: usize = 11;
/// Upper bound to reject outrageous input outright.
const MAX_LEN: usize = 128;

impl Challenge {
    /// Parses the `otp-<alg> <sequence> <seed>` wire form.
    ///
    /// Anything after the seed token is ignored. Fails with
    /// [`Error::MalformedChallenge`] when the prefix or a field is missing
    /// and [`Error::UnsupportedAlgorithm`] for an unknown algorithm name.
    pub fn parse(input: &str) -> Result<Challenge> {
        if input.len() < MIN_LEN || input.len() > MAX_LEN {
            return Err(Error::MalformedChallenge("challenge length out of range"));
        }
        let rest = input
            .strip_prefix("otp-")
            .ok_or(Error::MalformedChallenge("missing otp- prefix"))?;

        let mut tokens = rest.split_ascii_whitespace();
        let algorithm = Algorithm::from_name(
            tokens
                .next()
                .ok_or(Error::MalformedChallenge("missing algorithm"))?,
        )?;
        let sequence = tokens
            .next()
            .ok_or(Error::MalformedChallenge("missing sequence"))?
            .parse::<u32>()
            .map_err(|_| Error::MalformedChallenge("sequence is not a decimal number"))?;
        let seed = tokens
            .next()
            .ok_or(Error::MalformedChallenge("missing seed"))?;

        Ok(Challenge {
            algorithm,
            sequence,
            seed: seed.to_owned(),
        })
    }
}

impl fmt::Display for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "otp-{} {} {}", self.algorithm.name(), self.sequence, self.seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_challenge() {
        let ch = Challenge::parse("otp-md5 487 dog2").unwrap();
        assert_eq!(ch.algorithm, Algorithm::Md5);
        assert_eq!(ch.sequence, 487);
        assert_eq!(ch.seed, "dog2");
    }

    #[test]
    fn display_emits_the_wire_form() {
        let ch = Challenge::parse("otp-sha1 99 TeSt").unwrap();
        assert_eq!(ch.to_string(), "otp-sha1 99 TeSt");
    }

    #[test]
    fn trailing_tokens_are_ignored() {
        let ch = Challenge::parse("otp-md5 499 ke1234 ext").unwrap();
        assert_eq!(ch.seed, "ke1234");
    }

    #[test]
    fn rejects_malformed_input() {
        for bad in [
            "",
            "otp-md5 1",
            "md5 487 dog2",
            "otp-md5 notanumber dog2",
            "otp-md5  487", // sequence but no seed
        ] {
            assert!(matches!(
                Challenge::parse(bad),
                Err(Error::MalformedChallenge(_))
            ));
        }
    }

    #[test]
    fn rejects_unknown_algorithms() {
        assert!(matches!(
            Challenge::parse("otp-sha256 487 dog2"),
            Err(Error::UnsupportedAlgorithm(_))
        ));
    }
}
