//! Conversions between an [`OtpValue`] and its two human-transcribable
//! renderings: grouped hexadecimal and the RFC 2289 six-word encoding.

use cow_utils::CowUtils;

use crate::dict::STANDARD_DICTIONARY;
use crate::error::{Error, Result};
use crate::value::OtpValue;

/// Renders a value as 16 uppercase hex digits in four space-separated
/// groups, e.g. `D185 4218 EBBB 0B51`.
pub fn format_hex(value: OtpValue) -> String {
    let hex = hex::encode_upper(value.as_bytes());
    format!("{} {} {} {}", &hex[0..4], &hex[4..8], &hex[8..12], &hex[12..16])
}

/// Decodes hexadecimal text into a value.
///
/// This decoder is deliberately lenient: it accumulates nibble by nibble
/// and skips every non-hex character, so embedded spaces and punctuation
/// are tolerated and no input is ever rejected. Arbitrary garbage therefore
/// still decodes to *some* value; callers rely on the subsequent
/// cryptographic comparison, not this function, to reject bad replies.
pub fn decode_hex(input: &str) -> OtpValue {
    let mut v: u64 = 0;
    for ch in input.chars() {
        if let Some(nibble) = ch.to_digit(16) {
            v = (v << 4) | u64::from(nibble);
        }
    }
    OtpValue::from_u64(v)
}

/// Renders a value as six space-separated dictionary words with the 2-bit
/// checksum folded into the last word, e.g. `ROME MUG FRED SCAN LIVE LACE`.
pub fn format_words(value: OtpValue) -> String {
    encode_words(value).join(" ")
}

/// RFC 2289 section 6.0: break the 64 bits into pairs, sum the pairs, and
/// keep the two low-order bits of the sum.
fn checksum(value: OtpValue) -> u64 {
    let sum: u64 = value
        .as_bytes()
        .iter()
        .map(|&b| {
            let b = u64::from(b);
            (b & 0b11) + ((b >> 2) & 0b11) + ((b >> 4) & 0b11) + ((b >> 6) & 0b11)
        })
        .sum();
    sum & 0b11
}

/// The six dictionary words for a value: five 11-bit groups from the top of
/// the 64 bits, then the remaining 9 bits with the checksum appended.
fn encode_words(value: OtpValue) -> [&'static str; 6] {
    let v = value.to_u64();
    let mut words = [""; 6];
    for (i, word) in words.iter_mut().take(5).enumerate() {
        let index = (v >> (64 - 11 * (i + 1))) & 0x7FF;
        *word = STANDARD_DICTIONARY[index as usize];
    }
    let index = ((v & 0x1FF) << 2) | checksum(value);
    words[5] = STANDARD_DICTIONARY[index as usize];
    words
}

fn word_index(word: &str) -> Option<u64> {
    let upper = word.cow_to_ascii_uppercase();
    STANDARD_DICTIONARY
        .iter()
        .position(|w| *w == upper)
        .map(|i| i as u64)
}

/// Decodes a six-word encoding back into a value.
///
/// Words are matched against the standard dictionary independent of case.
/// Fails with [`Error::UnsupportedEncoding`] unless the input is exactly
/// six dictionary words whose embedded checksum verifies.
pub fn decode_words(input: &str) -> Result<OtpValue> {
    let mut words = input.split_ascii_whitespace();
    let mut v: u64 = 0;
    for _ in 0..5 {
        let word = words.next().ok_or(Error::UnsupportedEncoding)?;
        v = (v << 11) | word_index(word).ok_or(Error::UnsupportedEncoding)?;
    }
    let last = words.next().ok_or(Error::UnsupportedEncoding)?;
    let last = word_index(last).ok_or(Error::UnsupportedEncoding)?;
    if words.next().is_some() {
        return Err(Error::UnsupportedEncoding);
    }
    // The last word carries 9 value bits plus the 2-bit checksum.
    let value = OtpValue::from_u64((v << 9) | (last >> 2));
    if checksum(value) != (last & 0b11) {
        return Err(Error::UnsupportedEncoding);
    }
    Ok(value)
}

/// Decodes a reply in whichever rendering it arrives in.
///
/// RFC 2289 section 6.0, "Form of Output": a valid six-word encoding is
/// accepted first; anything else falls through to the hex decoder. Since
/// [`decode_hex`] never fails, every input yields some value — rejection of
/// a wrong one happens at the comparison stage.
pub fn decode_reply(input: &str) -> OtpValue {
    decode_words(input).unwrap_or_else(|_| decode_hex(input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_format_is_grouped_uppercase() {
        let v = OtpValue::from_u64(0xD185_4218_EBBB_0B51);
        assert_eq!(format_hex(v), "D185 4218 EBBB 0B51");
        assert_eq!(format_hex(OtpValue::from_u64(0)), "0000 0000 0000 0000");
    }

    #[test]
    fn hex_round_trips() {
        for v in [0u64, 0x9E87_6134_D904_99DD, u64::MAX] {
            let v = OtpValue::from_u64(v);
            assert_eq!(decode_hex(&format_hex(v)), v);
        }
    }

    #[test]
    fn hex_decode_skips_non_hex_characters() {
        assert_eq!(
            decode_hex("5Bf0 75d9 959d 036f"),
            OtpValue::from_u64(0x5BF0_75D9_959D_036F)
        );
        assert_eq!(
            decode_hex("zz12-34!56 78 9a:bc de f0"),
            OtpValue::from_u64(0x1234_5678_9ABC_DEF0)
        );
    }

    #[test]
    fn words_round_trip() {
        let v = OtpValue::from_u64(0x4F29_6A74_FE15_67EC);
        let words = format_words(v);
        assert_eq!(words, "AURA ALOE HURL WING BERG WAIT");
        assert_eq!(decode_words(&words).unwrap(), v);
    }

    #[test]
    fn word_decode_is_case_insensitive() {
        let v = OtpValue::from_u64(0x4F29_6A74_FE15_67EC);
        assert_eq!(decode_words("aura aloe hurl wing berg wait").unwrap(), v);
    }

    #[test]
    fn word_decode_rejects_bad_input() {
        // wrong word count
        assert!(decode_words("AURA ALOE HURL WING BERG").is_err());
        assert!(decode_words("AURA ALOE HURL WING BERG WAIT WAIT").is_err());
        // not a dictionary word
        assert!(decode_words("AURA ALOE HURL WING BERG XYZZY").is_err());
        // checksum broken by tampering with a word
        assert!(decode_words("AURA ALOE HURL WING BERG MUG").is_err());
        assert!(decode_words("ALOE AURA HURL WING BERG WAIT").is_err());
    }

    #[test]
    fn reply_decode_prefers_words_then_falls_back_to_hex() {
        let v = OtpValue::from_u64(0x9E87_6134_D904_99DD);
        assert_eq!(decode_reply(&format_words(v)), v);
        assert_eq!(decode_reply(&format_hex(v)), v);
        // not words, not clean hex — still yields a value
        assert_eq!(decode_reply("not a password"), decode_hex("not a password"));
    }
}
