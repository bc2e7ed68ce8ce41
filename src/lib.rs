//! # S/Key One-Time Passwords
//!
//! Implements the S/Key one-time-password scheme described in
//! [IETF RFC 2289](https://www.rfc-editor.org/rfc/rfc2289.html): each login
//! consumes a single-use password drawn from a hash chain, so a captured
//! password cannot be replayed. The crate has two halves:
//!
//! - the **computation engine** — [`calculate`] derives the 64-bit OTP value
//!   for any position in a chain using one of the three RFC algorithms
//!   ([`Algorithm`]), and renders it as grouped hex and as the six-word
//!   mnemonic encoding over the RFC 1760 dictionary;
//! - the **credential store** — [`UserDb`] keeps per-user
//!   challenge/response records in a flat text file, guarded by an
//!   exclusive cross-process lock and rewritten atomically, and implements
//!   the lock-step challenge/verify/advance protocol of RFC 2289 section
//!   7.0.
//!
//! This algorithm is **not** the TOTP/HOTP family in wide use for
//! multifactor authentication today; those live in other RFCs.
//!
//! ## Security
//!
//! The three hash algorithms the RFC defines — MD4, MD5, SHA1 — are all
//! long broken for general use. The way the OTP scheme uses them (a fixed
//! number of iterated, folded digests over a passphrase) is less exposed
//! than raw collision resistance, but treat the whole scheme as legacy
//! interoperability, not as a modern authenticator.
//!
//! ## Generating
//!
//! A verifier hands you a challenge line; parse it and answer:
//!
//! ```
//! let challenge = skey::Challenge::parse("otp-md5 99 TeSt").unwrap();
//! let response = skey::calculate(
//!     challenge.algorithm,
//!     challenge.sequence,
//!     &challenge.seed,
//!     "This is a test.",
//! ).unwrap();
//! assert_eq!(response.hex, "50FE 1962 C496 5880");
//! assert_eq!(response.words, "BAIL TUFT BITS GANG CHEF THY");
//! ```
//!
//! Either rendering (or any mix of case and spacing the codecs tolerate)
//! is an acceptable reply; [`decode_reply`] recovers the value.
//!
//! ## Verifying
//!
//! The store owns the authoritative state. A session brackets the
//! cross-process lock:
//!
//! ```no_run
//! use skey::UserDb;
//!
//! let mut db = UserDb::open("/var/db/skeys")?;
//! let challenge = db.get_challenge("paul")?.to_string();
//! // ... send the challenge to the user, read back their reply ...
//! # let reply = String::new();
//! db.verify("paul", &challenge, &reply)?;
//! db.close();
//! # Ok::<(), skey::Error>(())
//! ```
//!
//! On success the stored sequence has moved one step down the chain, so an
//! observed reply is never accepted twice.

mod alg;
mod calc;
mod challenge;
mod codec;
mod dict;
mod error;
mod userdb;
mod value;

pub use crate::alg::Algorithm;
pub use crate::calc::{calculate, Response};
pub use crate::challenge::Challenge;
pub use crate::codec::{decode_hex, decode_reply, decode_words, format_hex, format_words};
pub use crate::dict::STANDARD_DICTIONARY;
pub use crate::error::{Error, Result};
pub use crate::userdb::UserDb;
pub use crate::value::OtpValue;
