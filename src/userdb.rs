//! The authoritative user credential store.
//!
//! One text file holds a line per user (`username sequence seed last-reply
//! date`), guarded across processes by an exclusive advisory lock on a
//! sidecar `<path>.lock` file and rewritten atomically through a rename.
//! The lock is held for the whole life of a [`UserDb`] handle, which may
//! span a [`get_challenge`](UserDb::get_challenge) and a later
//! [`verify`](UserDb::verify); all users of a store serialize behind it.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use fs2::FileExt;
use log::{debug, warn};
use tempfile::NamedTempFile;

use crate::alg::Algorithm;
use crate::challenge::Challenge;
use crate::codec;
use crate::error::{Error, Result};
use crate::value::OtpValue;

/// A user's stored state: the last *accepted* sequence/reply pair.
struct UserRecord {
    username: String,
    sequence: u32,
    seed: String,
    last_reply: String,
}

/// An open credential store.
///
/// Opening takes the cross-process lock; dropping (or the explicit
/// [`close`](UserDb::close)) releases it on every exit path. A handle is
/// meant to be driven by a single logical flow at a time; operations are
/// sequential and blocking, with no internal timeouts.
pub struct UserDb {
    path: PathBuf,
    lock_path: PathBuf,
    lock: File,
    file: File,
}

impl UserDb {
    /// Opens (creating if absent) the store at `path`.
    ///
    /// Blocks until the exclusive advisory lock on `<path>.lock` can be
    /// acquired — indefinitely, if another process holds it and never
    /// closes. Re-opening is simply dropping one handle and opening
    /// another.
    pub fn open(path: impl AsRef<Path>) -> Result<UserDb> {
        let path = path.as_ref().to_path_buf();
        let mut lock_path = path.clone().into_os_string();
        lock_path.push(".lock");
        let lock_path = PathBuf::from(lock_path);

        let lock = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&lock_path)
            .map_err(|source| Error::Lock { path: lock_path.clone(), source })?;
        lock.lock_exclusive()
            .map_err(|source| Error::Lock { path: lock_path.clone(), source })?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)
            .map_err(|source| Error::StoreOpen { path: path.clone(), source })?;

        debug!("opened user database {}", path.display());
        Ok(UserDb { path, lock_path, lock, file })
    }

    /// Closes the store, releasing the lock. Dropping the handle does the
    /// same; this form just names the intent.
    pub fn close(self) {}

    /// Returns the challenge the named user must answer next:
    /// one sequence step below the last accepted one, with the stored seed.
    pub fn get_challenge(&mut self, username: &str) -> Result<Challenge> {
        let user = self.find_user(username)?;
        Ok(Challenge {
            algorithm: Algorithm::Md5,
            sequence: user.sequence.wrapping_sub(1),
            seed: user.seed,
        })
    }

    /// Verifies a reply against a previously issued challenge and, on
    /// success, advances the stored state.
    ///
    /// RFC 2289 section 7.0: the server decodes the received one-time
    /// password into a 64-bit key, runs it through the hash function once,
    /// and compares against the stored previous OTP; on a match the
    /// accepted value is stored for future use. Verification is hard-wired
    /// to md5. The challenge must still match the stored record (same
    /// seed, sequence exactly one below), so a stale challenge/response
    /// pair is rejected before any cryptography.
    ///
    /// The store is rewritten atomically only on success; on any error the
    /// on-disk state is unchanged.
    pub fn verify(&mut self, username: &str, challenge: &str, reply: &str) -> Result<()> {
        let mut user = self.find_user(username)?;
        let ch = Challenge::parse(challenge)?;
        require_md5(&ch)?;

        if ch.seed != user.seed {
            return Err(Error::SeedMismatch);
        }
        if ch.sequence != user.sequence.wrapping_sub(1) {
            return Err(Error::SequenceMismatch);
        }

        let r = codec::decode_reply(reply);
        let advanced = Algorithm::Md5.cycle(r, 1);
        let last = codec::decode_hex(&user.last_reply);
        if advanced != last {
            return Err(Error::InvalidResponse);
        }

        user.sequence = user.sequence.wrapping_sub(1);
        self.update(&user, r)
    }

    /// Writes a (re-)enrollment record for `username` from a challenge and
    /// its reply.
    ///
    /// Unlike [`verify`](UserDb::verify) there is no consistency check
    /// against an existing record: this is how a fresh record is created,
    /// and saving over an existing user silently replaces their state.
    pub fn save(&mut self, username: &str, challenge: &str, reply: &str) -> Result<()> {
        let r = codec::decode_reply(reply);
        let ch = Challenge::parse(challenge)?;
        require_md5(&ch)?;

        let user = UserRecord {
            username: username.to_owned(),
            sequence: ch.sequence,
            seed: ch.seed,
            last_reply: String::new(),
        };
        self.update(&user, r)
    }

    /// Scans the store for the first line whose first field is exactly
    /// `username`. Lines that are blank or start with `#` or whitespace
    /// are ignored. Only the first four fields are parsed; the trailing
    /// date is never read back.
    fn find_user(&mut self, username: &str) -> Result<UserRecord> {
        self.file.seek(SeekFrom::Start(0))?;
        let reader = BufReader::new(&self.file);
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.is_empty()
                || line.starts_with('#')
                || line.starts_with(char::is_whitespace)
            {
                continue;
            }
            let lineno = idx + 1;
            let mut fields = line.split_whitespace();
            match fields.next() {
                Some(name) if name == username => {}
                _ => continue,
            }
            let corrupted = || Error::StoreCorrupted { line: lineno };
            let sequence = fields
                .next()
                .ok_or_else(corrupted)?
                .parse::<u32>()
                .map_err(|_| corrupted())?;
            let seed = fields.next().ok_or_else(corrupted)?.to_owned();
            let last_reply = fields.next().ok_or_else(corrupted)?.to_owned();
            return Ok(UserRecord {
                username: username.to_owned(),
                sequence,
                seed,
                last_reply,
            });
        }
        Err(Error::UserNotFound(username.to_owned()))
    }

    /// Rewrites the store with a fresh line for `user`, atomically.
    ///
    /// A full replacement file is written next to the store and renamed
    /// over it; the rename is the only durability boundary, so a reader
    /// never sees a half-written store and a failure before the rename
    /// leaves the original untouched. Lines are kept by a raw prefix
    /// compare against the username, as the original database tools did:
    /// a username that prefixes another ("bob", "bob2") will claim that
    /// line too.
    fn update(&mut self, user: &UserRecord, reply: OtpValue) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(Error::Write)?;

        let record = format_record(user, reply);
        let mut found = false;

        self.file.seek(SeekFrom::Start(0))?;
        let reader = BufReader::new(&self.file);
        for line in reader.lines() {
            let line = line?;
            if line.starts_with(user.username.as_str()) {
                if !found {
                    writeln!(tmp, "{record}").map_err(Error::Write)?;
                    found = true;
                }
                continue;
            }
            writeln!(tmp, "{line}").map_err(Error::Write)?;
        }
        if !found {
            writeln!(tmp, "{record}").map_err(Error::Write)?;
        }

        let file = tmp.persist(&self.path).map_err(|e| Error::Write(e.error))?;
        // Point the handle at the replacement so later reads through this
        // session observe the new state.
        self.file = file;
        debug!("updated user database entry for {}", user.username);
        Ok(())
    }
}

impl Drop for UserDb {
    fn drop(&mut self) {
        if let Err(e) = self.lock.unlock() {
            warn!("failed to unlock {}: {e}", self.lock_path.display());
        }
        debug!("closed user database {}", self.path.display());
    }
}

fn require_md5(ch: &Challenge) -> Result<()> {
    if ch.algorithm != Algorithm::Md5 {
        return Err(Error::UnsupportedAlgorithm(format!(
            "only md5 verification is supported, got {}",
            ch.algorithm.name()
        )));
    }
    Ok(())
}

/// One store line: `username sequence seed last-reply date`, with the
/// sequence zero-padded to four digits and the 16-digit uppercase hex
/// reply right-aligned in a 24-character field.
fn format_record(user: &UserRecord, reply: OtpValue) -> String {
    let date = Local::now().format("%b %d,%Y %H:%M:%S");
    format!(
        "{} {:04} {} {:>24}  {}",
        user.username,
        user.sequence,
        user.seed,
        hex::encode_upper(reply.as_bytes()),
        date
    )
}
