//! Credential store scenarios: enrollment, the lock-step verify protocol,
//! atomicity of rejected updates, and cross-handle lock serialization.

use std::fs;
use std::thread;
use std::time::{Duration, Instant};

use skey::{calculate, Algorithm, Error, Response, UserDb};
use tempfile::tempdir;

const PASSWORD: &str = "This is a test.";
const SEED: &str = "TeSt";

fn response_at(sequence: u32) -> Response {
    calculate(Algorithm::Md5, sequence, SEED, PASSWORD).unwrap()
}

/// Enrolls `user` at sequence 99 in a fresh store and returns the open db.
fn enroll(db: &mut UserDb, user: &str) {
    let r = response_at(99);
    db.save(user, "otp-md5 99 TeSt", &r.words).unwrap();
}

#[test]
fn save_then_get_challenge_steps_down() {
    let dir = tempdir().unwrap();
    let mut db = UserDb::open(dir.path().join("users")).unwrap();
    enroll(&mut db, "paul");

    let ch = db.get_challenge("paul").unwrap();
    assert_eq!(ch.algorithm, Algorithm::Md5);
    assert_eq!(ch.sequence, 98);
    assert_eq!(ch.seed, SEED);
    assert_eq!(ch.to_string(), "otp-md5 98 TeSt");
}

#[test]
fn verify_advances_in_lock_step() {
    let dir = tempdir().unwrap();
    let mut db = UserDb::open(dir.path().join("users")).unwrap();
    enroll(&mut db, "paul");

    // answer the challenge at 98 in hex
    let ch = db.get_challenge("paul").unwrap().to_string();
    db.verify("paul", &ch, &response_at(98).hex).unwrap();

    // the chain moved: next challenge is 97, answer it in words
    let ch = db.get_challenge("paul").unwrap();
    assert_eq!(ch.sequence, 97);
    db.verify("paul", &ch.to_string(), &response_at(97).words).unwrap();

    assert_eq!(db.get_challenge("paul").unwrap().sequence, 96);
}

#[test]
fn replayed_response_is_rejected() {
    let dir = tempdir().unwrap();
    let mut db = UserDb::open(dir.path().join("users")).unwrap();
    enroll(&mut db, "paul");

    let ch = db.get_challenge("paul").unwrap().to_string();
    let reply = response_at(98).hex;
    db.verify("paul", &ch, &reply).unwrap();

    // same challenge/response pair again: the stored sequence has moved on
    assert!(matches!(
        db.verify("paul", &ch, &reply),
        Err(Error::SequenceMismatch)
    ));
}

#[test]
fn invalid_response_leaves_store_bytes_untouched() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("users");
    let mut db = UserDb::open(&path).unwrap();
    enroll(&mut db, "paul");

    let before = fs::read(&path).unwrap();
    let ch = db.get_challenge("paul").unwrap().to_string();
    assert!(matches!(
        db.verify("paul", &ch, "1111 2222 3333 4444"),
        Err(Error::InvalidResponse)
    ));
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn stale_challenges_are_rejected() {
    let dir = tempdir().unwrap();
    let mut db = UserDb::open(dir.path().join("users")).unwrap();
    enroll(&mut db, "paul");
    let reply = response_at(98).hex;

    assert!(matches!(
        db.verify("paul", "otp-md5 98 other1", &reply),
        Err(Error::SeedMismatch)
    ));
    assert!(matches!(
        db.verify("paul", "otp-md5 97 TeSt", &reply),
        Err(Error::SequenceMismatch)
    ));
}

#[test]
fn verification_is_md5_only() {
    let dir = tempdir().unwrap();
    let mut db = UserDb::open(dir.path().join("users")).unwrap();
    enroll(&mut db, "paul");

    assert!(matches!(
        db.verify("paul", "otp-sha1 98 TeSt", &response_at(98).hex),
        Err(Error::UnsupportedAlgorithm(_))
    ));
    assert!(matches!(
        db.verify("paul", "md5 98 TeSt", "whatever"),
        Err(Error::MalformedChallenge(_))
    ));
}

#[test]
fn unknown_users_are_reported() {
    let dir = tempdir().unwrap();
    let mut db = UserDb::open(dir.path().join("users")).unwrap();
    assert!(matches!(
        db.get_challenge("nobody"),
        Err(Error::UserNotFound(_))
    ));
}

#[test]
fn short_record_lines_report_the_line_number() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("users");
    fs::write(&path, "# comment line\npaul 0099\n").unwrap();

    let mut db = UserDb::open(&path).unwrap();
    match db.get_challenge("paul") {
        Err(Error::StoreCorrupted { line }) => assert_eq!(line, 2),
        other => panic!("expected StoreCorrupted, got {other:?}"),
    }
}

#[test]
fn rewrite_preserves_comments_and_other_users() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("users");
    let alice = "alice 0100 al9999         AAAABBBBCCCCDDDD  Mar 04,2009 21:45:09";
    fs::write(&path, format!("# one-time-password users\n{alice}\n")).unwrap();

    let mut db = UserDb::open(&path).unwrap();
    enroll(&mut db, "paul");

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "# one-time-password users");
    assert_eq!(lines[1], alice);
    assert!(lines[2].starts_with("paul 0099 TeSt "));
    assert_eq!(lines.len(), 3);
}

#[test]
fn save_overwrites_an_existing_record() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("users");
    let mut db = UserDb::open(&path).unwrap();
    enroll(&mut db, "paul");

    // re-enrollment on a fresh chain silently replaces the old state
    let r = calculate(Algorithm::Md5, 499, "ke1234", PASSWORD).unwrap();
    db.save("paul", "otp-md5 499 ke1234", &r.hex).unwrap();

    let ch = db.get_challenge("paul").unwrap();
    assert_eq!(ch.sequence, 498);
    assert_eq!(ch.seed, "ke1234");

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().filter(|l| l.starts_with("paul")).count(), 1);
}

#[test]
fn open_serializes_across_handles() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("users");
    let db = UserDb::open(&path).unwrap();

    let path2 = path.clone();
    let t0 = Instant::now();
    let second = thread::spawn(move || {
        let db2 = UserDb::open(&path2).unwrap();
        db2.close();
        t0.elapsed()
    });

    thread::sleep(Duration::from_millis(300));
    db.close();
    let waited = second.join().unwrap();
    assert!(
        waited >= Duration::from_millis(250),
        "second open returned after {waited:?} without waiting for the first to close"
    );
}
