//! Single-use MFA backup codes.
//!
//! Codes are eight characters from `[0-9A-Z]`, drawn from the OS CSPRNG. They
//! carry no expiry; an exhausted list simply never matches until a new batch
//! is issued.

use std::collections::HashSet;

use rand::rngs::OsRng;
use rand::Rng;

use crate::subject::Subject;

pub const DEFAULT_BACKUP_CODE_COUNT: usize = 10;

const CODE_LEN: usize = 8;
const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..CODE_LEN)
        .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
        .collect()
}

/// Byte comparison whose running time depends only on the lengths.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let diff = a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y));
    std::hint::black_box(diff) == 0
}

/// Index of the first stored code equal to `code`. Every entry is compared.
fn find_code(stored: &[String], code: &str) -> Option<usize> {
    let mut found = None;
    for (index, candidate) in stored.iter().enumerate() {
        let matched = constant_time_eq(candidate.as_bytes(), code.as_bytes());
        if matched && found.is_none() {
            found = Some(index);
        }
    }
    found
}

/// `count` fresh, mutually distinct codes.
pub fn issue_backup_codes(count: usize) -> Vec<String> {
    let mut rng = OsRng;
    let mut seen = HashSet::with_capacity(count);
    let mut codes = Vec::with_capacity(count);
    while codes.len() < count {
        let code = generate_code(&mut rng);
        if seen.insert(code.clone()) {
            codes.push(code);
        }
    }
    codes
}

/// Replace the subject's codes with a fresh batch. Prior unused codes stop
/// working. Returns the updated subject and the new codes (shown to the user
/// once).
pub fn issue_for(mut subject: Subject, count: usize) -> (Subject, Vec<String>) {
    let codes = issue_backup_codes(count);
    subject.mfa_backup_codes = codes.clone();
    tracing::info!(subject_id = %subject.id, count, "issued mfa backup codes");
    (subject, codes)
}

/// Try to spend `code`.
///
/// On a match exactly one entry is removed and `true` is returned. A wrong
/// code and an exhausted list both return `false` with the subject unchanged;
/// callers must not tell the two apart.
pub fn consume_backup_code(mut subject: Subject, code: &str) -> (bool, Subject) {
    match find_code(&subject.mfa_backup_codes, code) {
        Some(index) => {
            subject.mfa_backup_codes.remove(index);
            tracing::info!(
                subject_id = %subject.id,
                "mfa backup code consumed"
            );
            (true, subject)
        }
        None => {
            tracing::debug!(subject_id = %subject.id, "mfa backup code rejected");
            (false, subject)
        }
    }
}

/// Unused codes left. For account settings pages only, never for the login
/// challenge.
pub fn remaining(subject: &Subject) -> usize {
    subject.mfa_backup_codes.len()
}
