//! Sharded storage identifiers and directory walking.
//!
//! Referral records are stored under sharded directories derived from a
//! UUID. The canonical identifier form is **32 lowercase hexadecimal
//! characters** (no hyphens) — the output of
//! `Uuid::new_v4().simple().to_string()`.
//!
//! For a canonical id `u`, records live under:
//! `referrals/<u[0..2]>/<u[2..4]>/<u>/`
//!
//! Two levels of two-character shards keep fan-out bounded in any single
//! directory. Externally supplied identifiers (API path parameters, CLI
//! arguments) must be validated through [`RecordId::parse`]; uppercase,
//! hyphenated, or non-hex values are rejected.

use crate::{TriageError, TriageResult};
use std::fs;
use std::path::{Path, PathBuf};

/// A storage identifier guaranteed to be in canonical 32-hex form.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RecordId(String);

impl RecordId {
    /// Generates a fresh random identifier in canonical form.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Validates an externally supplied identifier.
    pub fn parse(input: &str) -> TriageResult<Self> {
        if input.len() != 32 || !input.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(TriageError::InvalidInput(format!(
                "identifier must be 32 lowercase hex characters, got {input:?}"
            )));
        }
        Ok(Self(input.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derives the sharded record directory under `parent`.
    pub fn shard_dir(&self, parent: &Path) -> PathBuf {
        parent.join(&self.0[0..2]).join(&self.0[2..4]).join(&self.0)
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Walks a sharded storage tree, yielding each record directory.
///
/// Traverses `<base>/<s1>/<s2>/<id>/` and invokes `visit` with the record
/// directory path. A missing base directory yields nothing: an empty store
/// is a normal state, not an error. Unreadable intermediate directories are
/// skipped.
pub fn walk_record_dirs(base: &Path, mut visit: impl FnMut(&Path)) {
    let s1_iter = match fs::read_dir(base) {
        Ok(it) => it,
        Err(_) => return,
    };
    for s1 in s1_iter.flatten() {
        let s1_path = s1.path();
        if !s1_path.is_dir() {
            continue;
        }
        let s2_iter = match fs::read_dir(&s1_path) {
            Ok(it) => it,
            Err(_) => continue,
        };
        for s2 in s2_iter.flatten() {
            let s2_path = s2.path();
            if !s2_path.is_dir() {
                continue;
            }
            let id_iter = match fs::read_dir(&s2_path) {
                Ok(it) => it,
                Err(_) => continue,
            };
            for id_ent in id_iter.flatten() {
                let id_path = id_ent.path();
                if id_path.is_dir() {
                    visit(&id_path);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_canonical() {
        let id = RecordId::generate();
        assert_eq!(id.as_str().len(), 32);
        RecordId::parse(id.as_str()).expect("generated id parses");
    }

    #[test]
    fn parse_rejects_non_canonical_forms() {
        for bad in [
            "550e8400-e29b-41d4-a716-446655440000", // hyphenated
            "550E8400E29B41D4A716446655440000",     // uppercase
            "550e8400",                             // too short
            "zzze8400e29b41d4a716446655440000",     // non-hex
        ] {
            assert!(RecordId::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn shard_dir_uses_two_level_prefix() {
        let id = RecordId::parse("550e8400e29b41d4a716446655440000").expect("parse");
        let dir = id.shard_dir(Path::new("/data/referrals"));
        assert_eq!(
            dir,
            Path::new("/data/referrals/55/0e/550e8400e29b41d4a716446655440000")
        );
    }

    #[test]
    fn walk_visits_each_record_dir() {
        let tmp = tempfile::tempdir().expect("tempdir");
        for _ in 0..3 {
            let id = RecordId::generate();
            fs::create_dir_all(id.shard_dir(tmp.path())).expect("mkdir");
        }
        let mut seen = 0;
        walk_record_dirs(tmp.path(), |_| seen += 1);
        assert_eq!(seen, 3);
    }

    #[test]
    fn walk_of_missing_base_is_empty() {
        let mut seen = 0;
        walk_record_dirs(Path::new("/definitely/not/here"), |_| seen += 1);
        assert_eq!(seen, 0);
    }
}
