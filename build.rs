//! Stamps `aichat --version` with the commit it was built from and when.

use std::env;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");

    let commit = commit().unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=AICHAT_GIT_SHA={commit}");
    println!("cargo:rustc-env=AICHAT_BUILD_TS={}", build_timestamp());
}

/// Short hash of `HEAD`, with `-dirty` appended when tracked files have edits.
fn commit() -> Option<String> {
    let sha = git(&["rev-parse", "--short", "HEAD"]).filter(|sha| !sha.is_empty())?;
    let dirty = git(&["status", "--porcelain", "--untracked-files=no"])
        .is_some_and(|changes| !changes.is_empty());
    Some(if dirty { format!("{sha}-dirty") } else { sha })
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|stdout| stdout.trim().to_string())
}

/// Seconds since the epoch. A numeric `SOURCE_DATE_EPOCH` wins for reproducible builds.
fn build_timestamp() -> u64 {
    env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_secs())
                .unwrap_or(0)
        })
}
