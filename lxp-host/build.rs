//! Build script for lxp-host
//!
//! Stamps the binaries with `GIT_HASH`, `BUILD_TIMESTAMP` and `BUILD_PROFILE`,
//! reported by `/health` and at startup.
//!
//! Source tarballs have no `.git`; packagers pass `LXP_GIT_HASH` instead.
//! `SOURCE_DATE_EPOCH` pins the timestamp (UTC) for reproducible builds,
//! otherwise it is the local build time.

use std::env;
use std::process::Command;

use chrono::{DateTime, Local, SecondsFormat};

fn git_hash() -> String {
    if let Ok(hash) = env::var("LXP_GIT_HASH") {
        if !hash.trim().is_empty() {
            return hash.trim().to_string();
        }
    }

    Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

fn build_timestamp() -> String {
    let pinned = env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|secs| secs.trim().parse::<i64>().ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0));

    match pinned {
        Some(ts) => ts.to_rfc3339_opts(SecondsFormat::Secs, true),
        None => Local::now().to_rfc3339_opts(SecondsFormat::Secs, false),
    }
}

fn main() {
    let profile = env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rustc-env=GIT_HASH={}", git_hash());
    println!("cargo:rustc-env=BUILD_TIMESTAMP={}", build_timestamp());
    println!("cargo:rustc-env=BUILD_PROFILE={}", profile);

    // Any rerun-if directive would stop the per-build rerun the timestamp needs.
}
