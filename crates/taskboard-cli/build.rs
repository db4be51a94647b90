use std::process::Command;

const COMMIT_VAR: &str = "TASKBOARD_BUILD_COMMIT";

/// Run git and return its trimmed stdout, or `None` outside a checkout.
fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    Some(text.trim().to_string())
}

fn build_commit() -> String {
    if let Ok(pinned) = std::env::var(COMMIT_VAR) {
        if !pinned.trim().is_empty() {
            return pinned.trim().to_string();
        }
    }

    let Some(short) = git(&["rev-parse", "--short=10", "HEAD"]) else {
        return "unknown".to_string();
    };
    let dirty = git(&["status", "--porcelain", "--untracked-files=no"])
        .is_some_and(|status| !status.is_empty());
    if dirty {
        format!("{}-dirty", short)
    } else {
        short
    }
}

fn main() {
    println!("cargo::rerun-if-changed=../../.git/HEAD");
    println!("cargo::rerun-if-changed=../../.git/index");
    println!("cargo::rerun-if-env-changed={}", COMMIT_VAR);
    println!("cargo::rustc-env={}={}", COMMIT_VAR, build_commit());
}
