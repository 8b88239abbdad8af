use std::process::Command;

fn git_short_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!value.is_empty()).then_some(value)
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=../.git/HEAD");
    println!("cargo:rerun-if-env-changed=PCAVIEW_COMMIT");

    // Release pipelines without a checkout pass the hash in explicitly.
    let commit = std::env::var("PCAVIEW_COMMIT")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .or_else(git_short_hash)
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=PCAVIEW_COMMIT={commit}");
}
