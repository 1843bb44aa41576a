use std::process::Command;

// Feeds long_version(): the short commit hash and target triple shown by
// `calscope --version`. Source tarballs have no .git, so both fall back
// to "unknown" rather than failing the build.
fn main() {
    println!("cargo:rerun-if-changed=../../.git/HEAD");
    println!("cargo:rerun-if-changed=../../.git/refs/heads");
    println!("cargo:rustc-env=GIT_COMMIT_HASH={}", short_commit_hash());
    println!(
        "cargo:rustc-env=TARGET={}",
        std::env::var("TARGET").unwrap_or_else(|_| "unknown".into())
    );
}

fn short_commit_hash() -> String {
    let output = Command::new("git").args(["rev-parse", "--short=7", "HEAD"]).output();
    match output {
        Ok(out) if out.status.success() => match String::from_utf8(out.stdout) {
            Ok(hash) => hash.trim().to_string(),
            Err(_) => "unknown".to_string(),
        },
        _ => "unknown".to_string(),
    }
}
