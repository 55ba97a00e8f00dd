//! Build script for the storefront crate.
//!
//! Fingerprints the stylesheet so it can be served with a far-future cache
//! lifetime: `static/css/main.css` is copied to
//! `static/css/derived/main.<hash>.css` and the hash is exported as
//! `CSS_HASH` for the `css_hash` template filter.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// Hex characters of the digest kept in the file name.
const HASH_LEN: usize = 8;

fn main() {
    let manifest_dir = PathBuf::from(
        env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR must be set by Cargo"),
    );
    fingerprint_stylesheet(&manifest_dir.join("static/css"));
}

fn fingerprint_stylesheet(css_dir: &Path) {
    let source = css_dir.join("main.css");
    println!("cargo:rerun-if-changed={}", source.display());

    let content = match fs::read(&source) {
        Ok(content) => content,
        Err(e) => {
            println!("cargo:warning=stylesheet not fingerprinted: {e}");
            println!("cargo:rustc-env=CSS_HASH=");
            return;
        }
    };

    let digest = format!("{:x}", Sha256::digest(&content));
    let hash = &digest[..HASH_LEN];
    println!("cargo:rustc-env=CSS_HASH={hash}");

    let derived = css_dir.join("derived");
    fs::create_dir_all(&derived).expect("failed to create static/css/derived");

    // Older fingerprints would otherwise pile up between builds.
    if let Ok(entries) = fs::read_dir(&derived) {
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with("main.") && name.ends_with(".css") && name != format!("main.{hash}.css") {
                let _ = fs::remove_file(entry.path());
            }
        }
    }

    fs::copy(&source, derived.join(format!("main.{hash}.css")))
        .expect("failed to copy stylesheet into static/css/derived");
}
