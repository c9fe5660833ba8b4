//! Build script exporting the test binaries' dynamic symbols.
//!
//! The self-loading tests resolve an `extension` descriptor from the running
//! test executable, so it must be in the dynamic symbol table.

fn main() {
    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    if target_os == "linux" || target_os == "freebsd" {
        println!("cargo::rustc-link-arg-tests=-rdynamic");
    }

    println!("cargo::rerun-if-changed=build.rs");
}
