//! Build script exporting the host's dynamic symbols.
//!
//! Extension modules resolve the `glirc_*` callbacks against the running
//! binary, so they must be in its dynamic symbol table.

fn main() {
    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    if target_os == "linux" || target_os == "freebsd" {
        println!("cargo::rustc-link-arg-bins=-rdynamic");
    }

    println!("cargo::rerun-if-changed=build.rs");
}
