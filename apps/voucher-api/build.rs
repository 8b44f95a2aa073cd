//! Build script for compiling Protocol Buffer definitions.
//!
//! This script compiles the .proto files into Rust code using tonic-build.
//! The generated code is placed in `$OUT_DIR` and included via `tonic::include_proto!`.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Tell Cargo to rerun this build script if the proto file changes
    println!("cargo:rerun-if-changed=../../proto/greenpay_voucher.proto");

    // Server only: the portal and gate scanners bring their own clients
    tonic_build::configure()
        .build_server(true)
        .build_client(false)
        .compile_protos(&["../../proto/greenpay_voucher.proto"], &["../../proto"])?;

    Ok(())
}
