//! Builds the gRPC client and server bindings for `proto/catalog.proto`.
//!
//! The `chunk_data` field of `UploadImageRequest` is generated as
//! `bytes::Bytes` instead of `Vec<u8>` so that image chunks move through the
//! upload pipeline without re-allocation. A file descriptor set is emitted
//! alongside the bindings to back the reflection service.

use std::env;
use std::path::PathBuf;

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let descriptor_path = out_dir.join("catalog_descriptor.bin");

    let mut config = prost_build::Config::new();

    // Chunk payloads are opaque; keep them as `Bytes`, not `Vec<u8>`.
    config
        .bytes([".catalog.UploadImageRequest.chunk_data"])
        .file_descriptor_set_path(&descriptor_path);

    tonic_build::configure()
        .compile_protos_with_config(config, &["proto/catalog.proto"], &["proto"])
        .unwrap();
}
