fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Vendored protoc so builds don't depend on a system installation
    let protoc_path = protoc_bin_vendored::protoc_bin_path()?;
    std::env::set_var("PROTOC", protoc_path);

    let proto_files = &["proto/google/assistant/embedded/v1alpha2/embedded_assistant.proto"];
    let include_dirs = &["proto"];
    tonic_build::configure()
        .build_client(true)
        // the server half backs the in-process stub used by the integration tests
        .build_server(true)
        .compile(proto_files, include_dirs)?;
    println!("cargo:rerun-if-changed=proto/google/assistant/embedded/v1alpha2/embedded_assistant.proto");
    Ok(())
}
