fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Use the bundled protoc so builds do not depend on a system install.
    let protoc = protoc_bin_vendored::protoc_bin_path().expect("vendored protoc is available");
    std::env::set_var("PROTOC", protoc);

    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(
            &[
                "proto/envoy/service/ext_proc/v3alpha/external_processor.proto",
                "proto/grpc/health/v1/health.proto",
            ],
            &["proto"],
        )?;
    Ok(())
}
