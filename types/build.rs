fn main() {
    println!("cargo:rerun-if-changed=proto/relay.proto");
    tonic_prost_build::configure()
        .compile_protos(&["proto/relay.proto"], &["proto/"])
        .expect("Failed to compile proto/relay.proto");
}
