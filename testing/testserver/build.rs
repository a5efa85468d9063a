use prost::Message;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = std::path::PathBuf::from(std::env::var("OUT_DIR")?);

    let fds = protox::compile(
        ["health.proto", "greeter.proto", "testserver.proto"],
        ["proto"],
    )?;
    std::fs::write(
        out_dir.join("testing_descriptor.bin"),
        fds.encode_to_vec(),
    )?;

    tonic_prost_build::configure().compile_fds(fds)?;

    Ok(())
}
