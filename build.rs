use std::error::Error;

// Emits VERGEN_BUILD_TIMESTAMP, VERGEN_CARGO_TARGET_TRIPLE and VERGEN_GIT_SHA
// for `iotz --version`.
fn main() -> Result<(), Box<dyn Error>> {
    let build = vergen_gitcl::BuildBuilder::default().build_timestamp(true).build()?;
    let cargo = vergen_gitcl::CargoBuilder::default().target_triple(true).build()?;
    let git = vergen_gitcl::GitclBuilder::default().sha(true).build()?;

    vergen_gitcl::Emitter::default()
        .add_instructions(&build)?
        .add_instructions(&cargo)?
        .add_instructions(&git)?
        .emit()?;
    Ok(())
}
