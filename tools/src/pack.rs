use crate::utils::check_for_overwrite;
use anyhow::{Context, Result};
use clap::Args;
use furnace::module::compress::{compress, decompress, is_compressed};
use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};
use tracing::info;

/// Rewrite a Furnace module, compressed or plain
#[derive(Args)]
#[clap(author, version)]
pub struct PackArgs {
    /// The module to read
    input: PathBuf,

    /// Where to write the result
    output: PathBuf,

    /// Overwrite the output without asking
    #[clap(short, long)]
    force: bool,
}

/// Wrap a module in a zlib envelope, the way Furnace saves them
pub fn pack(args: &PackArgs) -> Result<()> {
    let (module, was_compressed) = read(&args.input)?;
    if was_compressed {
        info!("{} was already compressed", args.input.to_string_lossy());
    }

    check_for_overwrite(&args.output, args.force)?;
    let file = File::create(&args.output).context("Could not create the output file")?;
    compress(&module, file).context("Could not write the compressed module")?;

    println!("Packed {}", args.output.to_string_lossy());
    Ok(())
}

/// Strip the zlib envelope off a module
pub fn unpack(args: &PackArgs) -> Result<()> {
    let (module, was_compressed) = read(&args.input)?;
    if !was_compressed {
        info!("{} was not compressed", args.input.to_string_lossy());
    }

    check_for_overwrite(&args.output, args.force)?;
    fs::write(&args.output, module).context("Could not write the module")?;

    println!("Unpacked {}", args.output.to_string_lossy());
    Ok(())
}

/// The plain module bytes, and whether they were compressed on disk
fn read(path: &Path) -> Result<(Vec<u8>, bool)> {
    let bytes = fs::read(path).context("Could not read the module")?;
    let compressed = is_compressed(&bytes);
    let module = decompress(bytes.as_slice()).context("Not a Furnace module")?;

    Ok((module, compressed))
}
