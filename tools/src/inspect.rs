use crate::utils::{has_extension, iter_files};
use anyhow::{Context, Result};
use clap::Args;
use furnace::{InstrumentFile, Module};
use std::path::{Path, PathBuf};

/// Inspect Furnace .fur and .fui files, or even entire directories for their contents
#[derive(Args)]
#[clap(author, version)]
pub struct InspectArgs {
    /// The path(s) to inspect
    path: Vec<PathBuf>,

    /// Search the folder recursively
    #[clap(short, long)]
    recursive: bool,
}

pub fn inspect(args: &InspectArgs) -> Result<()> {
    let paths: Vec<_> = iter_files(&args.path, args.recursive, &["fur", "fui"]).collect();

    if let Some((last, rest)) = paths.split_last() {
        for path in rest {
            print(path)?;
            println!();
        }

        print(last)?;
    }

    Ok(())
}

fn print(path: &Path) -> Result<()> {
    if has_extension(path, "fui") {
        print_instrument(path)
    } else {
        print_module(path)
    }
}

fn print_module(path: &Path) -> Result<()> {
    let module = Module::from_path(path)
        .with_context(|| format!("Reading the module {} failed", path.to_string_lossy()))?;

    println!(
        "{:<32}v{:03} | {} by {}",
        file_name(path),
        module.version,
        module.meta.name,
        module.meta.author
    );

    let chips: Vec<_> = module.chips.iter().map(|chip| chip.to_string()).collect();
    println!(
        "  {} ({} channels)",
        chips.join(", "),
        module.channel_count()
    );
    println!(
        "  {} orders of {} rows, {} patterns",
        module.order_length(),
        module.pattern_length,
        module.patterns.len()
    );
    println!(
        "  {} instruments, {} wavetables, {} samples",
        module.instruments.len(),
        module.wavetables.len(),
        module.samples.len()
    );

    for (index, instrument) in module.instruments.iter().enumerate() {
        println!(
            "{index:>3} | {:<24} | {:?} | v{:03}",
            instrument.name(),
            instrument.kind,
            instrument.version
        );
    }

    Ok(())
}

fn print_instrument(path: &Path) -> Result<()> {
    let file = InstrumentFile::from_path(path)
        .with_context(|| format!("Reading the instrument {} failed", path.to_string_lossy()))?;

    println!(
        "{:<32}v{:03} | {} | {:?}",
        file_name(path),
        file.version,
        file.instrument.name(),
        file.instrument.kind
    );
    println!(
        "  {} macros, {} wavetables, {} samples",
        file.instrument.macros().len(),
        file.wavetables.len(),
        file.samples.len()
    );

    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
