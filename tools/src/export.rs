use crate::utils::{check_for_overwrite, file_stem};
use anyhow::{Context, Result};
use clap::Args;
use furnace::Module;
use std::{env::current_dir, fs::create_dir_all, path::PathBuf};
use tracing::debug;

/// Export instruments from a Furnace module as .fui files
#[derive(Args)]
#[clap(author, version)]
pub struct ExportArgs {
    /// The path to the module to export from
    path: PathBuf,

    /// Indices of the instruments that should be exported. No indices means all instruments.
    index: Vec<usize>,

    /// The destination folder to place the instruments
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Prepend the instrument index to the start of the filename
    #[clap(short = 'p', long)]
    output_pos: bool,

    /// Overwrite existing files without asking
    #[clap(short, long)]
    force: bool,
}

pub fn export(mut args: ExportArgs) -> Result<()> {
    let module = Module::from_path(&args.path).context("Reading the module from file failed")?;

    if args.index.is_empty() {
        args.index = (0..module.instruments.len()).collect();
    }

    let folder = match args.output {
        Some(folder) => folder,
        None => current_dir().context("Could not fetch current working directory")?,
    };
    create_dir_all(&folder).context("Could not create output directory")?;

    for index in args.index {
        let file = module
            .instrument_file(index)
            .with_context(|| format!("The module has no instrument {index}"))?;
        let name = file.instrument.name();

        let mut filename = String::new();
        if args.output_pos {
            filename.push_str(&format!("{:02}_", index));
        }
        filename.push_str(&file_stem(name));

        let path = folder.join(format!("{filename}.fui"));
        check_for_overwrite(&path, args.force)?;

        debug!(
            index,
            path = %path.to_string_lossy(),
            wavetables = file.wavetables.len(),
            samples = file.samples.len(),
            "Exporting instrument"
        );

        file.to_path(&path)
            .context("Could not write the instrument to file")?;

        println!(
            "{:02}. {:24} => {}",
            index,
            name,
            path.to_string_lossy()
        );
    }

    Ok(())
}
