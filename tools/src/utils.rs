use anyhow::{Context, Result};
use std::{
    io::stdin,
    path::{Path, PathBuf},
};
use walkdir::{DirEntry, WalkDir};

/// Every non-hidden file with one of the extensions, in the paths or the folders they name
pub fn iter_files<'a, I>(
    paths: I,
    recursive: bool,
    extensions: &'a [&'static str],
) -> impl Iterator<Item = PathBuf> + 'a
where
    I: IntoIterator + 'a,
    <I as IntoIterator>::Item: AsRef<Path>,
{
    paths
        .into_iter()
        .flat_map(move |path| {
            let mut walk_dir = WalkDir::new(path.as_ref()).sort_by_file_name();
            if !recursive {
                walk_dir = walk_dir.max_depth(1);
            }

            walk_dir
        })
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && !is_hidden(entry))
        .map(DirEntry::into_path)
        .filter(move |path| {
            extensions
                .iter()
                .any(|extension| has_extension(path, extension))
        })
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

pub fn has_extension(path: &Path, extension: &str) -> bool {
    match path.extension() {
        Some(ext) => ext.eq_ignore_ascii_case(extension),
        None => false,
    }
}

/// Turn an instrument or song name into something every filesystem accepts
pub fn file_stem(name: &str) -> String {
    let stem: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if stem.is_empty() {
        "untitled".to_string()
    } else {
        stem
    }
}

/// Ask before clobbering an existing file, unless `force` is set
pub fn check_for_overwrite(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        loop {
            println!(
                "{} already exists. Do you want to overwrite it? Y/n",
                path.to_string_lossy()
            );

            let mut line = String::new();
            stdin()
                .read_line(&mut line)
                .context("Could not read terminal input")?;

            match line.trim_end() {
                "Y" => break,
                "n" => std::process::exit(0),
                _ => (),
            }
        }
    }

    Ok(())
}
