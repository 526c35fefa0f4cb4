//! # Furnace Tools
//!
//! [Furnace](https://github.com/tildearrow/furnace) is a multi-system chiptune tracker. Its modules (`.fur`) bundle songs for dozens of sound chips, together with their instruments, wavetables and samples.
//!
//! This crate provides a command-line utility for looking into those files, taking instruments out of them, and switching modules between their compressed and plain forms.
//!
//! Pass `--verbose` to any command to see what the decoder is doing. `RUST_LOG` takes precedence, if set.
//!
//! ## Inspect
//!
//! ```console
//! furnace-tools-inspect 0.1.0
//! Inspect Furnace .fur and .fui files, or even entire directories for their contents
//!
//! USAGE:
//!     furnace-tools inspect [OPTIONS] [PATH]...
//!
//! ARGS:
//!     <PATH>...    The path(s) to inspect
//!
//! OPTIONS:
//!     -h, --help         Print help information
//!     -r, --recursive    Search the folder recursively
//!     -v, --verbose      Log what the decoder is doing (overridden by RUST_LOG)
//!     -V, --version      Print version information
//! ```
//!
//! ### Example
//!
//! ```console
//! > furnace-tools inspect bangers.fur
//! bangers.fur                     v083 | BANGERS by SOMEONE
//!   GameBoy (4 channels)
//!   12 orders of 64 rows, 31 patterns
//!   3 instruments, 2 wavetables, 0 samples
//!   0 | PLUCK                    | GameBoy | v083
//!   1 | LEAD                     | GameBoy | v083
//!   2 | NOISE HAT                | GameBoy | v083
//! ```
//!
//! ## Export
//!
//! ```console
//! furnace-tools-export 0.1.0
//! Export instruments from a Furnace module as .fui files
//!
//! USAGE:
//!     furnace-tools export [OPTIONS] <PATH> [INDEX]...
//!
//! ARGS:
//!     <PATH>        The path to the module to export from
//!     <INDEX>...    Indices of the instruments that should be exported. No indices means all
//!                   instruments.
//!
//! OPTIONS:
//!     -f, --force              Overwrite existing files without asking
//!     -h, --help               Print help information
//!     -o, --output <OUTPUT>    The destination folder to place the instruments
//!     -p, --output-pos         Prepend the instrument index to the start of the filename
//!     -v, --verbose            Log what the decoder is doing (overridden by RUST_LOG)
//!     -V, --version            Print version information
//! ```
//!
//! ### Example
//!
//! ```console
//! > furnace-tools export -p bangers.fur 0 2
//! 00. PLUCK                    => 00_PLUCK.fui
//! 02. NOISE HAT                => 02_NOISE HAT.fui
//! ```
//!
//! ## Pack and Unpack
//!
//! ```console
//! furnace-tools-unpack 0.1.0
//! Rewrite a Furnace module, compressed or plain
//!
//! USAGE:
//!     furnace-tools unpack [OPTIONS] <INPUT> <OUTPUT>
//!
//! ARGS:
//!     <INPUT>     The module to read
//!     <OUTPUT>    Where to write the result
//!
//! OPTIONS:
//!     -f, --force      Overwrite the output without asking
//!     -h, --help       Print help information
//!     -v, --verbose    Log what the decoder is doing (overridden by RUST_LOG)
//!     -V, --version    Print version information
//! ```
//!
//! Furnace opens plain modules just as well as compressed ones, so `unpack` is handy for
//! looking at a module in a hex editor. `pack` wraps it back up.

pub mod export;
pub mod inspect;
pub mod pack;
pub(crate) mod utils;
