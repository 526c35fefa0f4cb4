//! Reading and writing [Furnace](https://github.com/tildearrow/furnace) tracker files: modules
//! (`.fur`) and standalone instruments (`.fui`).
//!
//! The format has gone through a lot of revisions, and most blocks lay out their fields
//! depending on the version they were saved with. Everything decoded here keeps that version
//! around, and writes itself back in the same layout, so a file can be read and written without
//! changing a single byte of its structure. This crate does not play modules back, nor does it
//! check whether their musical contents make sense.

pub mod chip;
pub mod instrument;
pub mod macros;
pub mod module;
pub mod pattern;
pub mod sample;
pub mod serde;
pub mod wavetable;

pub use chip::Chip;
pub use instrument::{Instrument, InstrumentFile};
pub use module::{Compression, Module};
pub use ux::{u2, u3, u4};
