//! Reading, linking and writing of GTFS static feeds.
//!
//! [`Parser`] loads a feed from a directory or zip archive into a [`Feed`],
//! resolving every cross-table reference into a handle. [`Writer`] turns a
//! feed back into GTFS tables.

mod csv_reader;
mod csv_writer;
mod error;
mod feed;
mod field;
mod input;
mod parser;
mod progress;
mod writer;

pub use csv_reader::{CsvHeader, CsvReader, CsvRecord};
pub use csv_writer::{round_to, CsvWriter};
pub use error::{ErrorKind, GtfsError, Location, Result};
pub use feed::*;
pub use field::FieldAccessor;
pub use input::{open_source, DirectorySource, FileSource, ZipSource};
pub use parser::{Parser, ParserConfig};
pub use progress::{NoOpProgressHandler, ProgressHandler};
pub use writer::{Writer, WRITE_ORDER};

pub use gtfs_kit_model as model;
