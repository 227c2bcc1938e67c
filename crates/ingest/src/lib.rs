//! Load step — reads the semicolon-delimited performance export, cleans and
//! coerces every cell, and produces an immutable in-memory [`EventTable`].

pub mod coerce;
pub mod loader;
pub mod table;

pub use loader::{load_csv, load_reader, LoadReport, REQUIRED_COLUMNS};
pub use table::{EventTable, Selection, BLANK_OPTION};
