//! Parsing and loading for pulsenet module graphs.
//!
//! Graphs come from textual declarations ([`parse_modules`]) or from RON,
//! TOML, or JSON files following [`schema::GraphFile`]. Run settings are
//! loaded with [`load_run_config`].

pub mod loader;
pub mod parser;
pub mod schema;

pub use loader::{load_graph_file, load_run_config, DataLoadError};
pub use parser::{parse_modules, ParseError};
pub use schema::SchemaError;
