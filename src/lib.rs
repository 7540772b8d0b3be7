pub mod cli;
pub mod config;
pub mod error;
pub mod tokenizer;

pub use cli::layout::center_string;
pub use config::Opts;
pub use error::{Error, OptionError};
pub use tokenizer::split_compound;

/// One dot-separated part of a qualified name. `None` is the null marker,
/// produced by an unquoted `null`.
pub type Token = Option<String>;

/// A dot-separated qualified name such as `schema.table.column`.
pub type CompoundIdentifier = Vec<Token>;
