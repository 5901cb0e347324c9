mod args;
mod error;
mod logger;
mod table_ref;

pub use args::CliArgs;
pub use error::TabulaError;
pub use logger::setup_logging;
pub use table_ref::TableRef;
