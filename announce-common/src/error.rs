//! Errors raised by the entity store and configuration layer

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Entity store error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A link write matched no stop or section row
    #[error("Cannot link {target}: no such row in the entity store")]
    UnknownTarget { target: String },

    /// Link columns in a state no writer produces
    #[error("Corrupt link columns in entity store: {0}")]
    CorruptLink(String),
}
