use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("remap rolled back, {rows_planned} relation rows would have been affected: {source}")]
    Transaction {
        rows_planned: usize,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Backup dump error: {0}")]
    Backup(String),
}
