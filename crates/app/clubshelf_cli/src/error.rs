use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{}", .0)]
    Custom(String),

    #[error("IO::{:?}: {}", .0, .0)]
    Io(#[from] std::io::Error),

    #[error("FlexiLogger::{:?}: {}", .0, .0)]
    FlexiLogger(#[from] flexi_logger::FlexiLoggerError),

    #[error("Json: {}", .0)]
    Json(#[from] serde_json::Error),

    #[error("{}", .0)]
    Config(#[from] clubshelf_core::config::ConfigError),

    #[error("{}", .0)]
    Store(#[from] clubshelf_core::store::StoreError),

    #[error("{}", .0)]
    Admin(#[from] clubshelf_core::admin::AdminError),
}
