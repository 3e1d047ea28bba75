use thiserror::Error;

pub type Result<T> = std::result::Result<T, VectorPipeError>;

#[derive(Error, Debug)]
pub enum VectorPipeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Embedding provider error: {0}")]
    Provider(String),

    #[error("Vector index error: {0}")]
    VectorDb(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod chunking;
pub mod config;
pub mod database;
pub mod document;
pub mod embeddings;
pub mod pipeline;
pub mod retrieval;
pub mod storage;
pub mod vectordb;
