use thiserror::Error;

#[derive(Debug, Error)]
pub enum SheetStoreError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("No sheet endpoint is configured")]
    NotConfigured,
    #[error("Invalid product id: {0}")]
    InvalidId(String),
    #[error("Could not reach the sheet endpoint: {0}")]
    Transport(String),
    #[error("Request failed. Error {status}. {message}")]
    HttpStatus { status: u16, message: String },
    #[error("Could not deserialize JSON: {0}")]
    Json(String),
    #[error("The sheet script reported an error: {0}")]
    Store(String),
}
