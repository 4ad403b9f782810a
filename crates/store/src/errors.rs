use thiserror::Error;

/// Failure reported while talking to the entries datastore.
///
/// `Api` carries the datastore's own message verbatim so the HTTP layer can
/// pass it through to the client unchanged.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Transport(String),
    #[error("{0}")]
    Api(String),
    #[error("store response decode failed: {0}")]
    Decode(String),
}
