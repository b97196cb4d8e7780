use mongodb::error::Error as MongoError;
use thiserror::Error;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Failures of the MongoDB room store.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("missing environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to insert room `{code}`")]
    InsertRoom {
        code: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to load room `{code}`")]
    LoadRoom {
        code: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to replace room `{code}`")]
    ReplaceRoom {
        code: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to refresh presence in room `{code}`")]
    MarkSeen {
        code: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to look up verification code")]
    FindByVerifyCode {
        #[source]
        source: MongoError,
    },
    #[error("failed to save guess for room `{code}`")]
    SaveGuess {
        code: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to list guesses for room `{code}`")]
    ListGuesses {
        code: String,
        #[source]
        source: MongoError,
    },
    #[error("room `{code}` holds an invalid document: {reason}")]
    CorruptDocument { code: String, reason: String },
}
