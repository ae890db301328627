//! Hard failures surfaced to the script layer. Soft failures (missing headers, unknown or
//! read-only variables) never reach this type, they are logged and returned as `Value::Nil`.

use thiserror::Error;

/// Errors that terminate the current script call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    /// The request body is not buffered in memory in the current phase
    #[error("This phase don't have request_body")]
    UnavailablePhase,

    /// A script call was made outside of a request processing phase
    #[error("no request is being processed")]
    NoActiveRequest,

    /// Memory for a copied value could not be reserved
    #[error("memory allocate failed ({0} bytes)")]
    Allocation(usize),

    /// The receiver has no such method
    #[error("undefined method '{method}' for {receiver}")]
    NoMethod {
        /// Receiver class name
        receiver: &'static str,
        /// Requested method name
        method: String,
    },

    /// Wrong number of arguments for a method
    #[error("wrong number of arguments (given {given}, expected {expected})")]
    ArgumentCount {
        /// Arguments the method takes
        expected: usize,
        /// Arguments supplied by the script
        given: usize,
    },

    /// Argument could not be converted into a string
    #[error("can't convert {0} into String")]
    TypeMismatch(&'static str),

    /// Configuration could not be loaded
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Config(err.to_string())
    }
}
