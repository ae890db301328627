#![doc(html_logo_url = "https://dudochkin-victor.github.io/assets/ruex/logo.svg")]

#![warn(missing_docs)]

//! # reqbridge
//!
//! Request context bridge for scriptable HTTP servers.
//!
//! reqbridge exposes the request a server is processing, and the server's table of named
//! variables, to embedded script code. Scripts can read and replace the request line, URI,
//! method, protocol, query string and response content type, read and write request and
//! response headers, read the buffered request body, and get or set variables by name.
//!
//! REQUEST -> Runtime -> RequestContext -> handle::push -> script::invoke -> core operations
//!
//! ## Features
//!
//! - Ordered header lists with case-insensitive lookup. Request headers can only be
//!   replaced, response headers can also be added.
//! - Request bodies split over several buffers are joined on demand.
//! - A variable table with built-in, declared and prefix (`http_*`, `arg_*`, ...) variables,
//!   per-request caching and a changeability check on every write.
//! - A per-thread current-request handle for script calls that carry no request argument.
//!
//! ## Failure model
//!
//! Missing headers and variables, writes to read-only or unknown variables and failed
//! allocations while copying a value are logged and give `Value::Nil`. Only reading a body
//! that is not buffered in memory, calling outside of a request, and bad arguments are
//! errors.
//!
//! ## Getting started
//!
//! The runtime builds a [`context::RequestContext`] for each request, makes it current and
//! hands script calls to [`script::invoke`].
//!
//!  ```
//!  use std::{cell::RefCell, rc::Rc};
//!  use reqbridge::{config::BridgeConfig, context::*, handle, script::*};
//!
//!  let config = BridgeConfig::from_json(r#"{"variables": [{"name": "backend"}]}"#).unwrap();
//!  let context = Rc::new(RefCell::new(RequestContext::new(config.server_conf(), Request::default())));
//!  let _phase = handle::enter(&context);
//!
//!  invoke(ObjectRef::HeadersOut, "[]=", &["X-Cache".into(), "HIT".into()]).unwrap();
//!  invoke(ObjectRef::Var, "backend=", &["10.0.0.1".into()]).unwrap();
//!  let backend = invoke(ObjectRef::Var, "backend", &[]).unwrap();
//!  assert_eq!(backend, Value::from("10.0.0.1"));
//!  ```

#[macro_use]
extern crate log;

#[macro_use]
extern crate maplit;

#[macro_use]
extern crate lazy_static;

/// Name used to prefix log lines
pub const MODULE_NAME: &str = "reqbridge";

/// Logs a soft failure at error severity with the module name, function, line and message
macro_rules! log_error {
    ($func:expr, $($arg:tt)+) => {
        error!(
            "{} ERROR {}:{}: {}",
            $crate::MODULE_NAME,
            $func,
            line!(),
            format_args!($($arg)+)
        )
    };
}

/// Logs an informational message with the module name, function and line
macro_rules! log_info {
    ($func:expr, $($arg:tt)+) => {
        info!(
            "{} INFO {}:{}: {}",
            $crate::MODULE_NAME,
            $func,
            line!(),
            format_args!($($arg)+)
        )
    };
}

mod error;
pub use self::error::BridgeError;

#[macro_use]
pub mod headers;

pub mod adapter;
pub mod body;
pub mod config;
pub mod context;
pub mod handle;
pub mod script;
pub mod variables;

/// Copies `src` into a new buffer with room for at least `capacity` bytes, reporting
/// allocation failure instead of aborting.
pub(crate) fn copy_bytes(src: &[u8], capacity: usize) -> Result<Vec<u8>, BridgeError> {
    let capacity = capacity.max(src.len());
    let mut buf = Vec::new();
    buf.try_reserve_exact(capacity)
        .map_err(|_| BridgeError::Allocation(capacity))?;
    buf.extend_from_slice(src);
    Ok(buf)
}

#[cfg(test)]
mod tests;
