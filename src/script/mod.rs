//! The `script` module is the surface embedded scripts call into.
//!
//! Scripts hold [`ObjectRef`]s (`Request`, `Headers_in`, `Headers_out`, `Var`) and call
//! methods on them by name. Each object has a static method table; `Var` has no fixed
//! methods besides `set` and treats any other name as a variable read, or as a write when
//! the name ends in `=`.
//!
//! Lookups that find nothing give [`Value::Nil`]; only calls that cannot run in the
//! current state (no request, body not buffered, bad arguments) return an error.

use crate::{context::RequestContext, handle, BridgeError};

mod headers;
mod request;
mod var;
mod value;

pub use self::headers::HeaderDirection;
pub use self::value::*;

/// Method implementation in a static method table
pub(crate) type Method = fn(&mut RequestContext, &[Value]) -> Result<Value, BridgeError>;

/// Calls `method` on `receiver` against the current request
pub fn invoke(receiver: ObjectRef, method: &str, args: &[Value]) -> Result<Value, BridgeError> {
    let shared = handle::current()?;
    let mut context = shared.borrow_mut();
    call(&mut context, receiver, method, args)
}

/// Calls `method` on `receiver` against an explicit request
pub fn call(
    context: &mut RequestContext,
    receiver: ObjectRef,
    method: &str,
    args: &[Value],
) -> Result<Value, BridgeError> {
    trace!("{}#{} with {} args", receiver.class_name(), method, args.len());
    match receiver {
        ObjectRef::Request => request::call(context, method, args),
        ObjectRef::HeadersIn => headers::call(context, HeaderDirection::In, method, args),
        ObjectRef::HeadersOut => headers::call(context, HeaderDirection::Out, method, args),
        ObjectRef::Var => var::call(context, method, args),
    }
}

pub(crate) fn check_args(args: &[Value], expected: usize) -> Result<(), BridgeError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(BridgeError::ArgumentCount {
            expected,
            given: args.len(),
        })
    }
}

pub(crate) fn string_arg(value: &Value) -> Result<&[u8], BridgeError> {
    value
        .as_bytes()
        .ok_or_else(|| BridgeError::TypeMismatch(value.type_name()))
}
