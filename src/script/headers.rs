use super::{check_args, string_arg, ObjectRef, Value};
use crate::{
    context::RequestContext,
    headers::{HeaderList, HeaderPolicy},
    BridgeError,
};

/// Which header list a headers object works on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderDirection {
    /// Request headers, replace only
    In,
    /// Response headers, replace or insert
    Out,
}

impl HeaderDirection {
    /// Write policy of the list
    pub fn policy(self) -> HeaderPolicy {
        match self {
            HeaderDirection::In => HeaderPolicy::ReplaceOnly,
            HeaderDirection::Out => HeaderPolicy::ReplaceOrInsert,
        }
    }

    fn receiver(self) -> ObjectRef {
        match self {
            HeaderDirection::In => ObjectRef::HeadersIn,
            HeaderDirection::Out => ObjectRef::HeadersOut,
        }
    }

    fn list(self, context: &mut RequestContext) -> &mut HeaderList {
        match self {
            HeaderDirection::In => &mut context.request.headers_in,
            HeaderDirection::Out => &mut context.response.headers_out,
        }
    }
}

pub(crate) fn call(
    context: &mut RequestContext,
    direction: HeaderDirection,
    method: &str,
    args: &[Value],
) -> Result<Value, BridgeError> {
    let headers = direction.list(context);
    match method {
        "[]" => {
            check_args(args, 1)?;
            let key = string_arg(&args[0])?;
            Ok(Value::from(headers.get(key)))
        }
        "[]=" => {
            check_args(args, 2)?;
            let key = string_arg(&args[0])?;
            let value = string_arg(&args[1])?;
            headers.set_with_policy(key, value, direction.policy());
            Ok(Value::Object(direction.receiver()))
        }
        "all" => Ok(Value::Hash(headers.snapshot_to_map())),
        _ => Err(BridgeError::NoMethod {
            receiver: direction.receiver().class_name(),
            method: method.to_string(),
        }),
    }
}
