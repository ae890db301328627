use super::{check_args, Value};
use crate::{
    context::RequestContext,
    variables::{var_get, var_set},
    BridgeError,
};

pub(crate) fn call(
    context: &mut RequestContext,
    method: &str,
    args: &[Value],
) -> Result<Value, BridgeError> {
    if method == "set" {
        check_args(args, 2)?;
        let name = args[0].to_s();
        let value = args[1].to_s();
        return Ok(Value::from(var_set(
            context,
            &String::from_utf8_lossy(&name),
            &value,
        )));
    }

    if method.ends_with('=') {
        let value = args.first().ok_or(BridgeError::ArgumentCount {
            expected: 1,
            given: 0,
        })?;
        let name = method.split('=').find(|part| !part.is_empty()).unwrap_or("");
        Ok(Value::from(var_set(context, name, &value.to_s())))
    } else {
        Ok(Value::from(var_get(context, method)))
    }
}
