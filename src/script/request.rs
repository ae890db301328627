use std::collections::HashMap;

use super::{check_args, string_arg, Method, ObjectRef, Value};
use crate::{
    context::{RequestContext, ScalarField},
    variables::var_get,
    BridgeError,
};

lazy_static! {
    static ref FIELD_METHODS: HashMap<&'static str, (ScalarField, bool)> = hashmap! {
        "request_line" => (ScalarField::RequestLine, false),
        "request_line=" => (ScalarField::RequestLine, true),
        "uri" => (ScalarField::Uri, false),
        "uri=" => (ScalarField::Uri, true),
        "unparsed_uri" => (ScalarField::UnparsedUri, false),
        "unparsed_uri=" => (ScalarField::UnparsedUri, true),
        "method" => (ScalarField::Method, false),
        "method=" => (ScalarField::Method, true),
        "protocol" => (ScalarField::Protocol, false),
        "protocol=" => (ScalarField::Protocol, true),
        "args" => (ScalarField::Args, false),
        "args=" => (ScalarField::Args, true),
        "content_type" => (ScalarField::ContentType, false),
        "content_type=" => (ScalarField::ContentType, true)
    };

    static ref METHODS: HashMap<&'static str, Method> = hashmap! {
        "body" => body as Method,
        "var" => var as Method,
        "headers_in" => headers_in as Method,
        "headers_out" => headers_out as Method,
        "hostname" => hostname as Method,
        "filename" => filename as Method,
        "user" => user as Method
    };
}

pub(crate) fn call(
    context: &mut RequestContext,
    method: &str,
    args: &[Value],
) -> Result<Value, BridgeError> {
    if let Some((field, write)) = FIELD_METHODS.get(method) {
        return if *write {
            set_field(context, *field, args)
        } else {
            check_args(args, 0)?;
            Ok(Value::from(context.field(*field)))
        };
    }
    match METHODS.get(method) {
        Some(method) => method(context, args),
        None => Err(BridgeError::NoMethod {
            receiver: ObjectRef::Request.class_name(),
            method: method.to_string(),
        }),
    }
}

fn set_field(
    context: &mut RequestContext,
    field: ScalarField,
    args: &[Value],
) -> Result<Value, BridgeError> {
    check_args(args, 1)?;
    if !args[0].is_nil() {
        let value = string_arg(&args[0])?.to_vec();
        context.set_field(field, value);
    }
    Ok(Value::Object(ObjectRef::Request))
}

fn body(context: &mut RequestContext, args: &[Value]) -> Result<Value, BridgeError> {
    check_args(args, 0)?;
    Ok(Value::from(context.body()?.map(|body| body.into_owned())))
}

fn var(_: &mut RequestContext, args: &[Value]) -> Result<Value, BridgeError> {
    check_args(args, 0)?;
    Ok(Value::Object(ObjectRef::Var))
}

fn headers_in(_: &mut RequestContext, args: &[Value]) -> Result<Value, BridgeError> {
    check_args(args, 0)?;
    Ok(Value::Object(ObjectRef::HeadersIn))
}

fn headers_out(_: &mut RequestContext, args: &[Value]) -> Result<Value, BridgeError> {
    check_args(args, 0)?;
    Ok(Value::Object(ObjectRef::HeadersOut))
}

fn hostname(context: &mut RequestContext, args: &[Value]) -> Result<Value, BridgeError> {
    check_args(args, 0)?;
    Ok(Value::from(var_get(context, "hostname")))
}

fn filename(context: &mut RequestContext, args: &[Value]) -> Result<Value, BridgeError> {
    check_args(args, 0)?;
    Ok(Value::from(var_get(context, "request_filename")))
}

fn user(context: &mut RequestContext, args: &[Value]) -> Result<Value, BridgeError> {
    check_args(args, 0)?;
    Ok(Value::from(var_get(context, "remote_user")))
}
