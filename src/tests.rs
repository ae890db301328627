use super::{body::*, context::*, script::*, *};
use expectest::prelude::*;
use std::{cell::RefCell, rc::Rc};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn context() -> RequestContext {
    init_logging();
    let mut context = RequestContext::default();
    context.request.headers_in = vec![h!("Host", "example.com"), h!("X-Foo", "bar")].into();
    context
}

fn s(value: &str) -> Value {
    Value::from(value)
}

#[test]
fn headers_in_lookup_scenario() {
    let mut context = context();
    expect!(call(&mut context, ObjectRef::HeadersIn, "[]", &[s("host")]))
        .to(be_ok().value(s("example.com")));
    expect!(call(&mut context, ObjectRef::HeadersIn, "[]", &[s("X-Fo")]))
        .to(be_ok().value(s("bar")));
    expect!(call(&mut context, ObjectRef::HeadersIn, "[]", &[s("Accept")]))
        .to(be_ok().value(Value::Nil));
    expect!(call(&mut context, ObjectRef::HeadersIn, "all", &[])).to(be_ok().value(Value::Hash(
        hashmap! {
            b"Host".to_vec() => b"example.com".to_vec(),
            b"X-Foo".to_vec() => b"bar".to_vec()
        },
    )));
}

#[test]
fn headers_in_are_never_extended() {
    let mut context = context();
    let result = call(&mut context, ObjectRef::HeadersIn, "[]=", &[s("X-New"), s("1")]);
    expect!(result).to(be_ok().value(Value::Object(ObjectRef::HeadersIn)));
    expect!(context.request.headers_in.len()).to(be_equal_to(2));
    call(&mut context, ObjectRef::HeadersIn, "[]=", &[s("x-foo"), s("baz")]).unwrap();
    expect!(context.request.header("X-Foo")).to(be_some().value(&b"baz"[..]));
}

#[test]
fn headers_out_insert_scenario() {
    let mut context = context();
    call(
        &mut context,
        ObjectRef::HeadersOut,
        "[]=",
        &[s("Content-Type"), s("text/plain")],
    )
    .unwrap();
    expect!(context.response.headers_out.iter().cloned().collect::<Vec<_>>())
        .to(be_equal_to(vec![h!("Content-Type", "text/plain")]));
    call(&mut context, ObjectRef::HeadersOut, "[]=", &[s("X-Cache"), s("HIT")]).unwrap();
    expect!(context.response.headers_out.len()).to(be_equal_to(2));
}

#[test]
fn header_methods_require_strings() {
    let mut context = context();
    expect!(call(&mut context, ObjectRef::HeadersIn, "[]", &[Value::Int(1)]))
        .to(be_err().value(BridgeError::TypeMismatch("Integer")));
    expect!(call(&mut context, ObjectRef::HeadersOut, "[]=", &[s("X")]))
        .to(be_err().value(BridgeError::ArgumentCount { expected: 2, given: 1 }));
    expect!(call(&mut context, ObjectRef::HeadersOut, "delete", &[s("X")])).to(be_err());
}

#[test]
fn body_scenario() {
    let mut context = context();
    expect!(call(&mut context, ObjectRef::Request, "body", &[]))
        .to(be_err().value(BridgeError::UnavailablePhase));
    context.request.body = Some(RequestBody::in_memory(vec![
        b"ab".to_vec(),
        Vec::new(),
        b"cde".to_vec(),
    ]));
    expect!(call(&mut context, ObjectRef::Request, "body", &[])).to(be_ok().value(s("abcde")));
    context.request.body = Some(RequestBody::in_memory(vec![Vec::new()]));
    expect!(call(&mut context, ObjectRef::Request, "body", &[])).to(be_ok().value(Value::Nil));
}

#[test]
fn scalar_fields_get_and_set() {
    let mut context = context();
    for (getter, setter) in [
        ("request_line", "request_line="),
        ("uri", "uri="),
        ("unparsed_uri", "unparsed_uri="),
        ("method", "method="),
        ("protocol", "protocol="),
        ("args", "args="),
        ("content_type", "content_type="),
    ]
    .iter()
    {
        let result = call(&mut context, ObjectRef::Request, setter, &[s("new value")]);
        expect!(result).to(be_ok().value(Value::Object(ObjectRef::Request)));
        expect!(call(&mut context, ObjectRef::Request, getter, &[]))
            .to(be_ok().value(s("new value")));
    }
}

#[test]
fn setting_a_field_to_nil_is_ignored() {
    let mut context = context();
    let result = call(&mut context, ObjectRef::Request, "uri=", &[Value::Nil]);
    expect!(result).to(be_ok().value(Value::Object(ObjectRef::Request)));
    expect!(context.request.uri.clone()).to(be_equal_to(b"/".to_vec()));
    expect!(call(&mut context, ObjectRef::Request, "method=", &[Value::Int(3)]))
        .to(be_err().value(BridgeError::TypeMismatch("Integer")));
}

#[test]
fn request_objects() {
    let mut context = context();
    expect!(call(&mut context, ObjectRef::Request, "var", &[]))
        .to(be_ok().value(Value::Object(ObjectRef::Var)));
    expect!(call(&mut context, ObjectRef::Request, "headers_in", &[]))
        .to(be_ok().value(Value::Object(ObjectRef::HeadersIn)));
    expect!(call(&mut context, ObjectRef::Request, "headers_out", &[]))
        .to(be_ok().value(Value::Object(ObjectRef::HeadersOut)));
    expect!(call(&mut context, ObjectRef::Request, "no_such_method", &[])).to(be_err().value(
        BridgeError::NoMethod {
            receiver: "Nginx::Request",
            method: "no_such_method".to_string(),
        },
    ));
}

#[test]
fn convenience_readers_go_through_variables() {
    let mut context = context();
    context.request.remote_user = Some(b"alice".to_vec());
    let hostname = context.server.hostname.clone();
    expect!(call(&mut context, ObjectRef::Request, "hostname", &[]))
        .to(be_ok().value(Value::from(hostname)));
    expect!(call(&mut context, ObjectRef::Request, "user", &[])).to(be_ok().value(s("alice")));
    expect!(call(&mut context, ObjectRef::Request, "filename", &[])).to(be_ok());
}

#[test]
fn var_method_missing_reads_and_writes() {
    let mut context = context();
    expect!(call(&mut context, ObjectRef::Var, "limit_rate=", &[Value::Int(4096)]))
        .to(be_ok().value(s("4096")));
    expect!(call(&mut context, ObjectRef::Var, "limit_rate", &[])).to(be_ok().value(s("4096")));
    expect!(call(&mut context, ObjectRef::Var, "request_method", &[])).to(be_ok().value(s("GET")));
    expect!(call(&mut context, ObjectRef::Var, "unknown_variable", &[]))
        .to(be_ok().value(Value::Nil));
    expect!(call(&mut context, ObjectRef::Var, "unknown_variable=", &[s("x")]))
        .to(be_ok().value(Value::Nil));
    expect!(call(&mut context, ObjectRef::Var, "uri=", &[s("/x")])).to(be_ok().value(Value::Nil));
    expect!(call(&mut context, ObjectRef::Var, "args=", &[])).to(be_err());
}

#[test]
fn var_set_stringifies_both_arguments() {
    let mut context = context();
    expect!(call(&mut context, ObjectRef::Var, "set", &[s("args"), Value::Int(10)]))
        .to(be_ok().value(s("10")));
    expect!(context.request.args.clone()).to(be_equal_to(b"10".to_vec()));
    expect!(call(&mut context, ObjectRef::Var, "set", &[s("args")]))
        .to(be_err().value(BridgeError::ArgumentCount { expected: 2, given: 1 }));
}

#[test]
fn invoke_uses_the_current_request() {
    init_logging();
    handle::clear();
    expect!(invoke(ObjectRef::Request, "uri", &[])).to(be_err().value(BridgeError::NoActiveRequest));

    let shared = Rc::new(RefCell::new(context()));
    {
        let _phase = handle::enter(&shared);
        invoke(ObjectRef::Request, "uri=", &[s("/rewritten")]).unwrap();
        expect!(invoke(ObjectRef::Request, "uri", &[])).to(be_ok().value(s("/rewritten")));
    }
    expect!(shared.borrow().request.uri.clone()).to(be_equal_to(b"/rewritten".to_vec()));
    expect!(invoke(ObjectRef::Request, "uri", &[])).to(be_err());
}

#[test]
fn copy_bytes_reserves_requested_capacity() {
    let buf = copy_bytes(b"abc", 10).unwrap();
    expect!(buf.clone()).to(be_equal_to(b"abc".to_vec()));
    expect!(buf.capacity() >= 10).to(be_true());
    expect!(copy_bytes(&[], usize::MAX)).to(be_err().value(BridgeError::Allocation(usize::MAX)));
}
