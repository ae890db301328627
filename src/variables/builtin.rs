//! Variables every server registers, plus the prefix families that expose request headers,
//! response headers, query arguments and cookies by name.

use chrono::{Local, SecondsFormat};

use super::{getter, setter, VariableDescriptor, VariableTable, VariableValue};
use crate::context::{RequestContext, ScalarField};

lazy_static! {
    /// Built-in descriptors, registered into every server table
    pub static ref BUILTIN_VARIABLES: Vec<VariableDescriptor> = vec![
        field("request", ScalarField::RequestLine),
        field("uri", ScalarField::Uri),
        field("document_uri", ScalarField::Uri),
        field("request_uri", ScalarField::UnparsedUri),
        field("request_method", ScalarField::Method),
        field("server_protocol", ScalarField::Protocol),
        field("query_string", ScalarField::Args),
        field("args", ScalarField::Args)
            .changeable()
            .no_cacheable()
            .with_setter(setter(set_field)),
        VariableDescriptor::new("is_args").with_getter(getter(is_args), 0),
        VariableDescriptor::new("host").with_getter(getter(host), 0),
        request_header("content_type", "Content-Type"),
        request_header("content_length", "Content-Length"),
        VariableDescriptor::new("hostname").with_getter(getter(hostname), 0),
        VariableDescriptor::new("remote_addr").with_getter(getter(remote_addr), 0),
        VariableDescriptor::new("remote_user").with_getter(getter(remote_user), 0),
        VariableDescriptor::new("document_root").with_getter(getter(document_root), 0),
        VariableDescriptor::new("request_filename").with_getter(getter(request_filename), 0),
        VariableDescriptor::new("request_body")
            .no_cacheable()
            .with_getter(getter(request_body), 0),
        VariableDescriptor::new("status")
            .no_cacheable()
            .with_getter(getter(status), 0),
        VariableDescriptor::new("limit_rate")
            .changeable()
            .no_cacheable()
            .with_getter(getter(limit_rate), 0)
            .with_setter(setter(set_limit_rate)),
        VariableDescriptor::new("pid").with_getter(getter(pid), 0),
        VariableDescriptor::new("msec")
            .no_cacheable()
            .with_getter(getter(msec), 0),
        VariableDescriptor::new("time_iso8601")
            .no_cacheable()
            .with_getter(getter(time_iso8601), 0),
        VariableDescriptor::new("time_local")
            .no_cacheable()
            .with_getter(getter(time_local), 0),
        VariableDescriptor::new("request_time")
            .no_cacheable()
            .with_getter(getter(request_time), 0),
        VariableDescriptor::new("http_")
            .prefix()
            .with_getter(getter(http_header), 0),
        VariableDescriptor::new("sent_http_")
            .prefix()
            .with_getter(getter(sent_http_header), 0),
        VariableDescriptor::new("arg_")
            .prefix()
            .with_getter(getter(arg), 0),
        VariableDescriptor::new("cookie_")
            .prefix()
            .with_getter(getter(cookie), 0),
    ];
}

/// Builtin variables that get a per-request slot
const INDEXED: [&str; 3] = ["args", "limit_rate", "request_body"];

/// Registers the built-in variables into `table`
pub fn register(table: &mut VariableTable) {
    for descriptor in BUILTIN_VARIABLES.iter() {
        if INDEXED.contains(&descriptor.name.as_str()) {
            table.add_indexed(descriptor.clone());
        } else {
            table.add(descriptor.clone());
        }
    }
}

fn found(data: &[u8]) -> Option<VariableValue> {
    Some(VariableValue::new(data))
}

fn found_or_missing(data: Option<&[u8]>) -> Option<VariableValue> {
    Some(data.map_or_else(VariableValue::not_found, VariableValue::new))
}

fn field(name: &str, field: ScalarField) -> VariableDescriptor {
    VariableDescriptor::new(name).with_getter(getter(get_field), field.index())
}

fn get_field(context: &RequestContext, _: &str, data: usize) -> Option<VariableValue> {
    ScalarField::from_index(data).and_then(|field| found(context.field(field)))
}

fn set_field(context: &mut RequestContext, value: &VariableValue, data: usize) {
    if let Some(field) = ScalarField::from_index(data) {
        context.set_field(field, value.data.clone());
    }
}

fn request_header(name: &str, header: &'static str) -> VariableDescriptor {
    VariableDescriptor::new(name).with_getter(
        getter(move |context, _, _| found_or_missing(context.request.header(header))),
        0,
    )
}

fn host(context: &RequestContext, _: &str, _: usize) -> Option<VariableValue> {
    match context.request.header("Host") {
        Some(host) => {
            // strip the port
            let end = host.iter().position(|b| *b == b':').unwrap_or(host.len());
            Some(VariableValue::new(host[..end].to_ascii_lowercase()))
        }
        None => found(context.server.hostname.as_bytes()),
    }
}

fn is_args(context: &RequestContext, _: &str, _: usize) -> Option<VariableValue> {
    let is_args: &[u8] = if context.request.args.is_empty() { b"" } else { b"?" };
    found(is_args)
}

fn hostname(context: &RequestContext, _: &str, _: usize) -> Option<VariableValue> {
    found(context.server.hostname.as_bytes())
}

fn remote_addr(context: &RequestContext, _: &str, _: usize) -> Option<VariableValue> {
    found(&context.request.remote_addr)
}

fn remote_user(context: &RequestContext, _: &str, _: usize) -> Option<VariableValue> {
    found_or_missing(context.request.remote_user.as_deref())
}

fn document_root(context: &RequestContext, _: &str, _: usize) -> Option<VariableValue> {
    found(context.server.document_root.as_bytes())
}

fn request_filename(context: &RequestContext, _: &str, _: usize) -> Option<VariableValue> {
    let root = context.server.document_root.trim_end_matches('/');
    let mut path = root.as_bytes().to_vec();
    if !context.request.uri.starts_with(b"/") {
        path.push(b'/');
    }
    path.extend_from_slice(&context.request.uri);
    Some(VariableValue::new(path))
}

fn request_body(context: &RequestContext, _: &str, _: usize) -> Option<VariableValue> {
    match context.body() {
        Ok(Some(body)) => found(&body),
        Ok(None) => found(b""),
        Err(_) => Some(VariableValue::not_found()),
    }
}

fn status(context: &RequestContext, _: &str, _: usize) -> Option<VariableValue> {
    Some(VariableValue::new(format!("{:03}", context.response.status)))
}

fn limit_rate(context: &RequestContext, _: &str, _: usize) -> Option<VariableValue> {
    Some(VariableValue::new(context.limit_rate.to_string()))
}

fn set_limit_rate(context: &mut RequestContext, value: &VariableValue, _: usize) {
    match parse_size(&value.data) {
        Some(rate) => context.limit_rate = rate,
        None => log_error!(
            "set_limit_rate",
            "invalid $limit_rate \"{}\"",
            String::from_utf8_lossy(&value.data)
        ),
    }
}

/// Parses a size with an optional `k` or `m` suffix, e.g. `4096`, `16k`, `1M`
pub fn parse_size(data: &[u8]) -> Option<usize> {
    let text = std::str::from_utf8(data).ok()?.trim();
    let (digits, scale) = match text.chars().last()? {
        'k' | 'K' => (&text[..text.len() - 1], 1024),
        'm' | 'M' => (&text[..text.len() - 1], 1024 * 1024),
        _ => (text, 1),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<usize>().ok()?.checked_mul(scale)
}

fn pid(_: &RequestContext, _: &str, _: usize) -> Option<VariableValue> {
    Some(VariableValue::new(std::process::id().to_string()))
}

fn msec(_: &RequestContext, _: &str, _: usize) -> Option<VariableValue> {
    let now = Local::now();
    Some(VariableValue::new(format!(
        "{}.{:03}",
        now.timestamp(),
        now.timestamp_subsec_millis()
    )))
}

fn time_iso8601(_: &RequestContext, _: &str, _: usize) -> Option<VariableValue> {
    Some(VariableValue::new(
        Local::now().to_rfc3339_opts(SecondsFormat::Secs, false),
    ))
}

fn time_local(_: &RequestContext, _: &str, _: usize) -> Option<VariableValue> {
    Some(VariableValue::new(
        Local::now().format("%d/%b/%Y:%H:%M:%S %z").to_string(),
    ))
}

fn request_time(context: &RequestContext, _: &str, _: usize) -> Option<VariableValue> {
    let elapsed = Local::now()
        .signed_duration_since(context.request.start_time)
        .num_milliseconds()
        .max(0);
    Some(VariableValue::new(format!(
        "{}.{:03}",
        elapsed / 1000,
        elapsed % 1000
    )))
}

/// Header name for a variable suffix: underscores stand for dashes
fn header_matches(key: &[u8], suffix: &str) -> bool {
    key.len() == suffix.len()
        && key.iter().zip(suffix.bytes()).all(|(k, s)| {
            let k = if *k == b'-' { b'_' } else { k.to_ascii_lowercase() };
            k == s
        })
}

fn http_header(context: &RequestContext, name: &str, _: usize) -> Option<VariableValue> {
    let suffix = &name["http_".len()..];
    found_or_missing(
        context
            .request
            .headers_in
            .iter()
            .find(|entry| header_matches(&entry.key, suffix))
            .map(|entry| entry.value.as_slice()),
    )
}

fn sent_http_header(context: &RequestContext, name: &str, _: usize) -> Option<VariableValue> {
    let suffix = &name["sent_http_".len()..];
    if suffix == "content_type" && !context.response.content_type.is_empty() {
        return found(&context.response.content_type);
    }
    found_or_missing(
        context
            .response
            .headers_out
            .iter()
            .find(|entry| header_matches(&entry.key, suffix))
            .map(|entry| entry.value.as_slice()),
    )
}

fn arg(context: &RequestContext, name: &str, _: usize) -> Option<VariableValue> {
    found_or_missing(context.request.arg(name["arg_".len()..].as_bytes()))
}

fn cookie(context: &RequestContext, name: &str, _: usize) -> Option<VariableValue> {
    found_or_missing(context.request.cookie(name["cookie_".len()..].as_bytes()))
}
