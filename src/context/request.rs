use chrono::{DateTime, Local};

use crate::{body::RequestBody, headers::HeaderList};

/// Request half of the context, as parsed by the runtime
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Full request line, e.g. `GET /index.html?a=1 HTTP/1.1`
    pub request_line: Vec<u8>,
    /// Normalized request path
    pub uri: Vec<u8>,
    /// Request target exactly as sent by the client
    pub unparsed_uri: Vec<u8>,
    /// Request method
    pub method_name: Vec<u8>,
    /// Protocol string, e.g. `HTTP/1.1`
    pub http_protocol: Vec<u8>,
    /// Query string without the leading `?`
    pub args: Vec<u8>,
    /// Request headers in the order received
    pub headers_in: HeaderList,
    /// Buffered request body, if the runtime has read one
    pub body: Option<RequestBody>,
    /// Client address
    pub remote_addr: Vec<u8>,
    /// Authenticated user name, if any
    pub remote_user: Option<Vec<u8>>,
    /// When processing of the request started
    pub start_time: DateTime<Local>,
}

impl Default for Request {
    /// Creates a default request (GET / HTTP/1.1)
    fn default() -> Request {
        Request {
            request_line: b"GET / HTTP/1.1".to_vec(),
            uri: b"/".to_vec(),
            unparsed_uri: b"/".to_vec(),
            method_name: b"GET".to_vec(),
            http_protocol: b"HTTP/1.1".to_vec(),
            args: Vec::new(),
            headers_in: HeaderList::new(),
            body: None,
            remote_addr: b"127.0.0.1".to_vec(),
            remote_user: None,
            start_time: Local::now(),
        }
    }
}

impl Request {
    /// Value of the first request header named `key`, ignoring case
    pub fn header(&self, key: &str) -> Option<&[u8]> {
        self.headers_in.get_exact(key.as_bytes())
    }

    /// Value of the `name` query argument. Argument names are compared ignoring ASCII case.
    pub fn arg(&self, name: &[u8]) -> Option<&[u8]> {
        self.args
            .split(|b| *b == b'&')
            .filter_map(|pair| {
                let mut parts = pair.splitn(2, |b| *b == b'=');
                match (parts.next(), parts.next()) {
                    (Some(key), value) if key.eq_ignore_ascii_case(name) => {
                        Some(value.unwrap_or(&[]))
                    }
                    _ => None,
                }
            })
            .next()
    }

    /// Value of the `name` cookie from the Cookie headers
    pub fn cookie(&self, name: &[u8]) -> Option<&[u8]> {
        self.headers_in
            .iter()
            .filter(|entry| entry.key.eq_ignore_ascii_case(b"cookie"))
            .flat_map(|entry| entry.value.split(|b| *b == b';'))
            .filter_map(|pair| {
                let pair = trim(pair);
                let mut parts = pair.splitn(2, |b| *b == b'=');
                match (parts.next(), parts.next()) {
                    (Some(key), Some(value)) if key.eq_ignore_ascii_case(name) => Some(value),
                    _ => None,
                }
            })
            .next()
    }
}

fn trim(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |p| p + 1);
    &bytes[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use expectest::prelude::*;

    #[test]
    fn arg_finds_named_query_argument() {
        let request = Request {
            args: b"a=1&Limit=20&flag".to_vec(),
            ..Request::default()
        };
        expect!(request.arg(b"a")).to(be_some().value(&b"1"[..]));
        expect!(request.arg(b"limit")).to(be_some().value(&b"20"[..]));
        expect!(request.arg(b"flag")).to(be_some().value(&b""[..]));
        expect!(request.arg(b"missing")).to(be_none());
    }

    #[test]
    fn cookie_searches_all_cookie_headers() {
        let request = Request {
            headers_in: vec![h!("Cookie", "a=1; session=abc"), h!("Cookie", "theme=dark")].into(),
            ..Request::default()
        };
        expect!(request.cookie(b"session")).to(be_some().value(&b"abc"[..]));
        expect!(request.cookie(b"theme")).to(be_some().value(&b"dark"[..]));
        expect!(request.cookie(b"other")).to(be_none());
    }
}
