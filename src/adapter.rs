//! Conversion between hyper requests/responses and request contexts, for runtimes built on
//! hyper.

use std::{net::SocketAddr, sync::Arc};

use futures::TryStreamExt;
use hyper::Body;

use crate::{
    body::RequestBody,
    config::ServerConf,
    context::{Request, RequestContext},
    headers::{HeaderEntry, HeaderList},
};

/// Builds a context from a hyper request. The body is read fully and its chunks are kept
/// as received. A `SocketAddr` request extension is used as the client address.
pub async fn context_from_http_request(
    req: http::Request<Body>,
    server: Arc<ServerConf>,
) -> RequestContext {
    let (parts, body) = req.into_parts();

    let chunks = body
        .try_fold(Vec::new(), |mut chunks, chunk| async move {
            chunks.push(chunk.to_vec());
            Ok(chunks)
        })
        .await;
    let body = match chunks {
        Ok(chunks) => {
            if chunks.is_empty() {
                None
            } else {
                Some(RequestBody::in_memory(chunks))
            }
        }
        Err(err) => {
            error!("Failed to read the request body: {}", err);
            None
        }
    };

    let unparsed_uri = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/")
        .to_string();
    let protocol = format!("{:?}", parts.version);
    let headers_in: HeaderList = parts
        .headers
        .iter()
        .map(|(name, value)| HeaderEntry::new(name.as_str(), value.as_bytes()))
        .collect::<Vec<_>>()
        .into();
    let remote_addr = parts
        .extensions
        .get::<SocketAddr>()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_default();

    let request = Request {
        request_line: format!("{} {} {}", parts.method, unparsed_uri, protocol).into_bytes(),
        uri: parts.uri.path().as_bytes().to_vec(),
        unparsed_uri: unparsed_uri.into_bytes(),
        method_name: parts.method.as_str().as_bytes().to_vec(),
        http_protocol: protocol.into_bytes(),
        args: parts.uri.query().unwrap_or_default().as_bytes().to_vec(),
        headers_in,
        body,
        remote_addr: remote_addr.into_bytes(),
        ..Request::default()
    };
    RequestContext::new(server, request)
}

/// Builds the hyper response head from the context, with the given body. Header entries
/// whose presence marker was cleared by the runtime are skipped.
pub fn http_response_from_context(
    context: &RequestContext,
    body: Option<Vec<u8>>,
) -> http::Result<http::Response<Body>> {
    let mut response = http::Response::builder().status(context.response.status);

    if !context.response.content_type.is_empty() {
        response = response.header(
            http::header::CONTENT_TYPE,
            context.response.content_type.as_slice(),
        );
    }
    for entry in context.response.headers_out.iter().filter(|entry| entry.hash != 0) {
        response = response.header(entry.key.as_slice(), entry.value.as_slice());
    }

    match body {
        Some(body) => response.body(body.into()),
        None => response.body(Body::empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::var_get;
    use expectest::prelude::*;

    fn server() -> Arc<ServerConf> {
        Arc::new(ServerConf::default())
    }

    #[tokio::test]
    async fn request_fields_are_copied() {
        let req = http::Request::builder()
            .method("POST")
            .uri("/path/file.txt?a=1&b=2")
            .header("Host", "example.com")
            .header("X-Foo", "bar")
            .body(Body::from("payload"))
            .unwrap();
        let mut context = context_from_http_request(req, server()).await;

        expect!(context.request.uri.clone()).to(be_equal_to(b"/path/file.txt".to_vec()));
        expect!(context.request.unparsed_uri.clone())
            .to(be_equal_to(b"/path/file.txt?a=1&b=2".to_vec()));
        expect!(context.request.args.clone()).to(be_equal_to(b"a=1&b=2".to_vec()));
        expect!(context.request.request_line.clone())
            .to(be_equal_to(b"POST /path/file.txt?a=1&b=2 HTTP/1.1".to_vec()));
        expect!(context.request.header("x-foo")).to(be_some().value(&b"bar"[..]));
        expect!(var_get(&mut context, "arg_b")).to(be_some().value(b"2".to_vec()));
        expect!(context.body().unwrap().map(|b| b.into_owned()))
            .to(be_some().value(b"payload".to_vec()));
    }

    #[test]
    fn body_chunks_are_kept() {
        let chunks: Vec<Result<&'static str, std::io::Error>> = vec![Ok("ab"), Ok("cde")];
        let req = http::Request::builder()
            .uri("/")
            .body(Body::wrap_stream(futures::stream::iter(chunks)))
            .unwrap();
        let context = tokio_test::block_on(context_from_http_request(req, server()));

        let bufs = context.request.body.clone().and_then(|body| body.bufs);
        expect!(bufs.map(|bufs| bufs.len())).to(be_some().value(2));
        expect!(context.body().unwrap().map(|b| b.into_owned()))
            .to(be_some().value(b"abcde".to_vec()));
    }

    #[tokio::test]
    async fn request_without_body_has_no_body() {
        let req = http::Request::builder().uri("/").body(Body::empty()).unwrap();
        let context = context_from_http_request(req, server()).await;
        expect!(context.request.body.is_none()).to(be_true());
    }

    #[test]
    fn response_carries_status_content_type_and_headers() {
        let mut context = RequestContext::default();
        context.response.status = 201;
        context.response.content_type = b"text/plain".to_vec();
        context.response.headers_out.set_or_update(b"X-Cache", b"HIT", true);
        context.response.headers_out.push(HeaderEntry {
            hash: 0,
            ..h!("X-Removed", "1")
        });

        let response = http_response_from_context(&context, None).unwrap();
        expect!(response.status().as_u16()).to(be_equal_to(201));
        expect!(response.headers().get("content-type").map(|v| v.as_bytes().to_vec()))
            .to(be_some().value(b"text/plain".to_vec()));
        expect!(response.headers().get("x-cache").map(|v| v.as_bytes().to_vec()))
            .to(be_some().value(b"HIT".to_vec()));
        expect!(response.headers().contains_key("x-removed")).to(be_false());
    }
}
