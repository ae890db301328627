use crate::headers::HeaderList;

/// Response half of the context
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// status code to return
    pub status: u16,
    /// Content type of the response
    pub content_type: Vec<u8>,
    /// Outbound headers, in the order they will be written
    pub headers_out: HeaderList,
}

impl Default for Response {
    /// Creates a default response (200 OK)
    fn default() -> Response {
        Response {
            status: 200,
            content_type: Vec::new(),
            headers_out: HeaderList::new(),
        }
    }
}

impl Response {
    /// Value of the first response header named `key`, ignoring case
    pub fn header(&self, key: &str) -> Option<&[u8]> {
        self.headers_out.get_exact(key.as_bytes())
    }
}
