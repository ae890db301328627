//! The `context` module holds the request currently being processed. Basically wraps the
//! request, the response and the per-request variable values.

use std::{borrow::Cow, sync::Arc};

use crate::{
    body::read_body,
    config::ServerConf,
    variables::VariableValue,
    BridgeError,
};

mod request;
pub use self::request::*;

mod response;
pub use self::response::*;

/// Main context struct for one in-flight request
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Request as received from the client
    pub request: Request,
    /// Response being built
    pub response: Response,
    /// Values of the indexed variables, one slot per indexed descriptor of the server table
    pub variables: Vec<VariableValue>,
    /// Response rate limit in bytes per second, 0 for none
    pub limit_rate: usize,
    /// Server configuration and variable table shared by all requests
    pub server: Arc<ServerConf>,
}

impl Default for RequestContext {
    /// Creates a context for a default request against a default server
    fn default() -> RequestContext {
        RequestContext::new(Arc::new(ServerConf::default()), Request::default())
    }
}

impl RequestContext {
    /// Creates a context for `request` with empty variable slots sized for the server table
    pub fn new(server: Arc<ServerConf>, request: Request) -> RequestContext {
        let variables = vec![VariableValue::default(); server.variables.indexed_count()];
        RequestContext {
            request,
            response: Response::default(),
            variables,
            limit_rate: 0,
            server,
        }
    }

    /// The request body as a single buffer, see [`crate::body::read_body`]
    pub fn body(&self) -> Result<Option<Cow<'_, [u8]>>, BridgeError> {
        read_body(self.request.body.as_ref())
    }

    /// Current value of a scalar field
    pub fn field(&self, field: ScalarField) -> &[u8] {
        match field {
            ScalarField::RequestLine => &self.request.request_line,
            ScalarField::Uri => &self.request.uri,
            ScalarField::UnparsedUri => &self.request.unparsed_uri,
            ScalarField::Method => &self.request.method_name,
            ScalarField::Protocol => &self.request.http_protocol,
            ScalarField::Args => &self.request.args,
            ScalarField::ContentType => &self.response.content_type,
        }
    }

    /// Replaces a scalar field. The value is taken verbatim, no validation is done.
    pub fn set_field(&mut self, field: ScalarField, value: Vec<u8>) {
        let slot = match field {
            ScalarField::RequestLine => &mut self.request.request_line,
            ScalarField::Uri => &mut self.request.uri,
            ScalarField::UnparsedUri => &mut self.request.unparsed_uri,
            ScalarField::Method => &mut self.request.method_name,
            ScalarField::Protocol => &mut self.request.http_protocol,
            ScalarField::Args => &mut self.request.args,
            ScalarField::ContentType => &mut self.response.content_type,
        };
        *slot = value;
    }
}

/// String fields of the request and response that scripts can read and replace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarField {
    /// Full request line
    RequestLine,
    /// Normalized path
    Uri,
    /// Request target as sent
    UnparsedUri,
    /// Method name
    Method,
    /// Protocol string
    Protocol,
    /// Query string
    Args,
    /// Response content type
    ContentType,
}

impl ScalarField {
    /// All fields, in a fixed order. Variable descriptors refer to fields by position here.
    pub const ALL: [ScalarField; 7] = [
        ScalarField::RequestLine,
        ScalarField::Uri,
        ScalarField::UnparsedUri,
        ScalarField::Method,
        ScalarField::Protocol,
        ScalarField::Args,
        ScalarField::ContentType,
    ];

    /// Position of the field in [`ScalarField::ALL`]
    pub fn index(self) -> usize {
        ScalarField::ALL
            .iter()
            .position(|field| *field == self)
            .unwrap_or_default()
    }

    /// Field at a position in [`ScalarField::ALL`]
    pub fn from_index(index: usize) -> Option<ScalarField> {
        ScalarField::ALL.get(index).copied()
    }
}
