//! Buffered request body and its assembly into a single contiguous buffer.

use std::borrow::Cow;

use crate::{copy_bytes, BridgeError};

/// Request body as left by the runtime after reading it from the client
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RequestBody {
    /// Chunks in read order
    pub bufs: Option<Vec<Vec<u8>>>,
    /// Set when the body was spooled to a temporary file instead of memory
    pub temp_file: bool,
}

impl RequestBody {
    /// Body fully buffered in memory as the given chunks
    pub fn in_memory(bufs: Vec<Vec<u8>>) -> RequestBody {
        RequestBody {
            bufs: Some(bufs),
            temp_file: false,
        }
    }

    /// Body written to a temporary file
    pub fn spooled() -> RequestBody {
        RequestBody {
            bufs: None,
            temp_file: true,
        }
    }
}

/// Returns the request body as one buffer.
///
/// A single chunk is returned as a borrowed view. Several chunks are copied in order into a
/// newly allocated buffer. An empty body gives `None`. Fails with
/// [`BridgeError::UnavailablePhase`] when there is no body, it went to a temporary file, or no
/// chunks were buffered.
pub fn read_body(body: Option<&RequestBody>) -> Result<Option<Cow<'_, [u8]>>, BridgeError> {
    let bufs = match body {
        Some(RequestBody {
            bufs: Some(bufs),
            temp_file: false,
        }) if !bufs.is_empty() => bufs,
        _ => return Err(BridgeError::UnavailablePhase),
    };

    if bufs.len() == 1 {
        let chunk = &bufs[0];
        return Ok(if chunk.is_empty() {
            None
        } else {
            Some(Cow::Borrowed(chunk.as_slice()))
        });
    }

    let len: usize = bufs.iter().map(Vec::len).sum();
    if len == 0 {
        return Ok(None);
    }

    let mut buf = copy_bytes(&[], len)?;
    for chunk in bufs {
        buf.extend_from_slice(chunk);
    }
    debug!("assembled request body of {} bytes from {} chunks", len, bufs.len());
    Ok(Some(Cow::Owned(buf)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use expectest::prelude::*;

    fn chunks(parts: &[&str]) -> RequestBody {
        RequestBody::in_memory(parts.iter().map(|p| p.as_bytes().to_vec()).collect())
    }

    #[test]
    fn missing_body_is_unavailable() {
        expect!(read_body(None)).to(be_err().value(BridgeError::UnavailablePhase));
    }

    #[test]
    fn spooled_body_is_unavailable() {
        let body = RequestBody::spooled();
        expect!(read_body(Some(&body))).to(be_err().value(BridgeError::UnavailablePhase));
    }

    #[test]
    fn body_without_chunks_is_unavailable() {
        let body = RequestBody::default();
        expect!(read_body(Some(&body))).to(be_err().value(BridgeError::UnavailablePhase));
        let body = RequestBody::in_memory(vec![]);
        expect!(read_body(Some(&body))).to(be_err().value(BridgeError::UnavailablePhase));
    }

    #[test]
    fn single_empty_chunk_is_absent() {
        let body = chunks(&[""]);
        expect!(read_body(Some(&body))).to(be_ok().value(None));
    }

    #[test]
    fn single_chunk_is_borrowed() {
        let body = chunks(&["hello"]);
        let result = read_body(Some(&body)).unwrap().unwrap();
        expect!(matches!(result, Cow::Borrowed(_))).to(be_true());
        expect!(result.as_ref()).to(be_equal_to(&b"hello"[..]));
    }

    #[test]
    fn chunks_are_concatenated_in_order() {
        let body = chunks(&["ab", "", "cde"]);
        let result = read_body(Some(&body)).unwrap().unwrap();
        expect!(result.len()).to(be_equal_to(5));
        expect!(result.as_ref()).to(be_equal_to(&b"abcde"[..]));
    }

    #[test]
    fn all_empty_chunks_are_absent() {
        let body = chunks(&["", "", ""]);
        expect!(read_body(Some(&body))).to(be_ok().value(None));
    }
}
