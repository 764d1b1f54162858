//! The endpoint contract a provider client implements to be traced.
//!
//! Only the calls the tracer makes are part of the contract: `create`, plus a
//! capability flag saying whether replies carry the transport's headers.

use async_trait::async_trait;
use serde::Serialize;

use http::HeaderMap;

use crate::CallParams;

/// What an endpoint returned: one payload or a stream of fragments, plus the
/// raw response headers when the endpoint exposes them.
#[derive(Debug)]
pub struct RawReply<R, S> {
    pub headers: Option<HeaderMap>,
    pub body: ReplyBody<R, S>,
}

#[derive(Debug)]
pub enum ReplyBody<R, S> {
    Complete(R),
    Stream(S),
}

impl<R, S> RawReply<R, S> {
    pub fn complete(response: R) -> Self {
        Self {
            headers: None,
            body: ReplyBody::Complete(response),
        }
    }

    pub fn stream(stream: S) -> Self {
        Self {
            headers: None,
            body: ReplyBody::Stream(stream),
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = Some(headers);
        self
    }
}

/// Capabilities shared by blocking and async endpoints. Queried once, when
/// the endpoint is wrapped.
pub trait EndpointCapabilities: Send + Sync {
    /// Whether [`RawReply::headers`] is populated by this endpoint.
    fn exposes_raw_response(&self) -> bool {
        false
    }
}

/// A blocking provider endpoint such as `chat.completions`.
pub trait Endpoint: EndpointCapabilities {
    type Response: Serialize;
    type Chunk: Serialize;
    type Error;
    type Stream: Iterator<Item = Result<Self::Chunk, Self::Error>> + Send;

    fn create(
        &self,
        params: CallParams,
    ) -> Result<RawReply<Self::Response, Self::Stream>, Self::Error>;
}

/// The async counterpart of [`Endpoint`].
#[async_trait]
pub trait AsyncEndpoint: EndpointCapabilities {
    type Response: Serialize + Send;
    type Chunk: Serialize + Send;
    type Error: Send;
    type Stream: futures::Stream<Item = Result<Self::Chunk, Self::Error>> + Unpin + Send;

    async fn create(
        &self,
        params: CallParams,
    ) -> Result<RawReply<Self::Response, Self::Stream>, Self::Error>;
}
