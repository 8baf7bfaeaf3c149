//! Body wrapper distinguishing live streams from rehydrated buffers.
//!
//! The interceptor either leaves a body untouched (it streams straight
//! through to the caller) or drains it fully for storage. Both states
//! need to look like an ordinary `http_body::Body` downstream, so the
//! caller cannot tell a cache hit from a network fetch.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Buf, Bytes};
use http_body::{Body as HttpBody, Frame};
use pin_project::pin_project;

/// A response body that is either a live stream or materialized bytes.
///
/// # Variants
///
/// - [`Passthrough`](StashBody::Passthrough): the body was never read by
///   the cache layer and streams through untouched.
/// - [`Complete`](StashBody::Complete): the body was fully drained (or
///   rehydrated from a stored entry). The `Option` yields the data once,
///   then ends the stream.
#[pin_project(project = StashBodyProj)]
pub enum StashBody<B>
where
    B: HttpBody,
{
    /// Untouched inner body, forwarded frame by frame.
    Passthrough(#[pin] B),
    /// Fully materialized bytes, yielded as a single data frame.
    Complete(Option<Bytes>),
}

impl<B> StashBody<B>
where
    B: HttpBody,
{
    /// An in-memory body over already materialized bytes.
    pub fn from_bytes(bytes: Bytes) -> Self {
        StashBody::Complete(Some(bytes))
    }

    /// Drain the body to completion, concatenating every data frame.
    ///
    /// No content decoding happens here: compressed bytes stay
    /// compressed, chunked and fixed-length framings both end up as one
    /// contiguous buffer. A read failure surfaces the underlying error
    /// and leaves nothing behind to store.
    pub async fn collect(self) -> Result<Bytes, B::Error>
    where
        B::Data: Send,
    {
        use http_body_util::BodyExt;

        match self {
            StashBody::Complete(Some(bytes)) => Ok(bytes),
            StashBody::Complete(None) => Ok(Bytes::new()),
            StashBody::Passthrough(body) => Ok(body.collect().await?.to_bytes()),
        }
    }
}

impl<B> HttpBody for StashBody<B>
where
    B: HttpBody,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.project() {
            StashBodyProj::Complete(data) => match data.take() {
                Some(bytes) => Poll::Ready(Some(Ok(Frame::data(bytes)))),
                None => Poll::Ready(None),
            },
            StashBodyProj::Passthrough(body) => match body.poll_frame(cx) {
                Poll::Ready(Some(Ok(frame))) => {
                    let frame = frame.map_data(|mut data| data.copy_to_bytes(data.remaining()));
                    Poll::Ready(Some(Ok(frame)))
                }
                Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(e))),
                Poll::Ready(None) => Poll::Ready(None),
                Poll::Pending => Poll::Pending,
            },
        }
    }

    fn size_hint(&self) -> http_body::SizeHint {
        match self {
            StashBody::Complete(Some(bytes)) => http_body::SizeHint::with_exact(bytes.len() as u64),
            StashBody::Complete(None) => http_body::SizeHint::with_exact(0),
            StashBody::Passthrough(body) => body.size_hint(),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            StashBody::Complete(data) => data.is_none(),
            StashBody::Passthrough(body) => body.is_end_stream(),
        }
    }
}

impl<B> fmt::Debug for StashBody<B>
where
    B: HttpBody,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StashBody::Complete(Some(bytes)) => f
                .debug_tuple("Complete")
                .field(&format!("{} bytes", bytes.len()))
                .finish(),
            StashBody::Complete(None) => f.debug_tuple("Complete").field(&"consumed").finish(),
            StashBody::Passthrough(_) => f.debug_tuple("Passthrough").field(&"...").finish(),
        }
    }
}
