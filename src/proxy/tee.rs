//! Fan-out response body.
//!
//! Streams the upstream body to the client while appending every data frame
//! to a pooled capture buffer, so the inspection path adds no latency to
//! client delivery. When the stream ends cleanly the completion callback
//! fires exactly once with the filled buffer. On a stream error or an early
//! drop the callback never fires and the buffer simply returns to its pool.

use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use bytes::Bytes;
use http_body::{Body as HttpBody, Frame, SizeHint};

use crate::buffer::PooledBuffer;

/// Invoked with the captured body once the stream completes.
pub type Completion = Box<dyn FnOnce(PooledBuffer) + Send + 'static>;

/// A body that forwards frames unchanged and captures their bytes aside.
pub struct TeeBody {
    inner: Body,
    capture: Option<PooledBuffer>,
    on_complete: Option<Completion>,
}

impl TeeBody {
    pub fn new(inner: Body, capture: PooledBuffer, on_complete: Completion) -> Self {
        Self {
            inner,
            capture: Some(capture),
            on_complete: Some(on_complete),
        }
    }

    fn finish(&mut self) {
        // Exactly-once: both the buffer and the callback are taken.
        if let (Some(capture), Some(complete)) = (self.capture.take(), self.on_complete.take()) {
            complete(capture);
        }
    }
}

impl HttpBody for TeeBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match Pin::new(&mut self.inner).poll_frame(cx) {
            Poll::Ready(Some(Ok(frame))) => {
                if let Some(data) = frame.data_ref() {
                    if let Some(capture) = self.capture.as_mut() {
                        capture.extend_from_slice(data);
                    }
                }
                Poll::Ready(Some(Ok(frame)))
            }
            Poll::Ready(Some(Err(e))) => {
                // The stream is broken; skip the hand-off. Dropping the
                // capture returns it to the pool.
                self.capture.take();
                self.on_complete.take();
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                self.finish();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
