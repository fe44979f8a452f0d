//! Response capture.
//!
//! `CaptureBody` sits between the upstream body and the client connection.
//! Every frame is handed to the client unchanged; data frames are also
//! appended to a `ResponseCapture`. Once the body is complete the capture is
//! passed to a completion callback exactly once.
//!
//! # Completion
//! ```text
//! upstream body ends (poll returns None)          ─┐
//! declared Content-Length fully seen               ├─▶ on_complete(capture)
//! bodyless response (HEAD, 1xx, 204, 304) dropped ─┘
//!
//! body error, or body dropped before completion  ──▶ capture discarded
//! ```

use std::fmt;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use axum::body::Bytes;
use axum::http::header::CONTENT_LENGTH;
use axum::http::{HeaderMap, Method, StatusCode};
use hyper::body::{Body as HttpBody, Frame, SizeHint};
use tracing::Span;

use crate::cache::entry::{render, CachedResponse};

/// Status, headers and body bytes of one upstream response, as seen by the client.
#[derive(Debug, Clone)]
pub struct ResponseCapture {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    expected_len: Option<u64>,
}

impl ResponseCapture {
    pub fn new(method: &Method, status: StatusCode, headers: HeaderMap) -> Self {
        let bodyless = *method == Method::HEAD
            || status.is_informational()
            || status == StatusCode::NO_CONTENT
            || status == StatusCode::NOT_MODIFIED;

        let expected_len = if bodyless {
            Some(0)
        } else {
            headers
                .get(CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
        };

        Self {
            status,
            headers,
            body: Vec::new(),
            expected_len,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    fn append(&mut self, data: &[u8]) {
        self.body.extend_from_slice(data);
    }

    /// Whether every byte the response declared has been seen.
    pub fn is_complete(&self) -> bool {
        self.expected_len == Some(self.body.len() as u64)
    }

    pub fn into_cached(self) -> CachedResponse {
        CachedResponse::new(self.status, self.headers, Bytes::from(self.body))
    }
}

impl fmt::Display for ResponseCapture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render(f, self.status, &self.headers, &self.body)
    }
}

/// Callback receiving a completed capture.
pub type OnComplete = Box<dyn FnOnce(ResponseCapture) + Send>;

struct Pending {
    capture: ResponseCapture,
    on_complete: OnComplete,
}

/// Body decorator that duplicates everything written to the client into a capture.
pub struct CaptureBody<B> {
    inner: B,
    pending: Option<Pending>,
    span: Span,
}

impl<B> CaptureBody<B> {
    /// Wrap `inner`. The current span is re-entered when the callback runs.
    pub fn new<F>(inner: B, capture: ResponseCapture, on_complete: F) -> Self
    where
        F: FnOnce(ResponseCapture) + Send + 'static,
    {
        Self {
            inner,
            pending: Some(Pending {
                capture,
                on_complete: Box::new(on_complete),
            }),
            span: Span::current(),
        }
    }

    fn finish(&mut self) {
        if let Some(pending) = self.pending.take() {
            let _entered = self.span.enter();
            (pending.on_complete)(pending.capture);
        }
    }

    fn abandon(&mut self, reason: &'static str) {
        if let Some(pending) = self.pending.take() {
            let _entered = self.span.enter();
            tracing::debug!(
                received = pending.capture.body.len(),
                expected = ?pending.capture.expected_len,
                reason,
                "Response capture discarded"
            );
        }
    }
}

impl<B> HttpBody for CaptureBody<B>
where
    B: HttpBody<Data = Bytes> + Unpin,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        match ready!(Pin::new(&mut this.inner).poll_frame(cx)) {
            Some(Ok(frame)) => {
                let complete = match (&mut this.pending, frame.data_ref()) {
                    (Some(pending), Some(data)) => {
                        pending.capture.append(data);
                        pending.capture.is_complete()
                    }
                    _ => false,
                };
                if complete {
                    this.finish();
                }
                Poll::Ready(Some(Ok(frame)))
            }
            Some(Err(err)) => {
                this.abandon("upstream body error");
                Poll::Ready(Some(Err(err)))
            }
            None => {
                this.finish();
                Poll::Ready(None)
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl<B> Drop for CaptureBody<B> {
    fn drop(&mut self) {
        let complete = self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.capture.is_complete());
        if complete {
            self.finish();
        } else {
            self.abandon("body dropped before completion");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::body::Body;
    use axum::http::HeaderValue;

    type Slot = Arc<Mutex<Option<ResponseCapture>>>;

    fn capture_into(slot: &Slot) -> impl FnOnce(ResponseCapture) + Send + 'static {
        let slot = Arc::clone(slot);
        move |capture| {
            *slot.lock().unwrap() = Some(capture);
        }
    }

    fn chunked(parts: &'static [&'static str]) -> Body {
        let stream = futures_util::stream::iter(
            parts
                .iter()
                .map(|p| Ok::<_, std::io::Error>(Bytes::from_static(p.as_bytes()))),
        );
        Body::from_stream(stream)
    }

    #[tokio::test]
    async fn client_sees_identical_bytes_and_capture_completes() {
        let slot: Slot = Arc::default();
        let mut headers = HeaderMap::new();
        headers.insert("x-upstream", HeaderValue::from_static("1"));
        let capture = ResponseCapture::new(&Method::GET, StatusCode::OK, headers);

        let body = CaptureBody::new(chunked(&["hel", "lo ", "world"]), capture, capture_into(&slot));
        let delivered = axum::body::to_bytes(Body::new(body), usize::MAX).await.unwrap();

        assert_eq!(&delivered[..], b"hello world");
        let captured = slot.lock().unwrap().take().expect("capture completed");
        assert_eq!(captured.status(), StatusCode::OK);
        assert_eq!(captured.body(), b"hello world");
        assert_eq!(captured.headers().get("x-upstream").unwrap(), "1");
    }

    #[tokio::test]
    async fn completes_as_soon_as_content_length_is_reached() {
        let slot: Slot = Arc::default();
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("5"));
        let capture = ResponseCapture::new(&Method::GET, StatusCode::OK, headers);

        let mut body = CaptureBody::new(chunked(&["ab", "cde", "never-read"]), capture, capture_into(&slot));

        let first = std::future::poll_fn(|cx| Pin::new(&mut body).poll_frame(cx)).await;
        assert!(first.is_some());
        assert!(slot.lock().unwrap().is_none());

        let second = std::future::poll_fn(|cx| Pin::new(&mut body).poll_frame(cx)).await;
        assert!(second.is_some());
        assert_eq!(slot.lock().unwrap().as_ref().unwrap().body(), b"abcde");
    }

    #[tokio::test]
    async fn dropped_partial_body_is_discarded() {
        let slot: Slot = Arc::default();
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("100"));
        let capture = ResponseCapture::new(&Method::GET, StatusCode::OK, headers);

        let mut body = CaptureBody::new(chunked(&["partial", "more"]), capture, capture_into(&slot));
        let _ = std::future::poll_fn(|cx| Pin::new(&mut body).poll_frame(cx)).await;
        drop(body);

        assert!(slot.lock().unwrap().is_none());
    }

    #[test]
    fn bodyless_response_completes_on_drop() {
        let slot: Slot = Arc::default();
        let capture = ResponseCapture::new(&Method::GET, StatusCode::NO_CONTENT, HeaderMap::new());

        drop(CaptureBody::new(Body::empty(), capture, capture_into(&slot)));

        let captured = slot.lock().unwrap().take().expect("capture completed");
        assert_eq!(captured.status(), StatusCode::NO_CONTENT);
        assert!(captured.body().is_empty());
    }

    #[test]
    fn display_matches_cached_form() {
        let mut capture = ResponseCapture::new(&Method::GET, StatusCode::CREATED, HeaderMap::new());
        capture.append(b"done");
        assert_eq!(capture.to_string(), "{Target-response: Status 201 - Header {} - Body done}");
        assert_eq!(capture.clone().into_cached().to_string(), capture.to_string());
    }
}
