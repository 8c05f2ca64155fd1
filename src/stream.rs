use crate::constants;
use crate::UploadBody;
use bytes::Bytes;
use futures_util::stream::Stream;
use std::io::{self, Read};
use std::pin::Pin;
use std::task::{Context, Poll};

/// A [`Stream`] of [`Bytes`] chunks read from an [`UploadBody`].
///
/// Suitable as a streaming (chunked) HTTP request body. Every chunk but the last is exactly `chunk_size`
/// bytes. The stream ends after the body's tail, and after the first error.
pub struct BodyStream<R> {
    body: Option<UploadBody<R>>,
    chunk_size: usize,
}

impl<R: Read> BodyStream<R> {
    /// A `chunk_size` of zero uses [`DEFAULT_CHUNK_SIZE`](crate::DEFAULT_CHUNK_SIZE).
    pub fn new(body: UploadBody<R>, chunk_size: usize) -> BodyStream<R> {
        let chunk_size = if chunk_size == 0 {
            constants::DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };

        BodyStream {
            body: Some(body),
            chunk_size,
        }
    }
}

impl<R: Read + Unpin> Stream for BodyStream<R> {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        let body = match this.body.as_mut() {
            Some(body) => body,
            None => return Poll::Ready(None),
        };

        let mut buf = vec![0; this.chunk_size];

        match body.read_chunk(&mut buf) {
            Ok(outcome) => {
                buf.truncate(outcome.written);

                if outcome.end_of_stream {
                    this.body = None;
                    if buf.is_empty() {
                        return Poll::Ready(None);
                    }
                }

                Poll::Ready(Some(Ok(Bytes::from(buf))))
            }
            Err(err) => {
                if let Some(mut body) = this.body.take() {
                    body.close();
                }
                Poll::Ready(Some(Err(err.into())))
            }
        }
    }
}
