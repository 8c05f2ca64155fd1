use crate::drain;
use crate::mirror::Mirror;
use crate::observer::{Milestone, Notifier, Observer};
use crate::state::Phase;
use crate::{BodyStream, Segments};
use bytes::Bytes;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

/// The result of one [`UploadBody::read_chunk`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOutcome {
    /// Bytes written to the front of the destination buffer.
    pub written: usize,
    /// The whole body has been delivered.
    pub end_of_stream: bool,
}

/// A `multipart/form-data` body streaming one file, produced on demand as it is read.
///
/// The body yields the multipart head, then the content of the source read directly into the caller's
/// buffer, then the tail.
/// One call fills as much of the buffer as it can across these phases, so any sequence of buffer sizes
/// produces the same bytes. When a read ends exactly at the last tail byte the end of stream is reported by
/// the next call.
///
/// The source is released on exhaustion or [`close`](UploadBody::close), whichever comes first. A body is
/// read once, a new upload needs a new body.
///
/// # Examples
///
/// ```
/// use std::io::Read;
/// use stream_upload::{Segments, UploadBody};
///
/// let segments = Segments::build("file", "a.txt", &[("k", "v")], Some("XYZ")).unwrap();
/// let mut body = UploadBody::from_reader(segments, &b"hello"[..]);
///
/// let mut out = Vec::new();
/// body.read_to_end(&mut out).unwrap();
///
/// assert!(out.starts_with(b"--XYZ\r\n"));
/// assert!(out.ends_with(b"hello\r\n--XYZ\r\nContent-Disposition: form-data; name=\"k\"\r\n\r\nv\r\n--XYZ--"));
/// ```
pub struct UploadBody<R = File> {
    head: Bytes,
    tail: Bytes,
    phase: Phase,
    source: Option<R>,
    source_len: Option<u64>,
    overhead: u64,
    boundary: String,
    content_type: String,
    mirror: Option<Mirror>,
    notifier: Notifier,
    delivered: u64,
    source_bytes: u64,
    finished: bool,
    abandoned: bool,
    poisoned: bool,
}

impl<R: Read> UploadBody<R> {
    /// Creates a body sending `segments` around everything read from `source`.
    pub fn from_reader(segments: Segments, source: R) -> UploadBody<R> {
        let overhead = segments.overhead();
        let (head, tail, boundary, content_type) = segments.into_parts();

        UploadBody {
            head,
            tail,
            phase: Phase::default(),
            source: Some(source),
            source_len: None,
            overhead,
            boundary,
            content_type,
            mirror: None,
            notifier: Notifier::default(),
            delivered: 0,
            source_bytes: 0,
            finished: false,
            abandoned: false,
            poisoned: false,
        }
    }

    /// Declares the number of bytes `source` will yield, enabling [`content_length`](UploadBody::content_length).
    ///
    /// A source yielding a different number of bytes fails the read with
    /// [`Error::SourceReadFailure`](crate::Error::SourceReadFailure).
    pub fn with_source_len(mut self, len: u64) -> UploadBody<R> {
        self.source_len = Some(len);
        self
    }

    /// Tags the milestones reported to the observer.
    pub fn with_trace_id<T: Into<String>>(mut self, trace_id: T) -> UploadBody<R> {
        self.notifier.trace_id = trace_id.into();
        self
    }

    /// Reports milestones to `observer`, starting with the built segments.
    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> UploadBody<R> {
        self.notifier.observer = Some(observer);
        self.notifier.emit(Milestone::SegmentsBuilt {
            head_len: self.head.len(),
            tail_len: self.tail.len(),
        });
        self
    }

    /// Mirrors every delivered byte to `<base>.fin`.
    pub fn with_mirror<P: AsRef<Path>>(mut self, base: P) -> UploadBody<R> {
        self.mirror = Some(Mirror::new(base.as_ref()));
        self
    }

    /// Fills `buf` with the next bytes of the body.
    ///
    /// Reads continue after the final one, reporting end of stream with nothing written. A source read error
    /// is returned as [`Error::SourceReadFailure`](crate::Error::SourceReadFailure) and leaves the body
    /// unusable.
    pub fn read_chunk(&mut self, buf: &mut [u8]) -> crate::Result<ReadOutcome> {
        if self.poisoned {
            return Err(crate::Error::Misuse("read after a source read failure"));
        }
        if self.abandoned {
            return Err(crate::Error::Misuse("read after close"));
        }
        if buf.is_empty() {
            return Ok(ReadOutcome {
                written: 0,
                end_of_stream: self.finished,
            });
        }

        if self.mirror.is_some() {
            self.notifier.emit(Milestone::BufferSize(buf.len()));
        }

        let mut written = 0;
        let mut end_of_stream = false;

        loop {
            match self.phase {
                Phase::Head => {
                    written += drain::drain_segment(&mut self.head, &mut buf[written..]);
                    if !self.head.is_empty() {
                        break;
                    }
                }
                Phase::Body => {
                    let source = match self.source.as_mut() {
                        Some(source) => source,
                        None => return Err(crate::Error::Misuse("source released before it was drained")),
                    };

                    let (n, eof) = match drain::drain_source(source, &mut buf[written..]) {
                        Ok(read) => read,
                        Err(err) => {
                            self.poisoned = true;
                            return Err(crate::Error::SourceReadFailure(err));
                        }
                    };

                    written += n;
                    self.source_bytes += n as u64;
                    if let Err(err) = self.check_source_len(eof) {
                        self.poisoned = true;
                        return Err(crate::Error::SourceReadFailure(err));
                    }
                    if !eof {
                        break;
                    }
                }
                Phase::Tail => {
                    written += drain::drain_segment(&mut self.tail, &mut buf[written..]);
                    end_of_stream = written < buf.len();
                    break;
                }
            }

            if let Some(next) = self.phase.next() {
                self.phase = next;
            }
        }

        self.delivered += written as u64;
        if let Some(mirror) = self.mirror.as_mut() {
            mirror.write(&buf[..written], &self.notifier);
        }
        if end_of_stream {
            self.finish();
        }

        log::trace!(
            "upload body read: requested={} written={} phase={:?} eof={}",
            buf.len(),
            written,
            self.phase,
            end_of_stream
        );

        Ok(ReadOutcome { written, end_of_stream })
    }

    // The declared length is the promised `Content-Length`.
    fn check_source_len(&self, eof: bool) -> io::Result<()> {
        let len = match self.source_len {
            Some(len) => len,
            None => return Ok(()),
        };

        if self.source_bytes > len {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("source yielded more than the declared {} bytes", len),
            ));
        }
        if eof && self.source_bytes < len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("source ended after {} of the declared {} bytes", self.source_bytes, len),
            ));
        }
        Ok(())
    }

    /// Converts this body into a [`Stream`](futures_util::Stream) of chunks of at most `chunk_size` bytes.
    ///
    /// The source is still read synchronously on each poll.
    pub fn into_stream(self, chunk_size: usize) -> BodyStream<R> {
        BodyStream::new(self, chunk_size)
    }
}

impl<R> UploadBody<R> {
    /// Releases the source and the mirror file.
    ///
    /// Closing a body that hasn't been read to the end abandons the upload, later reads fail with
    /// [`Error::Misuse`](crate::Error::Misuse). Closing again, or after exhaustion, does nothing.
    pub fn close(&mut self) {
        if self.finished || self.abandoned {
            return;
        }
        self.abandoned = true;
        self.release();
    }

    /// The `Content-Type` header value of this body.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// The boundary delimiting the parts.
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// The full length of the body, known only when the source length is.
    pub fn content_length(&self) -> Option<u64> {
        self.source_len.map(|len| self.overhead + len)
    }

    /// The current phase of the stream.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Bytes handed out so far.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    /// Source bytes handed out so far.
    pub fn source_bytes(&self) -> u64 {
        self.source_bytes
    }

    /// The stream was read to the end.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// The source hasn't been released yet.
    pub fn is_open(&self) -> bool {
        self.source.is_some()
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.release();
    }

    fn release(&mut self) {
        let had_source = self.source.take().is_some();
        if let Some(mirror) = self.mirror.as_mut() {
            mirror.close();
        }

        if had_source {
            log::debug!(
                "upload body closed: delivered={} source_bytes={} finished={}",
                self.delivered,
                self.source_bytes,
                self.finished
            );
            self.notifier.emit(Milestone::Closed {
                delivered: self.delivered,
                source_bytes: self.source_bytes,
            });
        }
    }
}

impl<R: Read> Read for UploadBody<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_chunk(buf).map(|outcome| outcome.written).map_err(io::Error::from)
    }
}

impl<R> std::fmt::Debug for UploadBody<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadBody")
            .field("boundary", &self.boundary)
            .field("phase", &self.phase)
            .field("delivered", &self.delivered)
            .field("source_bytes", &self.source_bytes)
            .field("finished", &self.finished)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    const NO_FIELDS: &[(&str, &str)] = &[];

    fn body(content: &'static [u8], fields: &[(&str, &str)]) -> (UploadBody<&'static [u8]>, Vec<u8>) {
        let segments = Segments::build("file", "a.txt", fields, Some("XYZ")).unwrap();
        let mut expected = segments.head().to_vec();
        expected.extend_from_slice(content);
        expected.extend_from_slice(segments.tail());
        (UploadBody::from_reader(segments, content), expected)
    }

    fn read_with_sizes<R: Read>(body: &mut UploadBody<R>, sizes: impl Fn(usize) -> usize) -> Vec<u8> {
        let mut out = Vec::new();
        let mut call = 0;
        loop {
            let mut buf = vec![0u8; sizes(call)];
            let outcome = body.read_chunk(&mut buf).unwrap();
            out.extend_from_slice(&buf[..outcome.written]);
            call += 1;
            if outcome.end_of_stream {
                return out;
            }
        }
    }

    #[test]
    fn test_single_large_read() {
        let (mut body, expected) = body(b"hello", &[("k", "v")]);
        let mut buf = vec![0u8; 4096];

        let outcome = body.read_chunk(&mut buf).unwrap();
        assert_eq!(outcome.written, expected.len());
        assert!(outcome.end_of_stream);
        assert_eq!(&buf[..outcome.written], &expected[..]);
        assert!(!body.is_open());
    }

    #[test]
    fn test_any_chunking_yields_same_bytes() {
        for size in 1..40 {
            let (mut body, expected) = body(b"some file content\r\n--XY", &[("k", "v"), ("x", "yz")]);
            assert_eq!(read_with_sizes(&mut body, |_| size), expected, "chunk size {}", size);
        }

        let (mut body, expected) = body(b"varying", NO_FIELDS);
        assert_eq!(read_with_sizes(&mut body, |call| call % 7 + 1), expected);
    }

    #[test]
    fn test_exact_fill_defers_end_of_stream() {
        let (mut body, expected) = body(b"hello", NO_FIELDS);
        let mut buf = vec![0u8; expected.len()];

        let outcome = body.read_chunk(&mut buf).unwrap();
        assert_eq!(
            outcome,
            ReadOutcome {
                written: expected.len(),
                end_of_stream: false
            }
        );
        assert_eq!(buf, expected);
        assert!(body.is_open());

        let outcome = body.read_chunk(&mut buf).unwrap();
        assert_eq!(
            outcome,
            ReadOutcome {
                written: 0,
                end_of_stream: true
            }
        );
        assert!(!body.is_open());
    }

    #[test]
    fn test_head_exact_fill_advances_to_body() {
        let (mut body, expected) = body(b"hello", NO_FIELDS);
        let head_len = expected.len() - 5 - b"\r\n--XYZ--".len();

        let mut buf = vec![0u8; head_len];
        let outcome = body.read_chunk(&mut buf).unwrap();
        assert_eq!(outcome.written, head_len);
        assert!(!outcome.end_of_stream);
        assert_eq!(body.phase(), Phase::Body);

        let mut rest = vec![0u8; 4096];
        let outcome = body.read_chunk(&mut rest).unwrap();
        assert!(outcome.end_of_stream);
        buf.extend_from_slice(&rest[..outcome.written]);
        assert_eq!(buf, expected);
    }

    #[test]
    fn test_reads_after_exhaustion() {
        let (mut body, expected) = body(b"hello", NO_FIELDS);
        assert_eq!(read_with_sizes(&mut body, |_| 3), expected);

        for _ in 0..3 {
            let outcome = body.read_chunk(&mut [0u8; 16]).unwrap();
            assert_eq!(
                outcome,
                ReadOutcome {
                    written: 0,
                    end_of_stream: true
                }
            );
        }
        assert!(body.read_chunk(&mut []).unwrap().end_of_stream);
        assert_eq!(body.delivered(), expected.len() as u64);
        assert_eq!(body.source_bytes(), 5);

        body.close();
        body.close();
        assert!(body.is_finished());
    }

    #[test]
    fn test_empty_buffer_is_noop() {
        let (mut body, _) = body(b"hello", NO_FIELDS);
        assert_eq!(
            body.read_chunk(&mut []).unwrap(),
            ReadOutcome {
                written: 0,
                end_of_stream: false
            }
        );
        assert_eq!(body.phase(), Phase::Head);
        assert_eq!(body.delivered(), 0);
    }

    #[test]
    fn test_empty_source() {
        let (mut body, expected) = body(b"", &[("k", "v")]);
        assert_eq!(read_with_sizes(&mut body, |_| 5), expected);
        assert_eq!(body.source_bytes(), 0);
    }

    #[test]
    fn test_close_before_exhaustion_abandons() {
        let (mut body, _) = body(b"hello", NO_FIELDS);
        body.read_chunk(&mut [0u8; 4]).unwrap();

        body.close();
        assert!(!body.is_open());
        assert!(!body.is_finished());
        assert_eq!(
            body.read_chunk(&mut [0u8; 4]).unwrap_err(),
            crate::Error::Misuse("read after close")
        );
        body.close();
    }

    #[test]
    fn test_source_failure_poisons_body() {
        struct FailAfter {
            remaining: usize,
        }

        impl Read for FailAfter {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if self.remaining == 0 {
                    return Err(io::Error::new(io::ErrorKind::Other, "device gone"));
                }
                let n = self.remaining.min(buf.len());
                buf[..n].fill(b'x');
                self.remaining -= n;
                Ok(n)
            }
        }

        let segments = Segments::build("file", "a.bin", NO_FIELDS, Some("XYZ")).unwrap();
        let mut body = UploadBody::from_reader(segments, FailAfter { remaining: 3 });

        let err = body.read_chunk(&mut [0u8; 1024]).unwrap_err();
        assert!(matches!(err, crate::Error::SourceReadFailure(_)));
        assert_eq!(body.phase(), Phase::Body);

        let err = body.read_chunk(&mut [0u8; 1024]).unwrap_err();
        assert!(matches!(err, crate::Error::Misuse(_)));

        let err = body.read(&mut [0u8; 16]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Other);

        body.close();
        assert!(!body.is_open());
    }

    #[test]
    fn test_std_read_impl() {
        let (mut body, expected) = body(b"hello", &[("k", "v")]);
        let mut out = Vec::new();
        body.read_to_end(&mut out).unwrap();
        assert_eq!(out, expected);
        assert_eq!(body.read(&mut [0u8; 8]).unwrap(), 0);
    }

    #[test]
    fn test_content_length() {
        let (body, expected) = body(b"hello", &[("k", "v")]);
        assert_eq!(body.content_length(), None);
        let body = body.with_source_len(5);
        assert_eq!(body.content_length(), Some(expected.len() as u64));
    }

    #[test]
    fn test_short_source_fails_declared_length() {
        let (body, _) = body(b"hello", NO_FIELDS);
        let mut body = body.with_source_len(10);

        let err = body.read_chunk(&mut [0u8; 4096]).unwrap_err();
        match err {
            crate::Error::SourceReadFailure(cause) => assert_eq!(cause.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("unexpected error: {}", other),
        }
        assert!(!body.is_finished());
        assert!(matches!(body.read_chunk(&mut [0u8; 16]), Err(crate::Error::Misuse(_))));
    }

    #[test]
    fn test_long_source_fails_declared_length() {
        let (body, _) = body(b"hello world", NO_FIELDS);
        let mut body = body.with_source_len(5);

        let err = body.read(&mut [0u8; 4096]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(!body.is_finished());

        body.close();
        assert!(!body.is_open());
    }

    #[test]
    fn test_declared_length_matching_source() {
        let (body, expected) = body(b"hello", &[("k", "v")]);
        let mut body = body.with_source_len(5);

        assert_eq!(read_with_sizes(&mut body, |call| call % 4 + 1), expected);
        assert_eq!(body.delivered(), body.content_length().unwrap());
    }

    #[test]
    fn test_observer_sees_close_once() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let (body, expected) = body(b"hello", NO_FIELDS);
        let mut body = body
            .with_trace_id("t-42")
            .with_observer(Arc::new(move |trace_id: &str, m: &Milestone<'_>| {
                sink.lock().unwrap().push(format!("{}: {}", trace_id, m));
            }));

        assert_eq!(read_with_sizes(&mut body, |_| 7), expected);
        body.read_chunk(&mut [0u8; 7]).unwrap();
        body.close();

        let events = events.lock().unwrap();
        assert!(events[0].starts_with("t-42: segments built"));
        let closes = events.iter().filter(|e| e.contains("closed after")).count();
        assert_eq!(closes, 1);
        assert!(events
            .last()
            .unwrap()
            .ends_with(&format!("closed after {} bytes, file bytes: 5", expected.len())));
    }
}
