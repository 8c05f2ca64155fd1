use bytes::{Buf, Bytes};
use std::io::{self, Read};

/// Copies as much of `segment` as fits into `dst`, consuming what was copied.
pub(crate) fn drain_segment(segment: &mut Bytes, dst: &mut [u8]) -> usize {
    let n = segment.len().min(dst.len());
    dst[..n].copy_from_slice(&segment[..n]);
    segment.advance(n);
    n
}

/// Reads from `src` until `dst` is full or `src` reports end of data.
///
/// Returns the number of bytes written and whether end of data was reached. `Interrupted` reads are retried.
pub(crate) fn drain_source<R: Read + ?Sized>(src: &mut R, dst: &mut [u8]) -> io::Result<(usize, bool)> {
    let mut filled = 0;

    while filled < dst.len() {
        match src.read(&mut dst[filled..]) {
            Ok(0) => return Ok((filled, true)),
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }

    Ok((filled, false))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Yields at most `step` bytes per read and interrupts every other call.
    struct Trickle<'a> {
        data: &'a [u8],
        step: usize,
        interrupt: bool,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }
            let n = self.step.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn test_drain_segment() {
        let mut segment = Bytes::from_static(b"abcdef");
        let mut dst = [0u8; 4];

        assert_eq!(drain_segment(&mut segment, &mut dst), 4);
        assert_eq!(&dst, b"abcd");
        assert_eq!(&segment[..], b"ef");

        assert_eq!(drain_segment(&mut segment, &mut dst), 2);
        assert_eq!(&dst[..2], b"ef");
        assert!(segment.is_empty());

        assert_eq!(drain_segment(&mut segment, &mut dst), 0);
        assert_eq!(drain_segment(&mut Bytes::from_static(b"xy"), &mut []), 0);
    }

    #[test]
    fn test_drain_source_fills_buffer_across_short_reads() {
        let mut src = Trickle {
            data: b"hello world",
            step: 3,
            interrupt: false,
        };
        let mut dst = [0u8; 8];

        assert_eq!(drain_source(&mut src, &mut dst).unwrap(), (8, false));
        assert_eq!(&dst, b"hello wo");

        assert_eq!(drain_source(&mut src, &mut dst).unwrap(), (3, true));
        assert_eq!(&dst[..3], b"rld");

        assert_eq!(drain_source(&mut src, &mut dst).unwrap(), (0, true));
    }

    #[test]
    fn test_drain_source_exact_fit_defers_eof() {
        let mut src: &[u8] = b"1234";
        let mut dst = [0u8; 4];

        assert_eq!(drain_source(&mut src, &mut dst).unwrap(), (4, false));
        assert_eq!(drain_source(&mut src, &mut dst).unwrap(), (0, true));
    }

    #[test]
    fn test_drain_source_empty_destination() {
        let mut src: &[u8] = b"1234";
        assert_eq!(drain_source(&mut src, &mut []).unwrap(), (0, false));
        assert_eq!(src.len(), 4);
    }

    #[test]
    fn test_drain_source_error() {
        struct Broken;

        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "disk on fire"))
            }
        }

        let err = drain_source(&mut Broken, &mut [0u8; 4]).unwrap_err();
        assert_eq!(err.to_string(), "disk on fire");
    }
}
