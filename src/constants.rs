pub(crate) const BOUNDARY_EXT: &str = "--";
pub(crate) const CRLF: &str = "\r\n";
pub(crate) const CR: u8 = b'\r';
pub(crate) const LF: u8 = b'\n';

/// RFC 2046 limits a boundary to 70 characters.
pub(crate) const MAX_BOUNDARY_LEN: usize = 70;

/// Characters allowed in a boundary besides ASCII alphanumerics (RFC 2046 `bcharsnospace` and space).
pub(crate) const BOUNDARY_SPECIALS: &[u8] = b"'()+_,-./:=? ";

/// Characters forcing a `Content-Type` parameter value into a quoted string (RFC 2045 `tspecials` and space).
pub(crate) const PARAM_TSPECIALS: &[u8] = b"()<>@,;:\\\"/[]?= ";

pub(crate) const DEFAULT_FILE_CONTENT_TYPE: &str = "application/octet-stream";

/// Chunk size used by [`BodyStream`](crate::BodyStream) when none is given.
pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024;

pub(crate) const MIRROR_FILE_SUFFIX: &str = ".fin";
