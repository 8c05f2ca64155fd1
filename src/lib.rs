//! A streaming `multipart/form-data` upload body for large files in Rust.
//!
//! An [`UploadBody`] produces the multipart preamble, the raw file content and the trailing form fields purely
//! on demand, as an HTTP client reads from it. The file is never loaded into memory: its bytes are read
//! straight into the buffer handed to [`Read::read`](std::io::Read::read) (or
//! [`UploadBody::read_chunk`]).
//!
//! # Examples
//!
//! ```no_run
//! # fn run() -> stream_upload::Result<()> {
//! let fields = vec![("owner", "alice"), ("kind", "backup")];
//! let (mut body, content_type) =
//!     stream_upload::new_upload_body("file", "/var/data/archive.tar", fields, "req-1", None)?;
//!
//! println!("Content-Type: {}", content_type);
//!
//! let mut chunk = [0u8; 16 * 1024];
//! loop {
//!     let outcome = body.read_chunk(&mut chunk)?;
//!     // send `&chunk[..outcome.written]` somewhere.
//!     if outcome.end_of_stream {
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Async HTTP stacks can take the body as a [`Stream`](futures_util::Stream) of `Bytes` chunks via
//! [`UploadBody::into_stream`].

pub use body::{ReadOutcome, UploadBody};
pub use builder::UploadBodyBuilder;
pub use constants::DEFAULT_CHUNK_SIZE;
pub use error::Error;
pub use observer::{LogObserver, Milestone, Observer};
pub use options::DebugOptions;
pub use request::upload_request;
pub use segment::Segments;
pub use state::Phase;
pub use stream::BodyStream;

mod body;
mod builder;
mod constants;
mod drain;
mod error;
mod helpers;
mod mirror;
mod observer;
mod options;
mod request;
mod segment;
mod state;
mod stream;

use std::fs::File;
use std::path::PathBuf;

/// A Result type often returned from methods that can have `stream_upload` errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Opens the file at `file_path` as an upload body for the form field `field_name`.
///
/// Returns the body together with its `Content-Type` header value. `fields` are sent after the file, in
/// iteration order, and `trace_id` tags diagnostic milestones.
pub fn new_upload_body<N, P, I, K, V>(
    field_name: N,
    file_path: P,
    fields: I,
    trace_id: &str,
    debug: Option<DebugOptions>,
) -> crate::Result<(UploadBody<File>, String)>
where
    N: Into<String>,
    P: Into<PathBuf>,
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let body = UploadBody::builder(field_name, file_path)
        .fields(fields)
        .trace_id(trace_id)
        .debug_options(debug.unwrap_or_default())
        .open()?;
    let content_type = body.content_type().to_owned();

    Ok((body, content_type))
}

/// Builds a `POST` request to `uri` whose body uploads the file at `file_path`.
///
/// See [`new_upload_body`] and [`upload_request`].
pub fn new_upload_request<I, K, V, N, P>(
    uri: &str,
    fields: I,
    field_name: N,
    file_path: P,
    trace_id: &str,
    debug: Option<DebugOptions>,
) -> crate::Result<http::Request<UploadBody<File>>>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
    N: Into<String>,
    P: Into<PathBuf>,
{
    let (body, _) = new_upload_body(field_name, file_path, fields, trace_id, debug)?;
    upload_request(uri, body)
}

/// Parses the `Content-Type` header to extract the boundary value.
pub fn parse_boundary<T: AsRef<str>>(content_type: T) -> crate::Result<String> {
    let m = content_type
        .as_ref()
        .parse::<mime::Mime>()
        .map_err(|err| Error::EncodingFailure(format!("invalid content type: {}", err)))?;

    if !(m.type_() == mime::MULTIPART_FORM_DATA.type_() && m.subtype() == mime::MULTIPART_FORM_DATA.subtype()) {
        return Err(Error::EncodingFailure("content type is not multipart/form-data".to_owned()));
    }

    m.get_param(mime::BOUNDARY)
        .map(|name| name.as_str().to_owned())
        .ok_or_else(|| Error::EncodingFailure("no boundary value found".to_owned()))
}
