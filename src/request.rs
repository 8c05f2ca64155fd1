use crate::UploadBody;
use http::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use http::{Method, Request, Uri};
use std::io::Read;

/// Wraps `body` in a `POST` request to `uri` carrying its `Content-Type`.
///
/// `Content-Length` is set when the body length is known. On failure the body is closed before the error is
/// returned.
pub fn upload_request<R: Read>(uri: &str, mut body: UploadBody<R>) -> crate::Result<Request<UploadBody<R>>> {
    let parts = Uri::try_from(uri)
        .map_err(http::Error::from)
        .and_then(|uri| {
            HeaderValue::from_str(body.content_type())
                .map(|content_type| (uri, content_type))
                .map_err(http::Error::from)
        });

    let (uri, content_type) = match parts {
        Ok(parts) => parts,
        Err(err) => {
            body.close();
            return Err(crate::Error::RequestBuildFailed(err));
        }
    };

    let mut builder = Request::builder().method(Method::POST).uri(uri).header(CONTENT_TYPE, content_type);
    if let Some(len) = body.content_length() {
        builder = builder.header(CONTENT_LENGTH, len);
    }

    builder.body(body).map_err(crate::Error::RequestBuildFailed)
}
