use crate::constants;
use crate::helpers;
use bytes::{BufMut, Bytes, BytesMut};

/// The fixed byte blobs surrounding the file content in a `multipart/form-data` body.
///
/// `head` opens the file part, `tail` writes the extra form fields and closes the body. Both carry the same
/// boundary as [`content_type`](Segments::content_type).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segments {
    head: Bytes,
    tail: Bytes,
    boundary: String,
    content_type: String,
}

impl Segments {
    /// Builds the head and tail segments for one file field named `field_name` carrying `file_name`.
    ///
    /// `fields` are written after the file part, in the order given. When `boundary` is `None`, a random one is
    /// generated.
    ///
    /// # Examples
    ///
    /// ```
    /// use stream_upload::Segments;
    ///
    /// let segments = Segments::build("file", "a.txt", &[("k", "v")], Some("XYZ")).unwrap();
    ///
    /// assert_eq!(segments.content_type(), "multipart/form-data; boundary=XYZ");
    /// assert!(segments.head().starts_with(b"--XYZ\r\n"));
    /// assert!(segments.tail().ends_with(b"\r\n--XYZ--"));
    /// ```
    pub fn build<K, V>(
        field_name: &str,
        file_name: &str,
        fields: &[(K, V)],
        boundary: Option<&str>,
    ) -> crate::Result<Segments>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let boundary = match boundary {
            Some(boundary) => {
                helpers::validate_boundary(boundary)?;
                boundary.to_owned()
            }
            None => helpers::gen_boundary(),
        };

        helpers::ensure_header_safe("field name", field_name)?;
        helpers::ensure_header_safe("file name", file_name)?;

        let file_content_type = mime_guess::from_path(file_name)
            .first_raw()
            .unwrap_or(constants::DEFAULT_FILE_CONTENT_TYPE);

        let mut head = BytesMut::new();
        put_delimiter(&mut head, &boundary);
        head.put_slice(b"Content-Disposition: form-data; name=\"");
        head.put_slice(helpers::escape_quotes(field_name).as_bytes());
        head.put_slice(b"\"; filename=\"");
        head.put_slice(helpers::escape_quotes(file_name).as_bytes());
        head.put_slice(b"\"");
        head.put_slice(constants::CRLF.as_bytes());
        head.put_slice(b"Content-Type: ");
        head.put_slice(file_content_type.as_bytes());
        head.put_slice(constants::CRLF.as_bytes());
        head.put_slice(constants::CRLF.as_bytes());

        let delimiter = format!("{}{}{}", constants::CRLF, constants::BOUNDARY_EXT, boundary);

        // The file content ends with the CRLF owned by the next delimiter.
        let mut tail = BytesMut::new();
        tail.put_slice(constants::CRLF.as_bytes());
        for (key, value) in fields {
            let (key, value) = (key.as_ref(), value.as_ref());

            helpers::ensure_header_safe("field name", key)?;
            if memchr::memmem::find(value.as_bytes(), delimiter.as_bytes()).is_some() {
                return Err(crate::Error::EncodingFailure(format!(
                    "value of field {:?} contains the multipart boundary",
                    key
                )));
            }

            put_delimiter(&mut tail, &boundary);
            tail.put_slice(b"Content-Disposition: form-data; name=\"");
            tail.put_slice(helpers::escape_quotes(key).as_bytes());
            tail.put_slice(b"\"");
            tail.put_slice(constants::CRLF.as_bytes());
            tail.put_slice(constants::CRLF.as_bytes());
            tail.put_slice(value.as_bytes());
            tail.put_slice(constants::CRLF.as_bytes());
        }
        tail.put_slice(constants::BOUNDARY_EXT.as_bytes());
        tail.put_slice(boundary.as_bytes());
        tail.put_slice(constants::BOUNDARY_EXT.as_bytes());

        let content_type = format!(
            "{}; {}={}",
            mime::MULTIPART_FORM_DATA,
            mime::BOUNDARY.as_str(),
            helpers::quote_param(&boundary)
        );

        log::debug!(
            "built multipart segments: boundary={} head={} bytes tail={} bytes",
            boundary,
            head.len(),
            tail.len()
        );

        Ok(Segments {
            head: head.freeze(),
            tail: tail.freeze(),
            boundary,
            content_type,
        })
    }

    /// The bytes sent before the file content.
    pub fn head(&self) -> &[u8] {
        &self.head
    }

    /// The bytes sent after the file content.
    pub fn tail(&self) -> &[u8] {
        &self.tail
    }

    /// The boundary delimiting the parts, unquoted.
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// The `Content-Type` header value, `multipart/form-data; boundary=<boundary>`.
    ///
    /// The boundary is quoted when it contains characters outside the header token set.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Total length of head and tail.
    pub fn overhead(&self) -> u64 {
        (self.head.len() + self.tail.len()) as u64
    }

    pub(crate) fn into_parts(self) -> (Bytes, Bytes, String, String) {
        (self.head, self.tail, self.boundary, self.content_type)
    }
}

fn put_delimiter(buf: &mut BytesMut, boundary: &str) {
    buf.put_slice(constants::BOUNDARY_EXT.as_bytes());
    buf.put_slice(boundary.as_bytes());
    buf.put_slice(constants::CRLF.as_bytes());
}
