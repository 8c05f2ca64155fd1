use crate::observer::Observer;
use crate::{DebugOptions, Segments, UploadBody};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Configures and opens an [`UploadBody`] streaming a file from disk.
///
/// # Examples
///
/// ```no_run
/// use stream_upload::{DebugOptions, UploadBody};
///
/// # fn run() -> stream_upload::Result<()> {
/// let body = UploadBody::builder("file", "/var/data/archive.tar")
///     .field("owner", "alice")
///     .trace_id("req-1234")
///     .debug_options(DebugOptions::new().fixed_boundary("XYZ"))
///     .open()?;
///
/// println!("Content-Type: {}", body.content_type());
/// # Ok(())
/// # }
/// ```
pub struct UploadBodyBuilder {
    field_name: String,
    path: PathBuf,
    fields: Vec<(String, String)>,
    trace_id: String,
    debug: DebugOptions,
    observer: Option<Arc<dyn Observer>>,
}

impl UploadBodyBuilder {
    /// Starts a body uploading the file at `path` as the form field `field_name`.
    pub fn new<N: Into<String>, P: Into<PathBuf>>(field_name: N, path: P) -> UploadBodyBuilder {
        UploadBodyBuilder {
            field_name: field_name.into(),
            path: path.into(),
            fields: Vec::new(),
            trace_id: String::new(),
            debug: DebugOptions::default(),
            observer: None,
        }
    }

    /// Adds a text field sent after the file.
    pub fn field<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> UploadBodyBuilder {
        self.fields.push((key.into(), value.into()));
        self
    }

    /// Adds text fields sent after the file, in iteration order.
    pub fn fields<I, K, V>(mut self, fields: I) -> UploadBodyBuilder
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.fields
            .extend(fields.into_iter().map(|(key, value)| (key.into(), value.into())));
        self
    }

    /// Sets the id tagging this upload's milestones.
    pub fn trace_id<T: Into<String>>(mut self, trace_id: T) -> UploadBodyBuilder {
        self.trace_id = trace_id.into();
        self
    }

    /// Sets the diagnostic options: a fixed boundary and a mirror file.
    pub fn debug_options(mut self, options: DebugOptions) -> UploadBodyBuilder {
        self.debug = options;
        self
    }

    /// Sets the observer receiving this upload's milestones.
    pub fn observer(mut self, observer: Arc<dyn Observer>) -> UploadBodyBuilder {
        self.observer = Some(observer);
        self
    }

    /// Opens the file and builds the body.
    ///
    /// Fails with [`Error::SourceUnavailable`](crate::Error::SourceUnavailable) when the file can't be opened
    /// and with [`Error::EncodingFailure`](crate::Error::EncodingFailure) when the segments can't be built. The
    /// file is closed again on failure.
    pub fn open(self) -> crate::Result<UploadBody<File>> {
        let unavailable = |cause: io::Error| crate::Error::SourceUnavailable {
            path: self.path.clone(),
            cause,
        };

        let file = File::open(&self.path).map_err(unavailable)?;
        let metadata = file.metadata().map_err(unavailable)?;
        if metadata.is_dir() {
            return Err(unavailable(io::Error::new(io::ErrorKind::InvalidInput, "is a directory")));
        }

        let file_name = base_name(&self.path)?;
        let segments = Segments::build(&self.field_name, &file_name, &self.fields, self.debug.boundary())?;

        let mut body = UploadBody::from_reader(segments, file).with_trace_id(self.trace_id);
        if metadata.is_file() {
            body = body.with_source_len(metadata.len());
        }
        if let Some(observer) = self.observer {
            body = body.with_observer(observer);
        }
        if let Some(base) = self.debug.mirror_base() {
            body = body.with_mirror(base);
        }

        log::debug!(
            "opened upload body for {}: field={} content_length={:?}",
            self.path.display(),
            self.field_name,
            body.content_length()
        );

        Ok(body)
    }
}

impl UploadBody<File> {
    /// Starts building a body that uploads the file at `path` as the form field `field_name`.
    pub fn builder<N: Into<String>, P: Into<PathBuf>>(field_name: N, path: P) -> UploadBodyBuilder {
        UploadBodyBuilder::new(field_name, path)
    }
}

fn base_name(path: &Path) -> crate::Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| crate::Error::EncodingFailure(format!("{} has no file name", path.display())))
}
