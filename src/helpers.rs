use crate::constants;
use std::borrow::Cow;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Generates a random boundary of 64 hex digits.
pub(crate) fn gen_boundary() -> String {
    let a = rand::random::<u64>();
    let b = rand::random::<u64>();
    let c = rand::random::<u64>();
    let d = rand::random::<u64>();

    format!("{a:016x}{b:016x}{c:016x}{d:016x}")
}

pub(crate) fn validate_boundary(boundary: &str) -> crate::Result<()> {
    if boundary.is_empty() || boundary.len() > constants::MAX_BOUNDARY_LEN {
        return Err(crate::Error::EncodingFailure(format!(
            "boundary must be 1 to {} characters long, got {}",
            constants::MAX_BOUNDARY_LEN,
            boundary.len()
        )));
    }

    if boundary.ends_with(' ') {
        return Err(crate::Error::EncodingFailure("boundary must not end with a space".to_owned()));
    }

    match boundary
        .bytes()
        .find(|b| !b.is_ascii_alphanumeric() && !constants::BOUNDARY_SPECIALS.contains(b))
    {
        Some(b) => Err(crate::Error::EncodingFailure(format!(
            "boundary contains invalid character {:?}",
            b as char
        ))),
        None => Ok(()),
    }
}

/// Wraps `value` in quotes when it isn't a valid header token.
pub(crate) fn quote_param(value: &str) -> Cow<'_, str> {
    if value.bytes().any(|b| constants::PARAM_TSPECIALS.contains(&b)) {
        Cow::Owned(format!("\"{}\"", value))
    } else {
        Cow::Borrowed(value)
    }
}

/// Rejects values that would break out of a header line.
pub(crate) fn ensure_header_safe(what: &str, value: &str) -> crate::Result<()> {
    if memchr::memchr2(constants::CR, constants::LF, value.as_bytes()).is_some() {
        return Err(crate::Error::EncodingFailure(format!(
            "{} {:?} contains a line break",
            what, value
        )));
    }
    Ok(())
}

pub(crate) fn escape_quotes(value: &str) -> Cow<'_, str> {
    if memchr::memchr2(b'\\', b'"', value.as_bytes()).is_none() {
        return Cow::Borrowed(value);
    }
    Cow::Owned(value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// `<base>.fin`, the file receiving the mirrored stream.
pub(crate) fn mirror_path(base: &Path) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(constants::MIRROR_FILE_SUFFIX);
    PathBuf::from(name)
}
