use crate::helpers;
use crate::observer::{Milestone, Notifier};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Copies every delivered byte to `<base>.fin`.
///
/// The file is opened on the first non-empty write. Failures never reach the reader of the body: they are
/// reported and mirroring stops.
#[derive(Debug)]
pub(crate) struct Mirror {
    path: PathBuf,
    file: Option<File>,
    failed: bool,
    written: u64,
}

impl Mirror {
    pub(crate) fn new(base: &Path) -> Mirror {
        Mirror {
            path: helpers::mirror_path(base),
            file: None,
            failed: false,
            written: 0,
        }
    }

    pub(crate) fn write(&mut self, data: &[u8], notifier: &Notifier) {
        if data.is_empty() || self.failed {
            return;
        }

        if self.file.is_none() {
            match OpenOptions::new().create(true).write(true).truncate(true).open(&self.path) {
                Ok(file) => {
                    notifier.emit(Milestone::MirrorOpened {
                        path: &self.path,
                        error: None,
                    });
                    self.file = Some(file);
                }
                Err(err) => {
                    notifier.emit(Milestone::MirrorOpened {
                        path: &self.path,
                        error: Some(&err),
                    });
                    self.fail(err);
                    return;
                }
            }
        }

        let Some(file) = self.file.as_mut() else {
            return;
        };

        match file.write_all(data) {
            Ok(()) => {
                self.written += data.len() as u64;
                notifier.emit(Milestone::Mirrored {
                    written: data.len(),
                    error: None,
                });
            }
            Err(err) => {
                notifier.emit(Milestone::Mirrored {
                    written: 0,
                    error: Some(&err),
                });
                self.fail(err);
            }
        }
    }

    pub(crate) fn close(&mut self) {
        if let Some(file) = self.file.take() {
            if let Err(err) = file.sync_all() {
                self.fail(err);
            }
            log::debug!("closed mirror file {}, {} bytes", self.path.display(), self.written);
        }
    }

    #[cfg(test)]
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    fn fail(&mut self, cause: std::io::Error) {
        let err = crate::Error::MirrorFailure {
            path: self.path.clone(),
            cause,
        };
        log::warn!("{}, mirroring disabled", err);
        self.failed = true;
        self.file = None;
    }
}
