//! Errors surfaced to the host by [`Session`](crate::Session).

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::frame::DisplayUnit;

pub type ViewerResult<T> = Result<T, ViewerError>;

#[derive(Error, Debug)]
pub enum ViewerError {
    /// Missing, unreadable or unrecognized file, or one
    /// without frames. The previous session is untouched.
    #[error("cannot open {}: {cause:#}", path.display())]
    DocumentOpen {
        path: PathBuf,
        cause: anyhow::Error,
    },

    /// Frame `index` failed to decode. Playback is paused
    /// and the last rendered view stays current.
    #[error("cannot decode frame {index}: {cause:#}")]
    Decode { index: usize, cause: anyhow::Error },

    #[error("{unit} is not available for this document")]
    UnsupportedUnit { unit: DisplayUnit },

    /// Nothing has been decoded yet.
    #[error("no frame to export")]
    NoFrame,

    #[error("cannot write {}: {cause}", path.display())]
    Export {
        path: PathBuf,
        #[source]
        cause: io::Error,
    },
}
