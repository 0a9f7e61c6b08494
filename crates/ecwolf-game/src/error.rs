// error.rs — recoverable save/load failures
//
// Content errors (bad frame chains, bad filter parameters) are fatal and go
// through com_error. Only reading a save can fail in a way the caller is
// expected to handle.

use thiserror::Error;

use ecwolf_common::archive::ArchiveError;

#[derive(Error, Debug)]
pub enum SaveError {
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error("save references unknown class '{0}'")]
    UnknownClass(String),

    #[error("class '{class}' has no frame {index}")]
    BadFrame { class: String, index: u32 },

    #[error("actor reference {0} is out of range")]
    BadActorRef(i32),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SaveError>;
