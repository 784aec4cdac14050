//! # Errors
//!
//! A single error type for the scheduler, the swap subsystem, the command
//! interpreter and the collaborators. Every variant is reported to the
//! operator as one line and none of them stops the control loop.

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

/// Broad class of an [`Error`], used when deciding how to report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// A fixed-size table or buffer is full.
    Capacity,
    /// A task or file name did not resolve.
    NotFound,
    /// The operation is not allowed in the current run/pause or task state.
    StateConflict,
    /// A command line or transfer frame is malformed.
    Format,
    /// The byte store returned an image that failed validation.
    Persistence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("task registry full")]
    RegistryFull,

    #[error("no active task available to swap out")]
    NoEvictableTask,

    #[error("file store full")]
    NoSpace,

    #[error("task not found")]
    UnknownTask,

    #[error("file not found")]
    UnknownFile,

    #[error("task already active")]
    AlreadyActive,

    #[error("task not active")]
    NotActive,

    #[error("file already exists")]
    FileExists,

    #[error("scheduler is stopped, use 'start' to run the scheduler")]
    SchedulerPaused,

    #[error("scheduler is running, use 'stop' before file and transfer operations")]
    SchedulerRunning,

    #[error("a transfer is already in progress")]
    TransferBusy,

    #[error("invalid command")]
    InvalidCommand,

    #[error("missing {0}")]
    MissingArgument(&'static str),

    #[error("invalid value for {0}")]
    InvalidNumber(&'static str),

    #[error("name too long")]
    NameTooLong,

    #[error("invalid transfer frame")]
    InvalidFrame,

    #[error("timed out waiting for transfer")]
    TransferTimeout,

    #[error("swap image for slot {slot} failed validation")]
    CorruptImage { slot: usize },
}

impl Error {
    /// Map this error onto the reporting taxonomy.
    pub const fn class(&self) -> ErrorClass {
        match self {
            Error::RegistryFull | Error::NoEvictableTask | Error::NoSpace => ErrorClass::Capacity,
            Error::UnknownTask | Error::UnknownFile => ErrorClass::NotFound,
            Error::AlreadyActive
            | Error::NotActive
            | Error::FileExists
            | Error::SchedulerPaused
            | Error::SchedulerRunning
            | Error::TransferBusy => ErrorClass::StateConflict,
            Error::InvalidCommand
            | Error::MissingArgument(_)
            | Error::InvalidNumber(_)
            | Error::NameTooLong
            | Error::InvalidFrame
            | Error::TransferTimeout => ErrorClass::Format,
            Error::CorruptImage { .. } => ErrorClass::Persistence,
        }
    }
}
