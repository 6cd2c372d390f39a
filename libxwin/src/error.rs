use std::error::Error as StdError;
use std::fmt;

/// `WindowResult<T>` provides a simplified result type with a common error type
pub type WindowResult<T> = std::result::Result<T, ErrorWrapper>;

/// WindowError defines all the internal errors that `libxwin` might return
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum WindowError {
    DispatcherUnavailable(String),
    HandlerFailed(String),
    InvalidGravity(String),
    InvalidSizeHint(String),
    PropertyNotFound(String),
    UnknownWindow(u32),
}
impl std::error::Error for WindowError {}
impl fmt::Display for WindowError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            WindowError::DispatcherUnavailable(ref err) => write!(f, "event dispatcher unavailable: {}", err),
            WindowError::HandlerFailed(ref err) => write!(f, "event handler failed: {}", err),
            WindowError::InvalidGravity(ref err) => write!(f, "invalid gravity was given: {}", err),
            WindowError::InvalidSizeHint(ref err) => write!(f, "invalid size hint was given: {}", err),
            WindowError::PropertyNotFound(ref err) => write!(f, "property {} was not found", err),
            WindowError::UnknownWindow(ref err) => write!(f, "window {} is not known", err),
        }
    }
}

/// ErrorWrapper provides wrapper around all the underlying library dependencys that `libxwin` uses
/// such that we can easily surface all errors from `libxwin` in a single easy way.
#[derive(Debug)]
pub enum ErrorWrapper {
    Window(WindowError),

    // std errors
    Io(std::io::Error),
    Utf8(std::str::Utf8Error),

    // x11rb errors
    Connect(x11rb::errors::ConnectError),
    Connection(x11rb::errors::ConnectionError),
    Reply(x11rb::errors::ReplyError),
}
impl ErrorWrapper {
    /// Implemented directly on the `Error` type to reduce casting required
    pub fn is<T: StdError + 'static>(&self) -> bool {
        self.as_ref().is::<T>()
    }

    /// Implemented directly on the `Error` type to reduce casting required
    pub fn downcast_ref<T: StdError + 'static>(&self) -> Option<&T> {
        self.as_ref().downcast_ref::<T>()
    }

    /// Implemented directly on the `Error` type to reduce casting required
    pub fn downcast_mut<T: StdError + 'static>(&mut self) -> Option<&mut T> {
        self.as_mut().downcast_mut::<T>()
    }

    /// Implemented directly on the `Error` type to reduce casting required
    /// which allows for using as_ref to get the correct pass through.
    pub fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.as_ref().source()
    }

    /// Return the domain error if this wraps one
    pub fn window_error(&self) -> Option<&WindowError> {
        match *self {
            ErrorWrapper::Window(ref err) => Some(err),
            _ => None,
        }
    }
}
impl StdError for ErrorWrapper {}

impl fmt::Display for ErrorWrapper {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ErrorWrapper::Window(ref err) => write!(f, "{}", err),
            ErrorWrapper::Io(ref err) => write!(f, "{}", err),
            ErrorWrapper::Utf8(ref err) => write!(f, "{}", err),
            ErrorWrapper::Connect(ref err) => write!(f, "{}", err),
            ErrorWrapper::Connection(ref err) => write!(f, "{}", err),
            ErrorWrapper::Reply(ref err) => write!(f, "{}", err),
        }
    }
}

impl AsRef<dyn StdError> for ErrorWrapper {
    fn as_ref(&self) -> &(dyn StdError + 'static) {
        match *self {
            ErrorWrapper::Window(ref err) => err,
            ErrorWrapper::Io(ref err) => err,
            ErrorWrapper::Utf8(ref err) => err,
            ErrorWrapper::Connect(ref err) => err,
            ErrorWrapper::Connection(ref err) => err,
            ErrorWrapper::Reply(ref err) => err,
        }
    }
}

impl AsMut<dyn StdError> for ErrorWrapper {
    fn as_mut(&mut self) -> &mut (dyn StdError + 'static) {
        match *self {
            ErrorWrapper::Window(ref mut err) => err,
            ErrorWrapper::Io(ref mut err) => err,
            ErrorWrapper::Utf8(ref mut err) => err,
            ErrorWrapper::Connect(ref mut err) => err,
            ErrorWrapper::Connection(ref mut err) => err,
            ErrorWrapper::Reply(ref mut err) => err,
        }
    }
}

impl From<WindowError> for ErrorWrapper {
    fn from(err: WindowError) -> ErrorWrapper {
        ErrorWrapper::Window(err)
    }
}

impl From<std::io::Error> for ErrorWrapper {
    fn from(err: std::io::Error) -> ErrorWrapper {
        ErrorWrapper::Io(err)
    }
}

impl From<std::str::Utf8Error> for ErrorWrapper {
    fn from(err: std::str::Utf8Error) -> ErrorWrapper {
        ErrorWrapper::Utf8(err)
    }
}

// x11rb errors
//--------------------------------------------------------------------------------------------------
impl From<x11rb::errors::ConnectError> for ErrorWrapper {
    fn from(err: x11rb::errors::ConnectError) -> ErrorWrapper {
        ErrorWrapper::Connect(err)
    }
}

impl From<x11rb::errors::ConnectionError> for ErrorWrapper {
    fn from(err: x11rb::errors::ConnectionError) -> ErrorWrapper {
        ErrorWrapper::Connection(err)
    }
}

impl From<x11rb::errors::ReplyError> for ErrorWrapper {
    fn from(err: x11rb::errors::ReplyError) -> ErrorWrapper {
        ErrorWrapper::Reply(err)
    }
}
