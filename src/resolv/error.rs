//! Errors of the resolver.

use super::conf;
use crate::net;
use domain::base::iana::Rcode;
use domain::base::name::FromStrError;
use std::error;
use std::fmt;
use std::path::PathBuf;

//------------ Error ---------------------------------------------------------

/// A lookup or the creation of a resolver failed.
#[derive(Clone, Debug)]
pub enum Error {
    /// The resolver has no servers to ask.
    NoServers,

    /// The configuration file does not exist.
    ConfNotFound(PathBuf),

    /// The configuration file could not be read or parsed.
    Conf(conf::Error),

    /// The host name is not a valid domain name.
    BadName(FromStrError),

    /// The query message could not be assembled.
    Compose,

    /// The transport failed for a reason other than a timeout.
    Transport(net::Error),

    /// Every attempt timed out.
    Timeout,

    /// The server answered with a response code other than NOERROR.
    Rcode(Rcode),
}

impl Error {
    /// Returns the category of the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NoServers | Error::ConfNotFound(_) => ErrorKind::Config,
            Error::Conf(_) => ErrorKind::Parse,
            Error::BadName(_) | Error::Compose => ErrorKind::Query,
            Error::Transport(_) => ErrorKind::Transport,
            Error::Timeout => ErrorKind::Timeout,
            Error::Rcode(_) => ErrorKind::Protocol,
        }
    }

    /// Returns the response code if the server answered with an error.
    pub fn rcode(&self) -> Option<Rcode> {
        match self {
            Error::Rcode(rcode) => Some(*rcode),
            _ => None,
        }
    }
}

impl From<conf::Error> for Error {
    fn from(err: conf::Error) -> Self {
        Error::Conf(err)
    }
}

impl From<FromStrError> for Error {
    fn from(err: FromStrError) -> Self {
        Error::BadName(err)
    }
}

impl From<net::Error> for Error {
    fn from(err: net::Error) -> Self {
        Error::Transport(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NoServers => f.write_str("no servers configured"),
            Error::ConfNotFound(path) => {
                write!(f, "no such file or directory: {}", path.display())
            }
            Error::Conf(err) => fmt::Display::fmt(err, f),
            Error::BadName(err) => write!(f, "invalid host name: {err}"),
            Error::Compose => f.write_str("cannot assemble query"),
            Error::Transport(err) => fmt::Display::fmt(err, f),
            Error::Timeout => f.write_str("all queries timed out"),
            Error::Rcode(rcode) => write!(f, "server responded with {rcode}"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Conf(err) => Some(err),
            Error::BadName(err) => Some(err),
            Error::Transport(err) => Some(err),
            _ => None,
        }
    }
}

//------------ ErrorKind -----------------------------------------------------

/// The category of an [`Error`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    /// The resolver is not configured properly.
    Config,

    /// The configuration file could not be parsed.
    Parse,

    /// The query could not be built.
    Query,

    /// Sending or receiving failed.
    Transport,

    /// No server answered in time.
    Timeout,

    /// A server answered with an error.
    Protocol,
}

//============ Testing =======================================================
