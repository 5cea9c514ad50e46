//! Error type for transports.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Error type for transports.
///
/// The variants carrying an I/O error keep it behind an arc so that the
/// error can be cloned.
#[derive(Clone, Debug)]
pub enum Error {
    /// No response arrived before the I/O timeout expired.
    ///
    /// This is the only variant after which the resolver retries a query.
    Timeout,

    /// The server address could not be turned into a socket address.
    ServerAddr(Arc<std::io::Error>),

    /// Binding a UDP socket gave an error.
    UdpBind(Arc<std::io::Error>),

    /// Connecting a UDP socket gave an error.
    UdpConnect(Arc<std::io::Error>),

    /// Sending over a UDP socket gave an error.
    UdpSend(Arc<std::io::Error>),

    /// Sending over a UDP socket gave a partial result.
    UdpShortSend,

    /// Receiving from a UDP socket gave an error.
    UdpReceive(Arc<std::io::Error>),

    /// The runtime driving the sockets could not be created.
    Runtime(Arc<std::io::Error>),

    /// A connection was asked for a response before a query was sent.
    NothingSent,
}

impl Error {
    /// Returns whether the error is the retryable I/O timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Error::Timeout => write!(f, "i/o timeout"),
            Error::ServerAddr(err) => {
                write!(f, "cannot resolve server address: {err}")
            }
            Error::UdpBind(_) => write!(f, "error binding UDP socket"),
            Error::UdpConnect(_) => write!(f, "error connecting UDP socket"),
            Error::UdpSend(_) => write!(f, "error sending to UDP socket"),
            Error::UdpShortSend => write!(f, "partial sent to UDP socket"),
            Error::UdpReceive(_) => {
                write!(f, "error receiving from UDP socket")
            }
            Error::Runtime(_) => write!(f, "cannot start I/O runtime"),
            Error::NothingSent => {
                write!(f, "receive called before a query was sent")
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Timeout => None,
            Error::ServerAddr(e) => Some(e),
            Error::UdpBind(e) => Some(e),
            Error::UdpConnect(e) => Some(e),
            Error::UdpSend(e) => Some(e),
            Error::UdpShortSend => None,
            Error::UdpReceive(e) => Some(e),
            Error::Runtime(e) => Some(e),
            Error::NothingSent => None,
        }
    }
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use std::io;

    #[test]
    fn only_timeout_is_timeout() {
        assert!(Error::Timeout.is_timeout());
        let refused = io::Error::from(io::ErrorKind::ConnectionRefused);
        assert!(!Error::UdpReceive(Arc::new(refused)).is_timeout());
        assert!(!Error::UdpShortSend.is_timeout());

        // A timeout reported by the OS while connecting is not what the
        // resolver retries on.
        let timed_out = io::Error::from(io::ErrorKind::TimedOut);
        assert!(!Error::UdpConnect(Arc::new(timed_out)).is_timeout());
    }

    #[test]
    fn source_is_kept() {
        use std::error::Error as _;

        let err = Error::UdpSend(Arc::new(io::Error::new(
            io::ErrorKind::Other,
            "boom",
        )));
        assert_eq!(err.source().map(|e| e.to_string()), Some("boom".into()));
        assert!(Error::Timeout.source().is_none());
    }
}
