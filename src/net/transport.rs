//! The traits a transport has to implement.

use super::error::Error;
use domain::base::message::Message;
use std::time::Duration;

//------------ Transport -----------------------------------------------------

/// A way to get a DNS query to a server and its response back.
///
/// Servers are identified by the address strings the resolver was
/// configured with. These are normally of the form `host:port`, but the
/// resolver passes on whatever it was given and it is up to the transport
/// to make sense of it.
///
/// All methods block the calling thread until they have finished or the
/// given timeout has expired. In the latter case, they must return
/// [`Error::Timeout`].
pub trait Transport {
    /// The type of connection returned by [`dial`][Self::dial].
    type Connection: Connection;

    /// Performs a single exchange with `server`.
    ///
    /// This opens a fresh connection, sends `query`, waits at most `timeout`
    /// for its response, and closes the connection again.
    fn exchange(
        &self,
        query: &Message<Vec<u8>>,
        server: &str,
        timeout: Duration,
    ) -> Result<Message<Vec<u8>>, Error>;

    /// Opens a connection to `server`.
    ///
    /// Opening the connection must not take longer than `timeout`. The
    /// connection uses the same value as its timeout for receiving
    /// responses.
    fn dial(
        &self,
        server: &str,
        timeout: Duration,
    ) -> Result<Self::Connection, Error>;
}

//------------ Connection ----------------------------------------------------

/// An open connection to a single server.
pub trait Connection {
    /// Sends a query to the server.
    fn send(&mut self, query: &Message<Vec<u8>>) -> Result<(), Error>;

    /// Waits for the response to the query sent last.
    fn receive(&mut self) -> Result<Message<Vec<u8>>, Error>;
}

impl<T: Transport + ?Sized> Transport for &T {
    type Connection = T::Connection;

    fn exchange(
        &self,
        query: &Message<Vec<u8>>,
        server: &str,
        timeout: Duration,
    ) -> Result<Message<Vec<u8>>, Error> {
        (**self).exchange(query, server, timeout)
    }

    fn dial(
        &self,
        server: &str,
        timeout: Duration,
    ) -> Result<Self::Connection, Error> {
        (**self).dial(server, timeout)
    }
}
