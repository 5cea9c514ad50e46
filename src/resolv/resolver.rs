//! The resolver.

use super::conf::ResolvConf;
use super::error::Error;
use super::lookup::{addrs_from_answer, FoundHosts};
#[cfg(feature = "udp")]
use crate::net::UdpTransport;
use crate::net::{self, Connection, Transport};
use domain::base::iana::{Rcode, Rtype};
use domain::base::message::Message;
use domain::base::message_builder::MessageBuilder;
use domain::base::name::Name;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
#[cfg(feature = "udp")]
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, trace};

//------------ Module Configuration ------------------------------------------

/// The port used if a server address doesn’t have one.
const DEFAULT_PORT: u16 = 53;

/// The default timeout for dialing and for waiting for a response.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// How many retries per server we allow by default.
const RETRIES_PER_SERVER: usize = 2;

//------------ Resolver ------------------------------------------------------

/// A DNS stub resolver with retries.
///
/// The resolver sends each query to a server picked at random from its
/// server list. If the [transport][Transport] reports a timeout, the query
/// is sent again, with a new message ID and to a server that is again
/// picked at random. This may well be the same server. Up to
/// [`retries`][Self::retries] such retries are made. Any other failure, as
/// well as an answer with an error response code, ends the lookup
/// immediately.
///
/// # Connection reuse
///
/// Normally, every attempt uses a one-shot
/// [`exchange`][Transport::exchange]. If connection reuse is enabled via
/// [`set_reuse_connections`][Self::set_reuse_connections], the resolver
/// instead opens one connection per server the first time it is used and
/// keeps it until the resolver is dropped. Cached connections are never
/// checked or replaced. A connection that has gone bad will keep failing
/// until a new resolver is created.
///
/// # Concurrency
///
/// A resolver can be shared between threads if its transport allows it.
/// Every server has its own connection slot with its own lock. The lock is
/// held while the connection is dialed as well as while a query is sent
/// over it and its response is awaited. Lookups that pick the same server
/// thus queue up behind one another while connection reuse is enabled,
/// but a slow server never holds up lookups to the other servers. Without
/// connection reuse, lookups are fully independent.
///
/// All lookups block the calling thread.
pub struct Resolver<T: Transport> {
    /// The servers to pick from.
    servers: Vec<String>,

    /// How many times a query is repeated after a timeout.
    retries: usize,

    /// Whether to keep one connection per server.
    reuse_connections: bool,

    /// The timeout for dialing and for each response.
    timeout: Duration,

    /// The transport to send queries with.
    transport: T,

    /// Picks the server for each attempt.
    rng: Mutex<StdRng>,

    /// The connection slots if connection reuse is enabled.
    conns: Mutex<HashMap<String, Arc<Mutex<Option<T::Connection>>>>>,
}

#[cfg(feature = "udp")]
#[cfg_attr(docsrs, doc(cfg(feature = "udp")))]
impl Resolver<UdpTransport> {
    /// Creates a new resolver for the given servers using UDP.
    ///
    /// Each server can be given as `host` or `host:port`. Port 53 is added
    /// if the port is missing. The servers aren’t checked in any other way.
    /// If they are broken, lookups will fail.
    pub fn new<I>(servers: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self::with_transport(servers, UdpTransport::new())
    }

    /// Creates a new resolver from a resolv.conf-style file using UDP.
    ///
    /// Returns [`Error::ConfNotFound`] if there is no file at `path` and
    /// [`Error::Conf`] if it cannot be read or parsed.
    pub fn from_conf_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let conf = ResolvConf::from_file(path).map_err(|err| {
            if err.is_not_found() {
                Error::ConfNotFound(path.into())
            } else {
                Error::Conf(err)
            }
        })?;
        Ok(Self::from_conf(conf, UdpTransport::new()))
    }
}

impl<T: Transport> Resolver<T> {
    /// Creates a new resolver for the given servers and transport.
    ///
    /// The servers are treated the same way as by [`Resolver::new`]. The
    /// number of retries is set to twice the number of servers.
    pub fn with_transport<I>(servers: I, transport: T) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let servers: Vec<String> = servers
            .into_iter()
            .map(|server| with_default_port(server.into()))
            .collect();
        Resolver {
            retries: servers.len() * RETRIES_PER_SERVER,
            servers,
            reuse_connections: false,
            timeout: DEFAULT_TIMEOUT,
            transport,
            rng: Mutex::new(StdRng::seed_from_u64(time_seed())),
            conns: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a new resolver from a configuration.
    ///
    /// A timeout given in the configuration replaces the default timeout.
    pub fn from_conf(conf: ResolvConf, transport: T) -> Self {
        let mut res = Self::with_transport(conf.servers, transport);
        if let Some(timeout) = conf.timeout {
            res.set_timeout(timeout)
        }
        res
    }
}

/// # Configuration
///
impl<T: Transport> Resolver<T> {
    /// Returns the servers.
    pub fn servers(&self) -> &[String] {
        &self.servers
    }

    /// Returns the number of retries after a timeout.
    ///
    /// A lookup makes at most one more attempt than this.
    pub fn retries(&self) -> usize {
        self.retries
    }

    /// Sets the number of retries after a timeout.
    ///
    /// Zero means a query is sent exactly once.
    pub fn set_retries(&mut self, retries: usize) {
        self.retries = retries
    }

    /// Returns whether connections are kept open and reused.
    pub fn reuse_connections(&self) -> bool {
        self.reuse_connections
    }

    /// Sets whether connections are kept open and reused.
    pub fn set_reuse_connections(&mut self, reuse: bool) {
        self.reuse_connections = reuse
    }

    /// Returns the timeout.
    ///
    /// This is the time allowed for opening a connection and, separately,
    /// for waiting for each response.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sets the timeout.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout
    }

    /// Returns the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Reseeds the random number generator used for picking servers.
    pub fn set_rng_seed(&mut self, seed: u64) {
        *self.rng.get_mut() = StdRng::seed_from_u64(seed)
    }
}

/// # Lookups
///
impl<T: Transport> Resolver<T> {
    /// Looks up the IPv4 addresses of a host.
    ///
    /// Returns the addresses of all A records in the answer in the order
    /// they appeared in. An answer without any A records is not an error
    /// but results in an empty vec.
    pub fn lookup_host(&self, host: &str) -> Result<Vec<IpAddr>, Error> {
        self.query(host).map(|answer| addrs_from_answer(&answer))
    }

    /// Looks up the IPv4 addresses and aliases of a host.
    ///
    /// In addition to the addresses, this also returns the targets of all
    /// CNAME records contained in the answer.
    pub fn lookup_host_full(&self, host: &str) -> Result<FoundHosts, Error> {
        self.query(host).map(|answer| FoundHosts::from_answer(&answer))
    }

    /// Queries for the A records of `host`, retrying after timeouts.
    ///
    /// Returns the answer if its response code is NOERROR.
    fn query(&self, host: &str) -> Result<Message<Vec<u8>>, Error> {
        if self.servers.is_empty() {
            return Err(Error::NoServers);
        }
        let qname = Name::<Vec<u8>>::from_str(host)?;
        for attempt in 0..=self.retries {
            let query = create_message(&qname)?;
            let server = self.choose_server();
            trace!(
                "query {} for {} to {} (attempt {})",
                query.header().id(),
                qname,
                server,
                attempt + 1
            );
            match self.exchange(&query, server) {
                Ok(answer) => {
                    let rcode = answer.header().rcode();
                    if rcode != Rcode::NOERROR {
                        return Err(Error::Rcode(rcode));
                    }
                    return Ok(answer);
                }
                Err(err) if err.is_timeout() => {
                    debug!("query for {} to {} timed out", qname, server);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(Error::Timeout)
    }

    /// Picks a server at random.
    fn choose_server(&self) -> &str {
        let idx = self.rng.lock().gen_range(0..self.servers.len());
        &self.servers[idx]
    }

    /// Sends a query to `server` and waits for its response.
    fn exchange(
        &self,
        query: &Message<Vec<u8>>,
        server: &str,
    ) -> Result<Message<Vec<u8>>, net::Error> {
        if self.reuse_connections {
            self.with_connection(server, |conn| {
                conn.send(query)?;
                conn.receive()
            })
        } else {
            self.transport.exchange(query, server, self.timeout)
        }
    }

    /// Runs `op` on the connection to `server`, dialing it if necessary.
    ///
    /// Only the slot of `server` is locked while dialing. If dialing fails,
    /// the slot stays empty and the next call tries again.
    fn with_connection<R>(
        &self,
        server: &str,
        op: impl FnOnce(&mut T::Connection) -> Result<R, net::Error>,
    ) -> Result<R, net::Error> {
        let slot =
            self.conns.lock().entry(server.into()).or_default().clone();
        let mut slot = slot.lock();
        let conn = match &mut *slot {
            Some(conn) => conn,
            empty @ None => {
                let conn = self.transport.dial(server, self.timeout)?;
                debug!("dialed new connection to {}", server);
                empty.insert(conn)
            }
        };
        op(conn)
    }
}

impl<T: Transport + fmt::Debug> fmt::Debug for Resolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("servers", &self.servers)
            .field("retries", &self.retries)
            .field("reuse_connections", &self.reuse_connections)
            .field("timeout", &self.timeout)
            .field("transport", &self.transport)
            .finish()
    }
}

//------------ Helper Functions ----------------------------------------------

/// Creates the query message for the A records of `qname`.
///
/// Every call produces a new random message ID.
fn create_message(qname: &Name<Vec<u8>>) -> Result<Message<Vec<u8>>, Error> {
    let mut message = MessageBuilder::new_vec();
    message.header_mut().set_random_id();
    message.header_mut().set_rd(true);
    let mut message = message.question();
    message.push((qname, Rtype::A)).map_err(|_| Error::Compose)?;
    Ok(message.into_message())
}

/// Appends the default port to a server address that has none.
fn with_default_port(server: String) -> String {
    if server.parse::<SocketAddr>().is_ok() {
        return server;
    }
    if let Ok(addr) = server.parse::<IpAddr>() {
        return SocketAddr::new(addr, DEFAULT_PORT).to_string();
    }
    match server.rsplit_once(':') {
        Some((host, port))
            if !host.is_empty()
                && !host.contains(':')
                && port.parse::<u16>().is_ok() =>
        {
            server
        }
        _ => format!("{server}:{DEFAULT_PORT}"),
    }
}

/// Returns a seed for the random number generator based on the current time.
fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|since| since.as_nanos() as u64)
        .unwrap_or_default()
}

//============ Testing =======================================================
