//! A DNS over UDP transport.
//!
//! The transport offers a blocking interface but uses Tokio’s sockets and
//! timers underneath. These are driven by a current-thread runtime that is
//! created the first time the transport is used and then shared by the
//! transport and all its connections.
//!
//! Because of this, none of the methods may be called from within an
//! asynchronous context. Doing so will panic.

#![warn(missing_docs)]

use super::error::Error;
use super::transport::{Connection, Transport};
use domain::base::message::Message;
use parking_lot::Mutex;
use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::runtime::{self, Runtime};
use tokio::time::timeout;
use tracing::trace;

//------------ Configuration Constants ---------------------------------------

/// How many times do we try a new random port if we get ‘address in use.’
const RETRY_RANDOM_PORT: usize = 10;

/// The size of the receive buffer.
///
/// Since we don’t send EDNS, servers won’t send us anything larger than
/// 512 bytes. We leave some room for those that do anyway.
const RECV_SIZE: usize = 2000;

//------------ UdpTransport --------------------------------------------------

/// A transport sending DNS queries over UDP.
///
/// Values can be cloned cheaply. Clones share the runtime.
#[derive(Clone, Default)]
pub struct UdpTransport {
    /// The runtime once it has been created.
    runtime: Arc<Mutex<Option<Arc<Runtime>>>>,
}

impl UdpTransport {
    /// Creates a new UDP transport.
    ///
    /// This does not perform any I/O. The runtime is started on first use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the runtime, creating it if necessary.
    fn runtime(&self) -> Result<Arc<Runtime>, Error> {
        let mut runtime = self.runtime.lock();
        if let Some(runtime) = runtime.as_ref() {
            return Ok(runtime.clone());
        }
        let new = runtime::Builder::new_current_thread()
            .enable_io()
            .enable_time()
            .build()
            .map(Arc::new)
            .map_err(|err| Error::Runtime(Arc::new(err)))?;
        *runtime = Some(new.clone());
        Ok(new)
    }
}

impl Transport for UdpTransport {
    type Connection = UdpConnection;

    fn exchange(
        &self,
        query: &Message<Vec<u8>>,
        server: &str,
        io_timeout: Duration,
    ) -> Result<Message<Vec<u8>>, Error> {
        self.runtime()?.block_on(async {
            match timeout(io_timeout, async {
                let sock = udp_connect(server).await?;
                udp_send(&sock, query).await?;
                udp_recv(&sock, query).await
            })
            .await
            {
                Ok(res) => res,
                Err(_) => Err(Error::Timeout),
            }
        })
    }

    fn dial(
        &self,
        server: &str,
        dial_timeout: Duration,
    ) -> Result<UdpConnection, Error> {
        let runtime = self.runtime()?;
        let sock = runtime.block_on(async {
            match timeout(dial_timeout, udp_connect(server)).await {
                Ok(res) => res,
                Err(_) => Err(Error::Timeout),
            }
        })?;
        Ok(UdpConnection {
            sock,
            last_query: None,
            timeout: dial_timeout,
            runtime,
        })
    }
}

impl fmt::Debug for UdpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UdpTransport")
            .field("started", &self.runtime.lock().is_some())
            .finish()
    }
}

//------------ UdpConnection -------------------------------------------------

/// A connected UDP socket.
///
/// The socket stays open for as long as the value exists. Responses that
/// arrive late for an earlier query are recognized as such and skipped.
pub struct UdpConnection {
    /// The connected socket.
    sock: UdpSocket,

    /// The query sent last.
    ///
    /// We need this to match the response against it.
    last_query: Option<Message<Vec<u8>>>,

    /// How long to wait for a response.
    timeout: Duration,

    /// The runtime driving the socket.
    ///
    /// This needs to be dropped after the socket.
    runtime: Arc<Runtime>,
}

impl UdpConnection {
    /// Returns the local address of the socket.
    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        self.sock
            .local_addr()
            .map_err(|err| Error::UdpBind(Arc::new(err)))
    }
}

impl Connection for UdpConnection {
    fn send(&mut self, query: &Message<Vec<u8>>) -> Result<(), Error> {
        let sock = &self.sock;
        let io_timeout = self.timeout;
        self.runtime.block_on(async {
            match timeout(io_timeout, udp_send(sock, query)).await {
                Ok(res) => res,
                Err(_) => Err(Error::Timeout),
            }
        })?;
        self.last_query = Some(query.clone());
        Ok(())
    }

    fn receive(&mut self) -> Result<Message<Vec<u8>>, Error> {
        let query = self.last_query.as_ref().ok_or(Error::NothingSent)?;
        let sock = &self.sock;
        let io_timeout = self.timeout;
        self.runtime.block_on(async {
            match timeout(io_timeout, udp_recv(sock, query)).await {
                Ok(res) => res,
                Err(_) => Err(Error::Timeout),
            }
        })
    }
}

impl fmt::Debug for UdpConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UdpConnection")
            .field("sock", &self.sock)
            .field("timeout", &self.timeout)
            .finish()
    }
}

//------------ Helper Functions ----------------------------------------------

/// Creates a UDP socket connected to `server`.
async fn udp_connect(server: &str) -> Result<UdpSocket, Error> {
    let addr = tokio::net::lookup_host(server)
        .await
        .map_err(|err| Error::ServerAddr(Arc::new(err)))?
        .next()
        .ok_or_else(|| {
            Error::ServerAddr(Arc::new(io::Error::new(
                io::ErrorKind::NotFound,
                "no address for server",
            )))
        })?;
    let sock = udp_bind(addr.is_ipv4()).await?;
    sock.connect(addr)
        .await
        .map_err(|err| Error::UdpConnect(Arc::new(err)))?;
    trace!("connected {:?} to {}", sock.local_addr(), addr);
    Ok(sock)
}

/// Binds a UDP socket to a random port of the given address family.
async fn udp_bind(v4: bool) -> Result<UdpSocket, Error> {
    let mut i = 0;
    loop {
        let local: SocketAddr = if v4 {
            ([0u8; 4], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        match UdpSocket::bind(&local).await {
            Ok(sock) => return Ok(sock),
            Err(err) => {
                if i == RETRY_RANDOM_PORT {
                    return Err(Error::UdpBind(Arc::new(err)));
                } else {
                    i += 1
                }
            }
        }
    }
}

/// Sends the query over a connected socket.
async fn udp_send(
    sock: &UdpSocket,
    query: &Message<Vec<u8>>,
) -> Result<(), Error> {
    let sent = sock
        .send(query.as_slice())
        .await
        .map_err(|err| Error::UdpSend(Arc::new(err)))?;
    if sent != query.as_slice().len() {
        return Err(Error::UdpShortSend);
    }
    Ok(())
}

/// Waits for the response to `query` on a connected socket.
///
/// Datagrams that aren’t DNS messages or aren’t responses to the query are
/// skipped. There is a timer on the whole thing, so this loop ends
/// eventually.
async fn udp_recv(
    sock: &UdpSocket,
    query: &Message<Vec<u8>>,
) -> Result<Message<Vec<u8>>, Error> {
    loop {
        let mut buf = vec![0; RECV_SIZE];
        let len = sock
            .recv(&mut buf)
            .await
            .map_err(|err| Error::UdpReceive(Arc::new(err)))?;
        buf.truncate(len);

        let answer = match Message::from_octets(buf) {
            Ok(answer) => answer,
            Err(_) => {
                trace!("skipping {len} octets of garbage");
                continue;
            }
        };
        if !is_response_to(&answer, query) {
            trace!("skipping response with ID {}", answer.header().id());
            continue;
        }
        return Ok(answer);
    }
}

/// Returns whether `answer` is a response to `query`.
///
/// Error responses often come without a question section, so the question
/// is only compared if there is one.
fn is_response_to(
    answer: &Message<Vec<u8>>,
    query: &Message<Vec<u8>>,
) -> bool {
    if !answer.header().qr() || answer.header().id() != query.header().id() {
        false
    } else if answer.header_counts().qdcount() == 0 {
        true
    } else {
        answer.is_answer(query)
    }
}
