//! A scripted transport for testing the resolver.
#![allow(dead_code)]

use domain::base::iana::{Rcode, Rtype};
use domain::base::message::Message;
use domain::base::message_builder::MessageBuilder;
use domain::base::name::Name;
use domain::rdata::{Cname, A};
use parking_lot::Mutex;
use std::io;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use stub_resolv::net::{self, Connection, Transport};

//------------ Reply ---------------------------------------------------------

/// What the fake server does with a query.
#[derive(Clone, Debug)]
pub enum Reply {
    /// Don’t answer at all.
    Timeout,

    /// Fail with a connection refused error.
    Refused,

    /// Answer with the given response code and answer records.
    Answer(Rcode, Vec<Rec>),
}

impl Reply {
    /// A NOERROR answer with the given records.
    pub fn ok(records: &[Rec]) -> Self {
        Reply::Answer(Rcode::NOERROR, records.to_vec())
    }
}

/// A record in the answer section.
#[derive(Clone, Debug)]
pub enum Rec {
    A([u8; 4]),
    Cname(&'static str),
}

pub fn name(s: &str) -> Name<Vec<u8>> {
    Name::from_str(s).unwrap()
}

/// Builds a query for the A records of `qname`.
pub fn query(qname: &str) -> Message<Vec<u8>> {
    let mut query = MessageBuilder::new_vec();
    query.header_mut().set_random_id();
    query.header_mut().set_rd(true);
    let mut query = query.question();
    query.push((name(qname), Rtype::A)).unwrap();
    query.into_message()
}

/// Builds the response to `query`.
pub fn answer(
    query: &Message<Vec<u8>>,
    rcode: Rcode,
    records: &[Rec],
) -> Message<Vec<u8>> {
    let owner = name("host.example.com");
    let mut answer = MessageBuilder::new_vec()
        .start_answer(query, rcode)
        .unwrap();
    for record in records {
        match record {
            Rec::A([a, b, c, d]) => answer
                .push((owner.clone(), 60u32, A::from_octets(*a, *b, *c, *d)))
                .unwrap(),
            Rec::Cname(target) => answer
                .push((owner.clone(), 60u32, Cname::new(name(target))))
                .unwrap(),
        }
    }
    answer.into_message()
}

//------------ FakeTransport -------------------------------------------------

type Script = dyn Fn(usize) -> Reply + Send + Sync;

/// A transport that replies according to a script.
///
/// The script is called with the number of the attempt, starting at zero,
/// and returns what should happen.
#[derive(Clone)]
pub struct FakeTransport {
    inner: Arc<Inner>,
}

struct Inner {
    script: Box<Script>,
    attempts: AtomicUsize,
    exchanges: AtomicUsize,
    dials: AtomicUsize,
    failing_dials: AtomicUsize,
    servers: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn new(
        script: impl Fn(usize) -> Reply + Send + Sync + 'static,
    ) -> Self {
        FakeTransport {
            inner: Arc::new(Inner {
                script: Box::new(script),
                attempts: AtomicUsize::new(0),
                exchanges: AtomicUsize::new(0),
                dials: AtomicUsize::new(0),
                failing_dials: AtomicUsize::new(0),
                servers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// A transport that always replies the same way.
    pub fn always(reply: Reply) -> Self {
        Self::new(move |_| reply.clone())
    }

    /// Lets the next `n` dials fail.
    pub fn fail_dials(&self, n: usize) {
        self.inner.failing_dials.store(n, Ordering::SeqCst)
    }

    /// The number of queries the server saw.
    pub fn attempts(&self) -> usize {
        self.inner.attempts.load(Ordering::SeqCst)
    }

    /// The number of one-shot exchanges.
    pub fn exchanges(&self) -> usize {
        self.inner.exchanges.load(Ordering::SeqCst)
    }

    /// The number of successful dials.
    pub fn dials(&self) -> usize {
        self.inner.dials.load(Ordering::SeqCst)
    }

    /// The servers each attempt went to.
    pub fn servers(&self) -> Vec<String> {
        self.inner.servers.lock().clone()
    }
}

impl Inner {
    fn respond(
        &self,
        query: &Message<Vec<u8>>,
        server: &str,
    ) -> Result<Message<Vec<u8>>, net::Error> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        self.servers.lock().push(server.into());
        match (self.script)(attempt) {
            Reply::Timeout => Err(net::Error::Timeout),
            Reply::Refused => Err(refused()),
            Reply::Answer(rcode, records) => {
                Ok(answer(query, rcode, &records))
            }
        }
    }
}

fn refused() -> net::Error {
    net::Error::UdpReceive(Arc::new(io::Error::from(
        io::ErrorKind::ConnectionRefused,
    )))
}

impl Transport for FakeTransport {
    type Connection = FakeConnection;

    fn exchange(
        &self,
        query: &Message<Vec<u8>>,
        server: &str,
        _timeout: Duration,
    ) -> Result<Message<Vec<u8>>, net::Error> {
        self.inner.exchanges.fetch_add(1, Ordering::SeqCst);
        self.inner.respond(query, server)
    }

    fn dial(
        &self,
        server: &str,
        _timeout: Duration,
    ) -> Result<FakeConnection, net::Error> {
        let failing = self.inner.failing_dials.load(Ordering::SeqCst);
        if failing > 0 {
            self.inner.failing_dials.store(failing - 1, Ordering::SeqCst);
            return Err(net::Error::UdpConnect(Arc::new(io::Error::from(
                io::ErrorKind::AddrNotAvailable,
            ))));
        }
        self.inner.dials.fetch_add(1, Ordering::SeqCst);
        Ok(FakeConnection {
            inner: self.inner.clone(),
            server: server.into(),
            query: None,
        })
    }
}

//------------ FakeConnection ------------------------------------------------

pub struct FakeConnection {
    inner: Arc<Inner>,
    server: String,
    query: Option<Message<Vec<u8>>>,
}

impl Connection for FakeConnection {
    fn send(&mut self, query: &Message<Vec<u8>>) -> Result<(), net::Error> {
        self.query = Some(query.clone());
        Ok(())
    }

    fn receive(&mut self) -> Result<Message<Vec<u8>>, net::Error> {
        let query = self.query.take().ok_or(net::Error::NothingSent)?;
        self.inner.respond(&query, &self.server)
    }
}
