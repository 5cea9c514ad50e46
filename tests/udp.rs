#![cfg(feature = "udp")]

mod common;

use common::{answer, Rec};
use domain::base::iana::Rcode;
use domain::base::message::Message;
use domain::base::message_builder::MessageBuilder;
use rstest::rstest;
use std::net::{IpAddr, SocketAddr, UdpSocket};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use stub_resolv::net::{Connection, Transport, UdpTransport};
use stub_resolv::resolv::{Error, Resolver};

/// How long the test server waits for queries before it quits.
const SERVER_IDLE: Duration = Duration::from_millis(500);

//------------ Test Server ---------------------------------------------------

/// What the test server saw.
struct Seen {
    peers: Vec<SocketAddr>,
}

/// Starts a server on a loopback port.
///
/// The handler is called for each query with its number and returns the
/// datagrams to send back.
fn server<F>(handler: F) -> (String, JoinHandle<Seen>)
where
    F: Fn(usize, &Message<Vec<u8>>) -> Vec<Vec<u8>> + Send + 'static,
{
    let sock = UdpSocket::bind("127.0.0.1:0").unwrap();
    sock.set_read_timeout(Some(SERVER_IDLE)).unwrap();
    let addr = sock.local_addr().unwrap().to_string();
    let handle = thread::spawn(move || {
        let mut seen = Seen { peers: Vec::new() };
        let mut buf = [0u8; 2000];
        while let Ok((len, peer)) = sock.recv_from(&mut buf) {
            let query = Message::from_octets(buf[..len].to_vec()).unwrap();
            for dgram in handler(seen.peers.len(), &query) {
                sock.send_to(&dgram, peer).unwrap();
            }
            seen.peers.push(peer);
        }
        seen
    });
    (addr, handle)
}

fn reply(
    query: &Message<Vec<u8>>,
    rcode: Rcode,
    records: &[Rec],
) -> Vec<u8> {
    answer(query, rcode, records).into_octets()
}

/// Builds an error response with an empty question section.
fn bare_error(query: &Message<Vec<u8>>, rcode: Rcode) -> Vec<u8> {
    let mut response = MessageBuilder::new_vec();
    response.header_mut().set_id(query.header().id());
    response.header_mut().set_qr(true);
    response.header_mut().set_rcode(rcode);
    response.finish()
}

fn quick_resolver(server: &str) -> Resolver<UdpTransport> {
    let mut res = Resolver::new([server]);
    res.set_timeout(Duration::from_millis(250));
    res
}

//------------ Tests ---------------------------------------------------------

#[test]
fn lookup_over_udp() {
    let (addr, server) = server(|_, query| {
        vec![reply(
            query,
            Rcode::NOERROR,
            &[Rec::Cname("alias.example.com"), Rec::A([192, 0, 2, 1])],
        )]
    });
    let res = Resolver::new([addr.as_str()]);
    let found = res.lookup_host_full("www.example.com").unwrap();
    assert_eq!(found.addrs(), [IpAddr::from([192, 0, 2, 1])]);
    assert_eq!(found.cnames().len(), 1);
    assert_eq!(server.join().unwrap().peers.len(), 1);
}

#[test]
fn silent_server_times_out() {
    let (addr, server) = server(|_, _| Vec::new());
    let mut res = quick_resolver(&addr);
    res.set_retries(2);
    let err = res.lookup_host("www.example.com").unwrap_err();
    assert!(matches!(err, Error::Timeout));
    assert_eq!(server.join().unwrap().peers.len(), 3);
}

#[test]
fn nxdomain_over_udp() {
    let (addr, server) =
        server(|_, query| vec![reply(query, Rcode::NXDOMAIN, &[])]);
    let res = quick_resolver(&addr);
    let err = res.lookup_host("nonexistent.example.com").unwrap_err();
    assert_eq!(err.rcode(), Some(Rcode::NXDOMAIN));
    assert_eq!(server.join().unwrap().peers.len(), 1);
}

#[rstest]
#[case(Rcode::REFUSED)]
#[case(Rcode::FORMERR)]
#[case(Rcode::NOTIMP)]
fn error_without_question(#[case] rcode: Rcode) {
    let (addr, server) =
        server(move |_, query| vec![bare_error(query, rcode)]);
    let res = quick_resolver(&addr);
    let err = res.lookup_host("www.example.com").unwrap_err();
    assert_eq!(err.rcode(), Some(rcode));
    assert_eq!(server.join().unwrap().peers.len(), 1);
}

#[test]
fn error_with_other_id_is_skipped() {
    let (addr, server) = server(|_, query| {
        let mut wrong_id = bare_error(query, Rcode::REFUSED);
        wrong_id[0] ^= 0xff;
        vec![
            wrong_id,
            reply(query, Rcode::NOERROR, &[Rec::A([192, 0, 2, 4])]),
        ]
    });
    let res = quick_resolver(&addr);
    assert_eq!(
        res.lookup_host("www.example.com").unwrap(),
        [IpAddr::from([192, 0, 2, 4])]
    );
    server.join().unwrap();
}

#[test]
fn unrelated_datagrams_are_skipped() {
    let (addr, server) = server(|_, query| {
        let mut wrong_id =
            reply(query, Rcode::NOERROR, &[Rec::A([198, 51, 100, 1])]);
        wrong_id[0] ^= 0xff;
        vec![
            b"garbage".to_vec(),
            wrong_id,
            reply(query, Rcode::NOERROR, &[Rec::A([192, 0, 2, 2])]),
        ]
    });
    let res = quick_resolver(&addr);
    assert_eq!(
        res.lookup_host("www.example.com").unwrap(),
        [IpAddr::from([192, 0, 2, 2])]
    );
    server.join().unwrap();
}

#[test]
fn reused_connection_keeps_its_port() {
    let (addr, server) = server(|_, query| {
        vec![reply(query, Rcode::NOERROR, &[Rec::A([192, 0, 2, 3])])]
    });
    let mut res = quick_resolver(&addr);
    res.set_reuse_connections(true);
    for _ in 0..3 {
        assert!(res.lookup_host("www.example.com").is_ok());
    }
    let peers = server.join().unwrap().peers;
    assert_eq!(peers.len(), 3);
    assert!(peers.iter().all(|peer| *peer == peers[0]));
}

#[test]
fn connection_over_udp() {
    let (addr, server) = server(|n, query| {
        vec![reply(query, Rcode::NOERROR, &[Rec::A([10, 0, 0, n as u8])])]
    });
    let transport = UdpTransport::new();
    let mut conn = transport.dial(&addr, Duration::from_secs(1)).unwrap();
    let local = conn.local_addr().unwrap();
    assert!(matches!(
        conn.receive(),
        Err(stub_resolv::net::Error::NothingSent)
    ));

    for _ in 0..2 {
        let query = common::query("www.example.com");
        conn.send(&query).unwrap();
        let response = conn.receive().unwrap();
        assert!(response.is_answer(&query));
    }
    assert_eq!(conn.local_addr().unwrap(), local);
    drop(conn);
    assert_eq!(server.join().unwrap().peers, [local, local]);
}
