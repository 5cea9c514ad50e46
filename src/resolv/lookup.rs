//! Looking up host names.
//!
//! The resolver only ever asks for A records. This module takes care of
//! pulling the interesting records out of the answers it receives.

use domain::base::message::Message;
use domain::base::name::{Name, ParsedName, ToName};
use domain::rdata::{Cname, A};
use std::io;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::slice;

//------------ FoundHosts ----------------------------------------------------

/// The result of a full host name lookup.
///
/// Contains the addresses and the targets of all aliases that were part of
/// the answer, each in the order they appeared in.
#[derive(Clone, Debug, Default)]
pub struct FoundHosts {
    /// The addresses of all A records.
    addrs: Vec<IpAddr>,

    /// The targets of all CNAME records.
    cnames: Vec<Name<Vec<u8>>>,
}

impl FoundHosts {
    /// Collects addresses and alias targets from an answer.
    pub(super) fn from_answer(answer: &Message<Vec<u8>>) -> Self {
        FoundHosts {
            addrs: addrs_from_answer(answer),
            cnames: cnames_from_answer(answer),
        }
    }

    /// Returns the addresses.
    pub fn addrs(&self) -> &[IpAddr] {
        &self.addrs
    }

    /// Returns the targets of the aliases.
    pub fn cnames(&self) -> &[Name<Vec<u8>>] {
        &self.cnames
    }

    /// Returns whether the lookup did not yield any addresses.
    pub fn is_empty(&self) -> bool {
        self.addrs.is_empty()
    }

    /// Returns an iterator over the addresses.
    pub fn iter(&self) -> FoundHostsIter {
        FoundHostsIter(self.addrs.iter())
    }

    /// Returns an iterator over socket addresses with the given port.
    pub fn port_iter(&self, port: u16) -> FoundHostsSocketIter {
        FoundHostsSocketIter(self.addrs.iter(), port)
    }

    /// Splits the value into the addresses and the alias targets.
    pub fn into_parts(self) -> (Vec<IpAddr>, Vec<Name<Vec<u8>>>) {
        (self.addrs, self.cnames)
    }
}

//------------ FoundHostsIter ------------------------------------------------

/// An iterator over the addresses of a [`FoundHosts`].
#[derive(Clone, Debug)]
pub struct FoundHostsIter<'a>(slice::Iter<'a, IpAddr>);

impl<'a> Iterator for FoundHostsIter<'a> {
    type Item = IpAddr;

    fn next(&mut self) -> Option<IpAddr> {
        self.0.next().copied()
    }
}

//------------ FoundHostsSocketIter ------------------------------------------

/// An iterator over socket addresses made from a [`FoundHosts`].
#[derive(Clone, Debug)]
pub struct FoundHostsSocketIter<'a>(slice::Iter<'a, IpAddr>, u16);

impl<'a> Iterator for FoundHostsSocketIter<'a> {
    type Item = SocketAddr;

    fn next(&mut self) -> Option<SocketAddr> {
        self.0.next().map(|addr| SocketAddr::new(*addr, self.1))
    }
}

impl<'a> ToSocketAddrs for FoundHostsSocketIter<'a> {
    type Iter = Self;

    fn to_socket_addrs(&self) -> io::Result<Self> {
        Ok(self.clone())
    }
}

//------------ Helper Functions ----------------------------------------------

/// Returns the addresses of all A records in the answer section.
///
/// Records that fail to parse are skipped.
pub(super) fn addrs_from_answer(answer: &Message<Vec<u8>>) -> Vec<IpAddr> {
    let mut addrs = Vec::new();
    if let Ok(section) = answer.answer() {
        for record in section.limit_to::<A>().flatten() {
            addrs.push(IpAddr::V4(record.data().addr()))
        }
    }
    addrs
}

/// Returns the targets of all CNAME records in the answer section.
fn cnames_from_answer(answer: &Message<Vec<u8>>) -> Vec<Name<Vec<u8>>> {
    let mut cnames = Vec::new();
    if let Ok(section) = answer.answer() {
        let records = section.limit_to::<Cname<ParsedName<&[u8]>>>();
        for record in records.flatten() {
            cnames.push(record.data().cname().to_name())
        }
    }
    cnames
}

//============ Testing =======================================================
