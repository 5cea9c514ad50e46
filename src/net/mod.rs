//! Sending and receiving DNS messages.
//!
//! The resolver does not talk to the network itself. Instead, it hands its
//! queries to a [`Transport`] which either performs a complete one-shot
//! exchange or opens a [`Connection`] that can be kept around and used for
//! many queries.
//!
//! Transports report failure through the structured [`Error`] type. The
//! resolver only ever looks at [`Error::is_timeout`] to decide whether a
//! query should be tried again.
//!
//! If the `udp` feature is enabled, the module also provides
#![cfg_attr(feature = "udp", doc = " [`UdpTransport`],")]
#![cfg_attr(not(feature = "udp"), doc = " `UdpTransport`,")]
//! a transport sending queries over UDP.

pub use self::error::Error;
pub use self::transport::{Connection, Transport};
#[cfg(feature = "udp")]
pub use self::udp::{UdpConnection, UdpTransport};

mod error;
mod transport;
#[cfg(feature = "udp")]
#[cfg_attr(docsrs, doc(cfg(feature = "udp")))]
mod udp;
