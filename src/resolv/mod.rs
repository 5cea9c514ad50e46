//! A blocking stub resolver with retries.
//!
//! The main type is [`Resolver`]. It is created either from a list of
//! servers or from a resolv.conf-style file described by [`ResolvConf`],
//! and answers host name lookups through [`Resolver::lookup_host`] and
//! [`Resolver::lookup_host_full`].

pub use self::conf::ResolvConf;
pub use self::error::{Error, ErrorKind};
pub use self::lookup::{FoundHosts, FoundHostsIter, FoundHostsSocketIter};
pub use self::resolver::Resolver;

pub mod conf;
mod error;
mod lookup;
mod resolver;
