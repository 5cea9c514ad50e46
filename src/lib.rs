//! A small retrying DNS stub resolver.
//!
//! This crate resolves host names into IPv4 addresses by asking one of a
//! configured set of upstream name servers. Every attempt picks a server at
//! random. If the chosen server does not answer in time, the query is
//! repeated, again against a randomly chosen server, until a retry budget
//! is used up. Any other failure ends the lookup right away.
//!
//! The DNS messages themselves are built and parsed with the
//! [domain](https://github.com/nlnetlabs/domain) crate. Sending them is the
//! job of a [transport][net::Transport]. A UDP transport is provided, but
//! any type implementing the trait can be plugged in.
//!
//! # Modules
//!
//! * [resolv] contains the [`Resolver`][resolv::Resolver] itself, its
//!   errors, and a reader for `/etc/resolv.conf`-style files, and
//! * [net] contains the transport traits and, if enabled, the UDP
//!   transport.
//!
//! # Reference of Feature Flags
//!
//! * `udp`: Enables the
#![cfg_attr(feature = "udp", doc = "  [`UdpTransport`][net::UdpTransport]")]
#![cfg_attr(not(feature = "udp"), doc = "  `UdpTransport`")]
//!   based on the [Tokio](https://tokio.rs/) async runtime as well as the
//!   constructors of the resolver that use it. This feature is enabled by
//!   default.
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "udp")]
//! # fn main() -> Result<(), stub_resolv::resolv::Error> {
//! use stub_resolv::resolv::Resolver;
//!
//! let resolver = Resolver::new(["192.0.2.53", "198.51.100.53:5353"]);
//! for addr in resolver.lookup_host("www.example.com")? {
//!     println!("{addr}");
//! }
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "udp"))]
//! # fn main() { }
//! ```

#![allow(renamed_and_removed_lints)]
#![allow(clippy::unknown_clippy_lints)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod net;
pub mod resolv;
