//! Resolver configuration.
//!
//! The resolver needs little more than a list of servers to ask. This list
//! is commonly kept in the system’s `/etc/resolv.conf`. The type
//! [`ResolvConf`] can read files in that format and keeps the parts of
//! them the resolver cares about.
//!
//! Only two kinds of entries are used: `nameserver` lines, each of which
//! adds one server, and the `timeout` option which sets how long to wait
//! for a server. Everything else a resolv.conf may contain is skipped.

use std::error;
use std::fmt;
use std::fs;
use std::io::{self, BufRead, Read};
use std::path::Path;
use std::str::SplitWhitespace;
use std::sync::Arc;
use std::time::Duration;

//------------ ResolvConf ----------------------------------------------------

/// Resolver configuration.
///
/// You can create an empty value with [`ResolvConf::new`] and fill it in
/// by hand or through [`parse`][Self::parse] and
/// [`parse_file`][Self::parse_file]. Parsing appends to the values that
/// are already there.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ResolvConf {
    /// Addresses of the servers to query.
    ///
    /// These are kept as given. A missing port is added only when the
    /// resolver is created.
    pub servers: Vec<String>,

    /// Timeout to wait for a response.
    ///
    /// If this is `None`, the resolver’s default is used.
    pub timeout: Option<Duration>,
}

impl ResolvConf {
    /// Creates a new, empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let mut res = Self::new();
        res.parse_file(path)?;
        Ok(res)
    }
}

/// # Parsing Configuration File
///
impl ResolvConf {
    /// Parses the configuration from a file.
    pub fn parse_file(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<(), Error> {
        let mut file = fs::File::open(path)?;
        self.parse(&mut file)
    }

    /// Parses the configuration from a reader.
    ///
    /// The format is that of the /etc/resolv.conf file.
    pub fn parse<R: Read>(&mut self, reader: &mut R) -> Result<(), Error> {
        for (idx, line) in io::BufReader::new(reader).lines().enumerate() {
            let lineno = idx + 1;
            let line = line.map_err(|err| {
                if err.kind() == io::ErrorKind::InvalidData {
                    Error::Parse(lineno)
                } else {
                    Error::Io(Arc::new(err))
                }
            })?;
            let line = line.trim_end();

            if line.is_empty()
                || line.starts_with(';')
                || line.starts_with('#')
            {
                continue;
            }

            let mut words = line.split_whitespace();
            let res = match words.next() {
                Some("nameserver") => self.parse_nameserver(words),
                Some("options") => self.parse_options(words),
                // domain, search, sortlist, and anything unknown.
                _ => Ok(()),
            };
            res.map_err(|_| Error::Parse(lineno))?;
        }
        Ok(())
    }

    fn parse_nameserver(
        &mut self,
        mut words: SplitWhitespace,
    ) -> Result<(), ()> {
        let server = next_word(&mut words)?;
        no_more_words(words)?;
        self.servers.push(server.into());
        Ok(())
    }

    fn parse_options(&mut self, words: SplitWhitespace) -> Result<(), ()> {
        for word in words {
            if let ("timeout", Some(arg)) = split_arg(word) {
                let secs = arg.parse::<u64>().map_err(|_| ())?;
                self.timeout = Some(Duration::from_secs(secs));
            }
        }
        Ok(())
    }
}

//--- Display

impl fmt::Display for ResolvConf {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for server in &self.servers {
            writeln!(f, "nameserver {server}")?;
        }
        if let Some(timeout) = self.timeout {
            // XXX This ignores fractional seconds.
            writeln!(f, "options timeout:{}", timeout.as_secs())?;
        }
        Ok(())
    }
}

//------------ Private Helpers -----------------------------------------------

/// Returns a reference to the next word or an error.
fn next_word<'a>(words: &mut SplitWhitespace<'a>) -> Result<&'a str, ()> {
    words.next().ok_or(())
}

/// Returns nothing but errors out if there are words left.
fn no_more_words(mut words: SplitWhitespace) -> Result<(), ()> {
    match words.next() {
        Some(..) => Err(()),
        None => Ok(()),
    }
}

/// Splits the name and argument from an option with arguments.
fn split_arg(s: &str) -> (&str, Option<&str>) {
    match s.split_once(':') {
        Some((name, arg)) => (name, Some(arg)),
        None => (s, None),
    }
}

//------------ Error ---------------------------------------------------------

/// The error that can happen when reading a resolv.conf file.
#[derive(Clone, Debug)]
pub enum Error {
    /// The line with the given number could not be parsed.
    Parse(usize),

    /// Something happend while reading.
    Io(Arc<io::Error>),
}

impl Error {
    /// Returns whether the error was caused by a missing file.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Io(err) => err.kind() == io::ErrorKind::NotFound,
            Error::Parse(_) => false,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(Arc::new(err))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(line) => {
                write!(f, "error parsing configuration at line {line}")
            }
            Error::Io(err) => write!(f, "error reading configuration: {err}"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Parse(_) => None,
            Error::Io(err) => Some(err),
        }
    }
}

//============ Testing =======================================================
