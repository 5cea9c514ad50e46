//! Looks up the addresses of host names.
//!
//! Usage: lookup [+reuse] [+retries=N] [@server ...] <hostname> ...
//!
//! Without any `@server` arguments, the servers from /etc/resolv.conf are
//! used.
use std::env;
use std::process::ExitCode;
use stub_resolv::resolv::Resolver;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Setup logging. You can override the log level by setting environment
    // variable RUST_LOG, e.g. RUST_LOG=trace.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .without_time()
        .try_init()
        .ok();

    let mut servers = Vec::new();
    let mut names = Vec::new();
    let mut reuse = false;
    let mut retries = None;
    for arg in env::args().skip(1) {
        if let Some(server) = arg.strip_prefix('@') {
            servers.push(server.to_string())
        } else if arg == "+reuse" {
            reuse = true
        } else if let Some(value) = arg.strip_prefix("+retries=") {
            match value.parse::<usize>() {
                Ok(value) => retries = Some(value),
                Err(_) => {
                    eprintln!("Invalid retry count {value}");
                    return ExitCode::FAILURE;
                }
            }
        } else if arg.starts_with('+') {
            println!("Warning: ignoring unknown query option {arg}");
        } else {
            names.push(arg)
        }
    }
    if names.is_empty() {
        println!(
            "Usage: lookup [+reuse] [+retries=N] [@server ...] <hostname> ..."
        );
        return ExitCode::FAILURE;
    }

    let mut resolver = if servers.is_empty() {
        match Resolver::from_conf_file("/etc/resolv.conf") {
            Ok(resolver) => resolver,
            Err(err) => {
                eprintln!("Error: {err}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        Resolver::new(servers)
    };
    resolver.set_reuse_connections(reuse);
    if let Some(retries) = retries {
        resolver.set_retries(retries);
    }

    let mut status = ExitCode::SUCCESS;
    for name in names {
        match resolver.lookup_host_full(&name) {
            Ok(found) => {
                for cname in found.cnames() {
                    println!("{name} is an alias for {cname}");
                }
                for addr in found.iter() {
                    println!("{name} has address {addr}");
                }
                if found.is_empty() {
                    println!("{name} has no IPv4 address");
                }
            }
            Err(err) => {
                println!("Error looking up {name}: {err}");
                status = ExitCode::FAILURE;
            }
        }
    }
    status
}
