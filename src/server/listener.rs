//! The single TCP listener behind [`Dispatcher::listen`](crate::Dispatcher::listen).
//!
//! [`Listener::bind`] resolves the address, starts the `may_minihttp` accept
//! coroutine and returns only once the socket accepts connections. A listener
//! that never becomes ready is cancelled before the error is returned, so a
//! failed bind leaves nothing running and nothing holding the service.

use may::coroutine::JoinHandle;
use may_minihttp::{HttpServerWithHeaders, HttpService};
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Header slots per request; gateways and proxies add their own.
const MAX_HEADERS: usize = 32;
const READY_ATTEMPTS: u32 = 200;
const READY_INTERVAL: Duration = Duration::from_millis(5);

/// A running accept loop. Dropping it leaves the loop running; call
/// [`Listener::stop`].
pub struct Listener {
    addr: SocketAddr,
    accept: JoinHandle<()>,
}

impl Listener {
    /// Serve `service` on `addr`.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for an unresolvable address or port 0
    /// - bind failures
    /// - `TimedOut` when the socket never accepts a connection
    pub fn bind<S, A>(service: S, addr: A) -> io::Result<Self>
    where
        S: HttpService + Clone + Send + Sync + 'static,
        A: ToSocketAddrs,
    {
        let addr = resolve(addr)?;
        let accept = HttpServerWithHeaders::<_, MAX_HEADERS>(service).start(addr)?;
        let listener = Self { addr, accept };
        if let Err(err) = listener.wait_ready() {
            warn!(addr = %addr, error = %err, "Listener not accepting; cancelling it");
            listener.stop();
            return Err(err);
        }
        debug!(addr = %addr, "Listener accepting connections");
        Ok(listener)
    }

    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn wait_ready(&self) -> io::Result<()> {
        let target = connect_target(self.addr);
        for _ in 0..READY_ATTEMPTS {
            if TcpStream::connect_timeout(&target, READY_INTERVAL).is_ok() {
                return Ok(());
            }
            thread::sleep(READY_INTERVAL);
        }
        Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("listener on {} is not accepting connections", self.addr),
        ))
    }

    /// Cancel the accept loop and wait for it to exit. The service it owns
    /// is dropped with it.
    pub fn stop(self) {
        // SAFETY: `accept` is consumed here, so the coroutine is cancelled at
        // most once and only while its handle is alive.
        unsafe {
            self.accept.coroutine().cancel();
        }
        // A cancelled coroutine always reports the cancellation as a panic.
        drop(self.accept.join());
    }
}

/// First resolved address, refusing port 0: readiness is checked against the
/// requested port, not one the OS would pick.
fn resolve<A: ToSocketAddrs>(addr: A) -> io::Result<SocketAddr> {
    let addr = addr
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "address did not resolve"))?;
    if addr.port() == 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "listener needs an explicit port",
        ));
    }
    Ok(addr)
}

/// Where to connect when checking readiness; wildcard binds are reached on loopback.
fn connect_target(addr: SocketAddr) -> SocketAddr {
    match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => {
            SocketAddr::new(Ipv4Addr::LOCALHOST.into(), addr.port())
        }
        IpAddr::V6(ip) if ip.is_unspecified() => {
            SocketAddr::new(Ipv6Addr::LOCALHOST.into(), addr.port())
        }
        _ => addr,
    }
}
