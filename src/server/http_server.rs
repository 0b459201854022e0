use may::coroutine::JoinHandle;
use may_minihttp::HttpService;
use std::any::Any;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const READY_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Runs an [`HttpService`] on its own may coroutine.
pub struct HttpServer<T>(pub T);

/// A running server: its bound address and accept-loop coroutine.
pub struct ServerHandle {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ServerHandle {
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Block until the listener accepts a TCP connection or `timeout` passes.
    ///
    /// A wildcard bind address is probed through loopback.
    ///
    /// # Errors
    ///
    /// Returns `TimedOut` if no connection succeeds in time.
    pub fn wait_ready(&self, timeout: Duration) -> io::Result<()> {
        let probe = probe_addr(self.addr);
        let started = Instant::now();
        loop {
            if TcpStream::connect_timeout(&probe, READY_POLL_INTERVAL).is_ok() {
                debug!(addr = %self.addr, waited_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX), "Server ready");
                return Ok(());
            }
            if started.elapsed() >= timeout {
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("server on {} not ready after {timeout:?}", self.addr),
                ));
            }
            thread::sleep(READY_POLL_INTERVAL);
        }
    }

    /// Cancel the accept loop and wait for its coroutine to exit.
    ///
    /// Connections already being served finish on their own coroutines.
    pub fn stop(self) {
        let addr = self.addr;
        // SAFETY: the coroutine belongs to this handle, which is consumed here,
        // so it is never touched again after cancellation.
        unsafe {
            self.handle.coroutine().cancel();
        }
        match self.handle.join() {
            Err(payload) => match panic_message(payload.as_ref()) {
                Some(msg) => warn!(addr = %addr, panic = msg, "Server coroutine panicked before stop"),
                None => debug!(addr = %addr, "Server stopped"),
            },
            Ok(()) => debug!(addr = %addr, "Server stopped"),
        }
    }

    /// Block until the accept loop exits.
    ///
    /// # Errors
    ///
    /// Returns the panic payload if the server coroutine panicked.
    pub fn join(self) -> std::thread::Result<()> {
        self.handle.join()
    }
}

impl<T: HttpService + Clone + Send + Sync + 'static> HttpServer<T> {
    /// Bind `addr` and start accepting connections.
    ///
    /// # Errors
    ///
    /// Returns an error if the address does not resolve or cannot be bound.
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> io::Result<ServerHandle> {
        let addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "address resolved to nothing"))?;
        let handle = may_minihttp::HttpServer(self.0).start(addr)?;
        debug!(addr = %addr, "Server started");
        Ok(ServerHandle { addr, handle })
    }
}

fn probe_addr(addr: SocketAddr) -> SocketAddr {
    match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => SocketAddr::new(Ipv4Addr::LOCALHOST.into(), addr.port()),
        IpAddr::V6(ip) if ip.is_unspecified() => SocketAddr::new(Ipv6Addr::LOCALHOST.into(), addr.port()),
        _ => addr,
    }
}

/// Text of a panic raised with a message. Cancellation unwinds with a
/// non-string payload and yields `None`.
fn panic_message(payload: &(dyn Any + Send)) -> Option<&str> {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_bind_is_probed_on_loopback() {
        let v4: SocketAddr = "0.0.0.0:8081".parse().unwrap();
        assert_eq!(probe_addr(v4), "127.0.0.1:8081".parse().unwrap());
        let v6: SocketAddr = "[::]:8081".parse().unwrap();
        assert_eq!(probe_addr(v6), "[::1]:8081".parse().unwrap());
        let exact: SocketAddr = "10.1.2.3:9000".parse().unwrap();
        assert_eq!(probe_addr(exact), exact);
    }

    #[test]
    fn panic_message_reads_string_payloads() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), Some("boom"));
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), Some("bang"));
        let payload: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(payload.as_ref()), None);
    }
}
