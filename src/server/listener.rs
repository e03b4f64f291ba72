// Reusable listener module
// TCP listener construction with address reuse enabled

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::TcpListener;

/// Create a `TcpListener` with `SO_REUSEPORT` and `SO_REUSEADDR` enabled.
///
/// Address reuse lets a replacement process bind the port while the old
/// one still holds sockets in TIME_WAIT, so redeploys do not race the
/// kernel for the address.
pub fn create_reusable_listener(addr: std::net::SocketAddr) -> std::io::Result<TcpListener> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_port(true)?;
    socket.set_reuse_address(true)?;

    // Non-blocking mode is required before handing the socket to tokio
    socket.set_nonblocking(true)?;

    socket.bind(&addr.into())?;
    socket.listen(128)?;

    let std_listener: std::net::TcpListener = socket.into();
    TcpListener::from_std(std_listener)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_listener_binds_ephemeral_port() {
        let listener = create_reusable_listener("127.0.0.1:0".parse().expect("addr"))
            .expect("bind should succeed");
        let local = listener.local_addr().expect("local addr");
        assert!(local.port() > 0);
    }

    #[tokio::test]
    async fn test_two_listeners_share_an_address() {
        let first = create_reusable_listener("127.0.0.1:0".parse().expect("addr"))
            .expect("first bind");
        let addr = first.local_addr().expect("local addr");

        // SO_REUSEPORT allows a second bind on the same port
        let second = create_reusable_listener(addr);
        assert!(second.is_ok());
    }
}
