//! Lock passwords checked by the local sshd.

use std::io;
use std::net::{Ipv6Addr, SocketAddr, TcpStream};
use std::time::Duration;

use fbmux_core::{PasswordVerifier, Verdict};
use ssh2::Session;

const TIMEOUT: Duration = Duration::from_secs(10);

/// Verifies a password by logging in to `[::1]:port` over SSH.
#[derive(Clone, Debug)]
pub struct SshVerifier {
    addr: SocketAddr,
}

impl SshVerifier {
    pub fn new(port: u16) -> Self {
        Self {
            addr: SocketAddr::from((Ipv6Addr::LOCALHOST, port)),
        }
    }

    fn connect(&self) -> io::Result<Session> {
        let tcp = TcpStream::connect_timeout(&self.addr, TIMEOUT)?;
        let mut session = Session::new()?;
        session.set_timeout(TIMEOUT.as_millis() as u32);
        session.set_tcp_stream(tcp);
        session.handshake()?;
        Ok(session)
    }
}

impl PasswordVerifier for SshVerifier {
    fn verify(&self, user: &str, password: &str) -> Verdict {
        let session = match self.connect() {
            Ok(session) => session,
            Err(e) => {
                log::warn!("cannot reach sshd at {}: {e}", self.addr);
                return Verdict::Unavailable;
            }
        };
        let verdict = match session.userauth_password(user, password) {
            Ok(()) if session.authenticated() => Verdict::Accepted,
            Ok(()) => Verdict::Rejected,
            Err(e) => {
                log::debug!("authentication of {user} failed: {e}");
                Verdict::Rejected
            }
        };
        if let Err(e) = session.disconnect(None, "fbmux normal disconnect", None) {
            log::debug!("ssh disconnect: {e}");
        }
        verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_closed_port_is_unavailable() {
        let port = TcpListener::bind("[::1]:0")
            .and_then(|l| l.local_addr())
            .map(|a| a.port())
            .unwrap_or(1);
        let verifier = SshVerifier::new(port);
        assert_eq!(verifier.verify("nobody", "secret"), Verdict::Unavailable);
    }

    #[test]
    fn test_non_ssh_peer_is_unavailable() {
        let Ok(listener) = TcpListener::bind("[::1]:0") else {
            return;
        };
        let port = listener.local_addr().unwrap().port();
        let server = std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                use std::io::Write;
                let _ = stream.write_all(b"not ssh\r\n");
            }
        });
        assert_eq!(SshVerifier::new(port).verify("nobody", "secret"), Verdict::Unavailable);
        server.join().unwrap();
    }
}
