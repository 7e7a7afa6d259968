//! Syslog sink for the tracing fmt layer.
//!
//! Every formatted event becomes one RFC 3164 style frame:
//!
//! ```text
//! <PRI>netplugin[PID]: MESSAGE
//! ```
//!
//! Facility is always `user`; severity follows the event level. TCP frames
//! are newline terminated.

// Local crates
use crate::{error::ConfigurationError, options::SyslogTarget};

// External crates
use std::io::{self, Write};
use std::net::{TcpStream, ToSocketAddrs, UdpSocket};
use std::os::unix::net::UnixDatagram;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;

/// Local daemon sockets, tried in order.
const LOCAL_SOCKETS: [&str; 3] = ["/dev/log", "/var/run/syslog", "/var/run/log"];
const DEFAULT_PORT: u16 = 514;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const TAG: &str = "netplugin";
/// `user` facility
const FACILITY: u8 = 1;

#[derive(Debug)]
enum Transport {
    Unix(UnixDatagram),
    Udp(UdpSocket),
    Tcp(TcpStream),
}

impl Transport {
    fn connect(target: &SyslogTarget) -> io::Result<Self> {
        match target {
            SyslogTarget::Kernel => connect_local().map(Self::Unix),
            SyslogTarget::Udp(addr) => {
                let sock = UdpSocket::bind("0.0.0.0:0")?;
                sock.connect(with_default_port(addr))?;
                Ok(Self::Udp(sock))
            }
            SyslogTarget::Tcp(addr) => connect_tcp(&with_default_port(addr)).map(Self::Tcp),
        }
    }

    fn send(&mut self, frame: &[u8]) -> io::Result<()> {
        match self {
            Self::Unix(sock) => sock.send(frame).map(|_| ()),
            Self::Udp(sock) => sock.send(frame).map(|_| ()),
            Self::Tcp(stream) => stream.write_all(frame),
        }
    }

    fn newline_terminated(&self) -> bool {
        matches!(self, Self::Tcp(_))
    }
}

/// Connected syslog sink, cheap to clone.
///
/// A failed send rebuilds the connection from the original target and
/// retries the frame once. While the collector stays down, lines are
/// dropped.
#[derive(Debug, Clone)]
pub struct SyslogWriter {
    target: SyslogTarget,
    transport: Arc<Mutex<Transport>>,
    pid: u32,
}

fn with_default_port(addr: &str) -> String {
    if addr.contains(':') {
        addr.to_string()
    } else {
        format!("{addr}:{DEFAULT_PORT}")
    }
}

fn connect_local() -> io::Result<UnixDatagram> {
    let mut last_err = io::Error::new(io::ErrorKind::NotFound, "no local syslog socket");
    for path in LOCAL_SOCKETS {
        let sock = UnixDatagram::unbound()?;
        match sock.connect(path) {
            Ok(()) => return Ok(sock),
            Err(e) => last_err = e,
        }
    }
    Err(last_err)
}

fn connect_tcp(addr: &str) -> io::Result<TcpStream> {
    let mut last_err = io::Error::new(io::ErrorKind::NotFound, "syslog address did not resolve");
    for sock_addr in addr.to_socket_addrs()? {
        match TcpStream::connect_timeout(&sock_addr, CONNECT_TIMEOUT) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = e,
        }
    }
    Err(last_err)
}

impl SyslogWriter {
    /// Connect to the target. Failure is a configuration error: the
    /// operator asked for a sink that is not there.
    pub fn connect(target: &SyslogTarget) -> Result<Self, ConfigurationError> {
        let transport =
            Transport::connect(target).map_err(|source| ConfigurationError::SyslogUnavailable {
                target: target.to_string(),
                source,
            })?;

        Ok(Self {
            target: target.clone(),
            transport: Arc::new(Mutex::new(transport)),
            pid: std::process::id(),
        })
    }

    fn send(&self, severity: u8, message: &[u8]) {
        let Ok(mut transport) = self.transport.lock() else {
            return;
        };
        let frame = frame(severity, self.pid, message, transport.newline_terminated());
        if transport.send(&frame).is_ok() {
            return;
        }

        // Collector restarted or socket reset: reconnect and retry once.
        if let Ok(fresh) = Transport::connect(&self.target) {
            *transport = fresh;
            let _ = transport.send(&frame);
        }
    }
}

/// Syslog severity for a tracing level.
#[must_use]
pub fn severity(level: &Level) -> u8 {
    match *level {
        Level::ERROR => 3,
        Level::WARN => 4,
        Level::INFO => 6,
        _ => 7,
    }
}

/// Build one frame. Trailing newlines from the formatter are stripped.
#[must_use]
pub fn frame(severity: u8, pid: u32, message: &[u8], newline: bool) -> Vec<u8> {
    let mut end = message.len();
    while end > 0 && matches!(message[end - 1], b'\n' | b'\r') {
        end -= 1;
    }

    let pri = FACILITY * 8 + severity;
    let mut out = format!("<{pri}>{TAG}[{pid}]: ").into_bytes();
    out.extend_from_slice(&message[..end]);
    if newline {
        out.push(b'\n');
    }
    out
}

/// Buffers one formatted event and ships it when dropped.
#[derive(Debug)]
pub struct SyslogLine<'a> {
    sink: &'a SyslogWriter,
    severity: u8,
    buf: Vec<u8>,
}

impl Write for SyslogLine<'_> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for SyslogLine<'_> {
    fn drop(&mut self) {
        if !self.buf.is_empty() {
            self.sink.send(self.severity, &self.buf);
        }
    }
}

impl<'a> MakeWriter<'a> for SyslogWriter {
    type Writer = SyslogLine<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        SyslogLine {
            sink: self,
            severity: severity(&Level::INFO),
            buf: Vec::new(),
        }
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        SyslogLine {
            sink: self,
            severity: severity(meta.level()),
            buf: Vec::new(),
        }
    }
}
