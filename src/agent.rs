use thiserror::Error;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpStream, UdpSocket},
    time::{sleep, timeout, Duration, Instant},
};

use std::net::SocketAddr;

use crate::{validate_envelope, StunError};

/// transaction failure.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("transaction timed out")]
    Timeout,
    #[error("invalid agent configuration: {0}")]
    Config(&'static str),
    #[error(transparent)]
    Codec(#[from] StunError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Udp,
    Tcp,
}

/// UDP transaction timing.
///
/// `initial_timeout` is the RTO, the delay before the first retransmit;
/// the delay before the n-th retransmit is the RTO scaled by n. The
/// transaction fails after `max_retransmits` sends, and never waits
/// longer in total than the RTO scaled by `timeout_multiplier`.
#[derive(Debug, Clone, Copy)]
pub struct UdpConfig {
    pub dest: SocketAddr,
    pub initial_timeout: Duration,
    pub max_retransmits: u32,
    pub timeout_multiplier: u32,
}

impl UdpConfig {
    pub fn new(dest: SocketAddr) -> Self {
        Self {
            dest,
            initial_timeout: Duration::from_millis(3000),
            max_retransmits: 7,
            timeout_multiplier: 16,
        }
    }
}

/// TCP transaction timing.
///
/// A single connection is opened per call; `transaction_timeout` bounds
/// the whole connect/write/read sequence of a request.
#[derive(Debug, Clone, Copy)]
pub struct TcpConfig {
    pub dest: SocketAddr,
    pub transaction_timeout: Duration,
}

impl TcpConfig {
    pub fn new(dest: SocketAddr) -> Self {
        Self {
            dest,
            transaction_timeout: Duration::from_millis(39500),
        }
    }
}

/// transport-specific agent configuration.
#[derive(Debug, Clone, Copy)]
pub enum AgentConfig {
    Udp(UdpConfig),
    Tcp(TcpConfig),
}

/// a UDP transaction agent.
///
/// One socket, bound to a wildcard address in the destination's family
/// and connected to the destination. The mutable borrow taken by
/// [`UdpAgent::request`] keeps a handle to one transaction at a time,
/// so any datagram arriving on the socket belongs to the transaction in
/// flight.
pub struct UdpAgent {
    socket: UdpSocket,
    config: UdpConfig,
}

impl UdpAgent {
    pub async fn bind(config: UdpConfig) -> Result<Self, AgentError> {
        let bind_addr: SocketAddr = if config.dest.is_ipv4() {
            "0.0.0.0:0".parse().unwrap()
        } else {
            "[::]:0".parse().unwrap()
        };

        let socket = UdpSocket::bind(bind_addr).await?;
        socket.connect(config.dest).await?;
        Ok(Self { socket, config })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, AgentError> {
        Ok(self.socket.local_addr()?)
    }

    /// send an indication: one datagram, no retransmission, no reply.
    pub async fn indicate(&self, bytes: &[u8]) -> Result<(), AgentError> {
        self.socket.send(bytes).await?;
        log::trace!("udp indication sent to {}", self.config.dest);
        Ok(())
    }

    /// run a request transaction.
    ///
    /// The encoded request is retransmitted with linearly growing
    /// delays until a datagram arrives, the send budget is exhausted or
    /// the total wait reaches the cap. The first datagram that passes
    /// envelope validation is the response.
    pub async fn request(&mut self, bytes: &[u8]) -> Result<Vec<u8>, AgentError> {
        let rto = self.config.initial_timeout;
        let cap = rto * self.config.timeout_multiplier;
        let started = Instant::now();

        let mut buf = vec![0u8; 4096];
        for n in 1..=self.config.max_retransmits {
            let remaining = match cap.checked_sub(started.elapsed()) {
                Some(it) if !it.is_zero() => it,
                _ => break,
            };

            self.socket.send(bytes).await?;
            log::trace!("udp request sent to {}, attempt {}", self.config.dest, n);

            let delay = std::cmp::min(rto * n, remaining);
            tokio::select! {
                ret = self.socket.recv(&mut buf) => {
                    let size = ret?;
                    log::trace!("udp response of {} bytes from {}", size, self.config.dest);

                    validate_envelope(&buf[..size])?;
                    buf.truncate(size);
                    return Ok(buf);
                }
                _ = sleep(delay) => {
                    log::trace!("udp request to {} not answered in {:?}", self.config.dest, delay);
                }
            }
        }

        Err(AgentError::Timeout)
    }
}

/// a TCP transaction agent.
///
/// Stateless between calls; every indication or request opens its own
/// connection.
pub struct TcpAgent {
    config: TcpConfig,
}

impl TcpAgent {
    pub fn new(config: TcpConfig) -> Self {
        Self { config }
    }

    /// send an indication: connect, write, half-close.
    pub async fn indicate(&self, bytes: &[u8]) -> Result<(), AgentError> {
        let mut stream = TcpStream::connect(self.config.dest).await?;
        stream.write_all(bytes).await?;
        stream.shutdown().await?;

        log::trace!("tcp indication sent to {}", self.config.dest);
        Ok(())
    }

    /// run a request transaction.
    ///
    /// Connect, write and the first read are bounded together by the
    /// transaction timeout.
    pub async fn request(&self, bytes: &[u8]) -> Result<Vec<u8>, AgentError> {
        let exchange = async {
            let mut stream = TcpStream::connect(self.config.dest).await?;
            stream.write_all(bytes).await?;
            log::trace!("tcp request sent to {}", self.config.dest);

            let mut buf = vec![0u8; 4096];
            let size = stream.read(&mut buf).await?;
            log::trace!("tcp response of {} bytes from {}", size, self.config.dest);

            validate_envelope(&buf[..size])?;
            buf.truncate(size);
            Ok(buf)
        };

        match timeout(self.config.transaction_timeout, exchange).await {
            Ok(ret) => ret,
            Err(_) => Err(AgentError::Timeout),
        }
    }
}

/// a transaction agent over either transport.
pub enum Agent {
    Udp(UdpAgent),
    Tcp(TcpAgent),
}

impl Agent {
    pub async fn indicate(&self, bytes: &[u8]) -> Result<(), AgentError> {
        match self {
            Self::Udp(agent) => agent.indicate(bytes).await,
            Self::Tcp(agent) => agent.indicate(bytes).await,
        }
    }

    pub async fn request(&mut self, bytes: &[u8]) -> Result<Vec<u8>, AgentError> {
        match self {
            Self::Udp(agent) => agent.request(bytes).await,
            Self::Tcp(agent) => agent.request(bytes).await,
        }
    }
}

/// create an agent for the given transport.
///
/// The configuration variant must match the protocol.
pub async fn create_agent(protocol: Protocol, config: AgentConfig) -> Result<Agent, AgentError> {
    match (protocol, config) {
        (Protocol::Udp, AgentConfig::Udp(config)) => Ok(Agent::Udp(UdpAgent::bind(config).await?)),
        (Protocol::Tcp, AgentConfig::Tcp(config)) => Ok(Agent::Tcp(TcpAgent::new(config))),
        _ => Err(AgentError::Config("protocol does not match configuration")),
    }
}
