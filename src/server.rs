use tokio::net::UdpSocket;

use std::net::SocketAddr;

use crate::{
    decode_message, encode_message,
    message::attributes::AttrSpec,
    message::header::{Class, Method},
    StunError,
};

/// a minimal UDP Binding server.
///
/// Answers every well-formed Binding request with a success response
/// carrying the observed source address in XOR-MAPPED-ADDRESS, echoing
/// the request's transaction id. Indications are dropped. A malformed
/// datagram fails its own exchange only.
pub struct Server {
    socket: UdpSocket,
}

impl Server {
    pub async fn bind(addr: SocketAddr) -> Result<Self, std::io::Error> {
        let socket = UdpSocket::bind(addr).await?;
        log::info!("stun server listening on {:?}", socket.local_addr());
        Ok(Self { socket })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.socket.local_addr()
    }

    /// serve forever.
    pub async fn run(&self) -> Result<(), std::io::Error> {
        let mut buf = vec![0u8; 4096];
        loop {
            let (size, source) = self.socket.recv_from(&mut buf).await?;
            log::trace!("received {} bytes from {:?}", size, source);

            match handle(&buf[..size], source) {
                Ok(Some(response)) => {
                    self.socket.send_to(&response, source).await?;
                }
                Ok(None) => (),
                Err(err) => {
                    log::warn!("failed to process datagram from {:?}: {}", source, err);
                }
            }
        }
    }
}

fn handle(bytes: &[u8], source: SocketAddr) -> Result<Option<Vec<u8>>, StunError> {
    let message = decode_message(bytes)?;
    if message.header.class != Class::Request {
        log::trace!("dropped non-request message from {:?}", source);
        return Ok(None);
    }

    let response = encode_message(
        Class::SuccessResponse,
        Method::Binding,
        &message.header.transaction_id,
        &[AttrSpec::XorMappedAddress(source)],
    )?;

    Ok(Some(response.to_vec()))
}
