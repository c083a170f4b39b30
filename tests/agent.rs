use anyhow::Result;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, UdpSocket},
    time::{Duration, Instant},
};

use stun_agent::{
    create_agent, decode_message, encode_message, transaction_id, AgentConfig, AgentError,
    AttrValue, AttributeType, Class, Method, Protocol, Server, TcpAgent, TcpConfig, UdpAgent,
    UdpConfig,
};

fn binding_request() -> Vec<u8> {
    encode_message(Class::Request, Method::Binding, &transaction_id(), &[])
        .unwrap()
        .to_vec()
}

#[tokio::test]
async fn udp_request_against_server() -> Result<()> {
    let server = Server::bind("127.0.0.1:0".parse()?).await?;
    let dest = server.local_addr()?;
    tokio::spawn(async move { server.run().await });

    let mut agent = UdpAgent::bind(UdpConfig::new(dest)).await?;
    let local = agent.local_addr()?;

    let response = agent.request(&binding_request()).await?;
    let message = decode_message(&response)?;
    assert_eq!(message.header.class, Class::SuccessResponse);

    // the agent binds a wildcard address, so the reflexive address is
    // the loopback source the server observed, on the agent's port.
    match message.get(AttributeType::XorMappedAddress) {
        Some(AttrValue::XorMappedAddress(reflexive)) => {
            assert!(reflexive.ip().is_loopback());
            assert_eq!(reflexive.port(), local.port());
        }
        other => panic!("unexpected reflexive address: {:?}", other),
    }

    Ok(())
}

#[tokio::test]
async fn udp_request_times_out() -> Result<()> {
    // a responder that keeps its port open but never answers, so the
    // transaction fails by exhaustion rather than a socket error.
    let silent = UdpSocket::bind("127.0.0.1:0").await?;
    let dest = silent.local_addr()?;

    let mut config = UdpConfig::new(dest);
    config.initial_timeout = Duration::from_millis(10);
    config.max_retransmits = 2;
    config.timeout_multiplier = 2;

    let mut agent = UdpAgent::bind(config).await?;
    let started = Instant::now();
    let result = agent.request(&binding_request()).await;

    assert!(matches!(result, Err(AgentError::Timeout)));

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(20));
    assert!(elapsed < Duration::from_secs(1));

    Ok(())
}

#[tokio::test]
async fn udp_rejects_garbage_response() -> Result<()> {
    let responder = UdpSocket::bind("127.0.0.1:0").await?;
    let dest = responder.local_addr()?;

    tokio::spawn(async move {
        let mut buf = vec![0u8; 4096];
        let (_, source) = responder.recv_from(&mut buf).await.unwrap();
        responder.send_to(b"not a stun message at all!!!", source).await.unwrap();
    });

    let mut agent = UdpAgent::bind(UdpConfig::new(dest)).await?;
    let result = agent.request(&binding_request()).await;

    assert!(matches!(result, Err(AgentError::Codec(_))));
    Ok(())
}

#[tokio::test]
async fn udp_indication_completes() -> Result<()> {
    let sink = UdpSocket::bind("127.0.0.1:0").await?;
    let agent = UdpAgent::bind(UdpConfig::new(sink.local_addr()?)).await?;

    agent.indicate(&binding_request()).await?;

    let mut buf = vec![0u8; 4096];
    let (size, _) = sink.recv_from(&mut buf).await?;
    assert!(decode_message(&buf[..size]).is_ok());

    Ok(())
}

#[tokio::test]
async fn tcp_request_against_responder() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let dest = listener.local_addr()?;

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();

        let mut buf = vec![0u8; 4096];
        let size = stream.read(&mut buf).await.unwrap();
        let request = decode_message(&buf[..size]).unwrap();

        let response = encode_message(
            Class::SuccessResponse,
            Method::Binding,
            &request.header.transaction_id,
            &[],
        )
        .unwrap();

        stream.write_all(&response).await.unwrap();
    });

    let mut agent = create_agent(Protocol::Tcp, AgentConfig::Tcp(TcpConfig::new(dest))).await?;
    let response = agent.request(&binding_request()).await?;

    let message = decode_message(&response)?;
    assert_eq!(message.header.class, Class::SuccessResponse);

    Ok(())
}

#[tokio::test]
async fn tcp_indication_half_closes() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let dest = listener.local_addr()?;

    let accepted = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();

        // collects until the peer's write side reaches EOF.
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        buf
    });

    let agent = TcpAgent::new(TcpConfig::new(dest));
    agent.indicate(&binding_request()).await?;

    let received = accepted.await?;
    let message = decode_message(&received)?;
    assert_eq!(message.header.class, Class::Request);

    Ok(())
}

#[tokio::test]
async fn tcp_request_times_out() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let dest = listener.local_addr()?;

    // accept and hold the connection without ever answering.
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        drop(stream);
    });

    let mut config = TcpConfig::new(dest);
    config.transaction_timeout = Duration::from_millis(50);

    let mut agent = create_agent(Protocol::Tcp, AgentConfig::Tcp(config)).await?;
    let result = agent.request(&binding_request()).await;

    assert!(matches!(result, Err(AgentError::Timeout)));
    Ok(())
}

#[tokio::test]
async fn create_agent_rejects_mismatched_config() -> Result<()> {
    let dest = "127.0.0.1:3478".parse()?;
    let result = create_agent(Protocol::Udp, AgentConfig::Tcp(TcpConfig::new(dest))).await;

    assert!(matches!(result, Err(AgentError::Config(_))));
    Ok(())
}
