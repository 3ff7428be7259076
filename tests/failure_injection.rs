//! Failure injection: refused handshakes, refused peers, broken streams.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use peer_transport::codec::LengthPrefixedDecoder;
use peer_transport::{Transport, TransportEvent};

mod common;
use common::*;

#[tokio::test]
async fn failed_handshake_delivers_nothing_and_closes() {
    let on_peer = Arc::new(CountingOnPeer::default());
    let (transport, addr) = start_transport(
        opts().with_handshake(Arc::new(RejectAll)).with_on_peer(on_peer.clone()),
    )
    .await;
    let inbound = transport.consume();
    let mut events = transport.events();

    let mut client = TcpStream::connect(addr).await.unwrap();
    let client_addr = client.local_addr().unwrap();
    // Frames written before the rejection lands must not leak through
    let _ = client.write_all(&peer_transport::codec::encode_frame(b"sneaky").unwrap()).await;

    let event = wait_for_event(&mut events, |e| matches!(e, TransportEvent::HandshakeFailed { .. })).await;
    assert!(matches!(event, TransportEvent::HandshakeFailed { peer_addr, .. } if peer_addr == client_addr));

    assert_closed_by_remote(&mut client).await;
    assert!(recv_within(&inbound, Duration::from_millis(200)).await.is_none());
    assert_eq!(on_peer.calls(), 0);
    transport.close().await.unwrap();
}

#[tokio::test]
async fn callback_runs_once_per_successful_handshake_only() {
    let on_peer = Arc::new(CountingOnPeer::default());
    let (transport, addr) = start_transport(
        opts()
            .with_handshake(Arc::new(Alternating::default()))
            .with_on_peer(on_peer.clone()),
    )
    .await;
    let mut events = transport.events();

    // Connect one at a time so the alternation is deterministic
    let mut clients = Vec::new();
    let mut failures = 0;
    let mut ready = 0;
    for _ in 0..6 {
        clients.push(TcpStream::connect(addr).await.unwrap());
        match wait_for_event(&mut events, |e| {
            matches!(e, TransportEvent::HandshakeFailed { .. } | TransportEvent::PeerReady { .. })
        })
        .await
        {
            TransportEvent::HandshakeFailed { .. } => failures += 1,
            _ => ready += 1,
        }
    }

    assert_eq!((ready, failures), (3, 3));
    assert_eq!(on_peer.calls(), 3);
    transport.close().await.unwrap();
}

#[tokio::test]
async fn rejected_peer_never_reaches_the_channel() {
    let on_peer = Arc::new(CountingOnPeer::rejecting());
    let (transport, addr) = start_transport(opts().with_on_peer(on_peer.clone())).await;
    let inbound = transport.consume();
    let mut events = transport.events();

    let mut client = TcpStream::connect(addr).await.unwrap();
    let _ = client.write_all(&peer_transport::codec::encode_frame(b"ignored").unwrap()).await;

    wait_for_event(&mut events, |e| matches!(e, TransportEvent::PeerRejected { .. })).await;
    assert_closed_by_remote(&mut client).await;

    assert!(recv_within(&inbound, Duration::from_millis(200)).await.is_none());
    assert_eq!(on_peer.calls(), 1);
    transport.close().await.unwrap();
}

#[tokio::test]
async fn plain_function_handshake_is_accepted() {
    fn refuse(_peer: &dyn peer_transport::Peer) -> Result<(), peer_transport::HandshakeError> {
        Err(peer_transport::HandshakeError::Rejected("function says no".into()))
    }

    let (transport, addr) = start_transport(opts().with_handshake(Arc::new(refuse))).await;
    let mut events = transport.events();

    let mut client = TcpStream::connect(addr).await.unwrap();
    let event = wait_for_event(&mut events, |e| matches!(e, TransportEvent::HandshakeFailed { .. })).await;

    assert!(matches!(event, TransportEvent::HandshakeFailed { error, .. } if error.contains("function says no")));
    assert_closed_by_remote(&mut client).await;
    transport.close().await.unwrap();
}

#[tokio::test]
async fn decode_error_is_isolated_to_its_connection() {
    let (transport, addr) =
        start_transport(opts().with_decoder(Arc::new(LengthPrefixedDecoder::new(16)))).await;
    let inbound = transport.consume();
    let mut events = transport.events();

    let mut healthy = TcpStream::connect(addr).await.unwrap();
    let mut broken = TcpStream::connect(addr).await.unwrap();
    let broken_addr = broken.local_addr().unwrap();

    send_frames(&mut healthy, &[b"before"]).await;
    assert_eq!(recv_within(&inbound, WAIT).await.unwrap().payload, b"before");

    // Oversized frame trips the decoder's limit
    send_frames(&mut broken, &[&[0u8; 64]]).await;
    let event = wait_for_event(&mut events, |e| matches!(e, TransportEvent::DecodeFailed { .. })).await;
    assert!(matches!(event, TransportEvent::DecodeFailed { peer_addr, .. } if peer_addr == broken_addr));
    assert_closed_by_remote(&mut broken).await;

    send_frames(&mut healthy, &[b"after"]).await;
    assert_eq!(recv_within(&inbound, WAIT).await.unwrap().payload, b"after");

    // The accept loop is still serving new connections
    let mut late = TcpStream::connect(addr).await.unwrap();
    send_frames(&mut late, &[b"late"]).await;
    let rpc = recv_within(&inbound, WAIT).await.unwrap();
    assert_eq!(rpc.payload, b"late");
    assert_eq!(rpc.from, late.local_addr().unwrap());

    transport.close().await.unwrap();
}

#[tokio::test]
async fn truncated_stream_closes_without_a_partial_message() {
    let (transport, addr) = start_transport(opts()).await;
    let inbound = transport.consume();
    let mut events = transport.events();

    let mut client = TcpStream::connect(addr).await.unwrap();
    let frame = peer_transport::codec::encode_frame(b"complete message").unwrap();
    client.write_all(&frame[..frame.len() - 3]).await.unwrap();
    drop(client);

    wait_for_event(&mut events, |e| matches!(e, TransportEvent::ConnectionClosed { .. })).await;
    assert!(recv_within(&inbound, Duration::from_millis(200)).await.is_none());
    transport.close().await.unwrap();
}

#[tokio::test]
async fn handshake_reads_a_token_before_decoding() {
    let (transport, addr) = start_transport(opts().with_handshake(Arc::new(ExpectToken(b"OPEN")))).await;
    let inbound = transport.consume();
    let mut events = transport.events();

    let mut good = TcpStream::connect(addr).await.unwrap();
    let good_addr = good.local_addr().unwrap();
    good.write_all(b"OPEN").await.unwrap();
    send_frames(&mut good, &[b"first"]).await;

    // Token bytes are consumed by the handshake, the decoder starts at the frame
    let rpc = recv_within(&inbound, WAIT).await.expect("message after token");
    assert_eq!(rpc.from, good_addr);
    assert_eq!(rpc.payload, b"first");

    let mut bad = TcpStream::connect(addr).await.unwrap();
    let bad_addr = bad.local_addr().unwrap();
    bad.write_all(b"NOPE").await.unwrap();
    let _ = bad.write_all(&peer_transport::codec::encode_frame(b"smuggled").unwrap()).await;

    let event = wait_for_event(&mut events, |e| matches!(e, TransportEvent::HandshakeFailed { .. })).await;
    assert!(matches!(event, TransportEvent::HandshakeFailed { peer_addr, .. } if peer_addr == bad_addr));
    assert_closed_by_remote(&mut bad).await;
    assert!(recv_within(&inbound, Duration::from_millis(200)).await.is_none());
    transport.close().await.unwrap();
}

#[tokio::test]
async fn local_close_ends_a_connection_parked_on_a_full_channel() {
    let keep = Arc::new(KeepPeers::default());
    let (transport, addr) = start_transport(opts().with_on_peer(keep.clone())).await;
    let inbound = transport.consume();
    let mut events = transport.events();

    // Nobody consumes: the first frame fills the channel, the second parks the send
    let mut client = TcpStream::connect(addr).await.unwrap();
    send_frames(&mut client, &[b"a", b"b", b"c"]).await;
    let peer = keep.wait_for_first().await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(transport.active_connections(), 1);

    peer.close().await.unwrap();

    wait_for_event(&mut events, |e| matches!(e, TransportEvent::ConnectionClosed { .. })).await;
    assert_eq!(transport.active_connections(), 0);
    assert_closed_by_remote(&mut client).await;

    // Only the message already sitting in the channel survives the close
    let buffered = recv_within(&inbound, Duration::from_millis(200)).await.expect("buffered message");
    assert_eq!(buffered.payload, b"a");
    assert!(recv_within(&inbound, Duration::from_millis(200)).await.is_none());
    transport.close().await.unwrap();
}
