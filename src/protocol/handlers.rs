//! Message handlers for the relay.
//!
//! Interprets each inbound payload on a connection: `join` requests go to the
//! session registry, everything else is forwarded verbatim to the sender's
//! session peers. Bad input is dropped; nothing here closes a connection.

use log::{debug, info};

use crate::client::ClientHandle;
use crate::error::{ProtocolError, SessionError};
use crate::protocol::{ClientMessage, ServerMessage, parse_message};
use crate::session::{SessionCode, SharedRegistry};

/// Why a payload produced no effect.
#[derive(Debug)]
pub enum DropReason {
    Invalid(ProtocolError),
    NoPeers,
}

/// Result of routing one inbound payload.
#[derive(Debug)]
pub enum RouteOutcome {
    Joined { code: SessionCode, players: usize },
    Rejected(SessionError),
    Relayed { delivered: usize },
    Dropped(DropReason),
}

/// Routes a single inbound payload from `client`.
pub async fn handle_message(
    registry: &SharedRegistry,
    client: &ClientHandle,
    raw: &str,
) -> RouteOutcome {
    let message = match parse_message(raw) {
        Ok(message) => message,
        Err(e) => {
            debug!("Dropping payload from {}: {}", client.addr(), e);
            return RouteOutcome::Dropped(DropReason::Invalid(e));
        }
    };

    match message {
        ClientMessage::Join { code } => handle_join(registry, client, &code).await,
        ClientMessage::Relay(payload) => handle_relay(registry, client, payload).await,
    }
}

async fn handle_join(registry: &SharedRegistry, client: &ClientHandle, code: &str) -> RouteOutcome {
    let result = registry.lock().await.join(code, client);

    match result {
        Ok(joined) => RouteOutcome::Joined {
            code: joined.code,
            players: joined.players,
        },
        Err(e) => {
            info!("Join rejected for {}: {}", client.addr(), e);
            if let Err(send_err) = client.send(&ServerMessage::error(e.client_message())) {
                debug!("Join rejection not delivered: {}", send_err);
            }
            RouteOutcome::Rejected(e)
        }
    }
}

async fn handle_relay(registry: &SharedRegistry, client: &ClientHandle, payload: &str) -> RouteOutcome {
    let peers = registry.lock().await.peers_of(client.id());
    if peers.is_empty() {
        debug!("No peers for {}; dropping payload", client.addr());
        return RouteOutcome::Dropped(DropReason::NoPeers);
    }

    let mut delivered = 0;
    for peer in peers.iter().filter(|peer| peer.is_open()) {
        match peer.send_text(payload) {
            Ok(()) => delivered += 1,
            Err(e) => debug!("Skipping relay target: {}", e),
        }
    }

    RouteOutcome::Relayed { delivered }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionRegistry;
    use std::net::SocketAddr;
    use tokio::sync::mpsc::Receiver;

    fn client() -> (ClientHandle, Receiver<String>) {
        client_with_capacity(16)
    }

    fn client_with_capacity(capacity: usize) -> (ClientHandle, Receiver<String>) {
        let addr: SocketAddr = "127.0.0.1:60000".parse().unwrap();
        ClientHandle::channel(addr, capacity)
    }

    fn join_payload(code: &str) -> String {
        format!(r#"{{"type":"join","code":"{code}"}}"#)
    }

    #[tokio::test]
    async fn test_join_replies_with_player_count() {
        let registry = SessionRegistry::shared();
        let (a, mut rx_a) = client();
        let (b, mut rx_b) = client();

        let outcome = handle_message(&registry, &a, &join_payload("123456")).await;
        assert!(matches!(outcome, RouteOutcome::Joined { players: 1, .. }));
        assert_eq!(
            rx_a.try_recv().unwrap(),
            r#"{"type":"joined","code":"123456","players":1}"#
        );

        handle_message(&registry, &b, &join_payload("123456")).await;
        assert_eq!(
            rx_b.try_recv().unwrap(),
            r#"{"type":"joined","code":"123456","players":2}"#
        );
        assert_eq!(rx_a.try_recv().unwrap(), r#"{"type":"peer_joined"}"#);
    }

    #[tokio::test]
    async fn test_join_with_numeric_and_padded_code() {
        let registry = SessionRegistry::shared();
        let (a, mut rx_a) = client();

        handle_message(&registry, &a, r#"{"type":"join","code":123456}"#).await;
        assert_eq!(
            rx_a.try_recv().unwrap(),
            r#"{"type":"joined","code":"123456","players":1}"#
        );

        let (b, mut rx_b) = client();
        handle_message(&registry, &b, &join_payload("  123456\t")).await;
        assert_eq!(
            rx_b.try_recv().unwrap(),
            r#"{"type":"joined","code":"123456","players":2}"#
        );
    }

    #[tokio::test]
    async fn test_join_errors() {
        let registry = SessionRegistry::shared();
        let (a, mut rx_a) = client();
        let (b, _rx_b) = client();
        let (c, mut rx_c) = client();

        let outcome = handle_message(&registry, &a, &join_payload("12ab56")).await;
        assert!(matches!(
            outcome,
            RouteOutcome::Rejected(SessionError::InvalidCode(_))
        ));
        assert_eq!(
            rx_a.try_recv().unwrap(),
            r#"{"type":"error","message":"Invalid code"}"#
        );

        handle_message(&registry, &a, &join_payload("222222")).await;
        handle_message(&registry, &b, &join_payload("222222")).await;
        let outcome = handle_message(&registry, &c, &join_payload("222222")).await;
        assert!(matches!(
            outcome,
            RouteOutcome::Rejected(SessionError::SessionFull(_))
        ));
        assert_eq!(
            rx_c.try_recv().unwrap(),
            r#"{"type":"error","message":"Lobby full"}"#
        );
    }

    #[tokio::test]
    async fn test_relay_is_verbatim_and_not_echoed() {
        let registry = SessionRegistry::shared();
        let (a, mut rx_a) = client();
        let (b, mut rx_b) = client();
        handle_message(&registry, &a, &join_payload("333333")).await;
        handle_message(&registry, &b, &join_payload("333333")).await;
        while rx_a.try_recv().is_ok() {}
        while rx_b.try_recv().is_ok() {}

        let payload = r#"{"type":"move","x":1}"#;
        let outcome = handle_message(&registry, &a, payload).await;
        assert!(matches!(outcome, RouteOutcome::Relayed { delivered: 1 }));
        assert_eq!(rx_b.try_recv().unwrap(), payload);
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_relay_without_peers_is_dropped() {
        let registry = SessionRegistry::shared();
        let (a, mut rx_a) = client();

        let outcome = handle_message(&registry, &a, r#"{"type":"move"}"#).await;
        assert!(matches!(outcome, RouteOutcome::Dropped(DropReason::NoPeers)));

        handle_message(&registry, &a, &join_payload("444444")).await;
        rx_a.try_recv().unwrap();
        let outcome = handle_message(&registry, &a, r#"{"type":"move"}"#).await;
        assert!(matches!(outcome, RouteOutcome::Dropped(DropReason::NoPeers)));
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_relay_to_closed_peer_is_skipped() {
        let registry = SessionRegistry::shared();
        let (a, mut rx_a) = client();
        let (b, rx_b) = client();
        handle_message(&registry, &a, &join_payload("555555")).await;
        handle_message(&registry, &b, &join_payload("555555")).await;
        while rx_a.try_recv().is_ok() {}
        drop(rx_b);

        let outcome = handle_message(&registry, &a, r#"{"type":"move"}"#).await;
        assert!(matches!(outcome, RouteOutcome::Relayed { delivered: 0 }));
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_malformed_payload_has_no_effect() {
        let registry = SessionRegistry::shared();
        let (a, mut rx_a) = client();
        let (b, mut rx_b) = client();
        handle_message(&registry, &a, &join_payload("666666")).await;
        handle_message(&registry, &b, &join_payload("666666")).await;
        while rx_a.try_recv().is_ok() {}

        for raw in ["{not json", "", "null"] {
            let outcome = handle_message(&registry, &a, raw).await;
            assert!(matches!(outcome, RouteOutcome::Dropped(DropReason::Invalid(_))));
        }
        assert!(rx_a.try_recv().is_err());
        // Only the join confirmation reached b.
        assert_eq!(rx_b.try_recv().unwrap(), r#"{"type":"joined","code":"666666","players":2}"#);
        assert!(rx_b.try_recv().is_err());
        assert_eq!(registry.lock().await.member_count("666666"), 2);
    }

    #[tokio::test]
    async fn test_non_object_json_is_relayed() {
        let registry = SessionRegistry::shared();
        let (a, mut rx_a) = client();
        let (b, mut rx_b) = client();
        handle_message(&registry, &a, &join_payload("777777")).await;
        handle_message(&registry, &b, &join_payload("777777")).await;
        while rx_a.try_recv().is_ok() {}
        while rx_b.try_recv().is_ok() {}

        for raw in ["[1,2]", "42", "\"hi\""] {
            let outcome = handle_message(&registry, &a, raw).await;
            assert!(matches!(outcome, RouteOutcome::Relayed { delivered: 1 }));
            assert_eq!(rx_b.try_recv().unwrap(), raw);
        }
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_relay_to_full_queue_is_skipped() {
        let registry = SessionRegistry::shared();
        let (a, mut rx_a) = client();
        let (b, mut rx_b) = client_with_capacity(2);
        handle_message(&registry, &a, &join_payload("888888")).await;
        handle_message(&registry, &b, &join_payload("888888")).await;
        while rx_a.try_recv().is_ok() {}

        // b's queue already holds its confirmation; one more frame fits.
        let first = handle_message(&registry, &a, r#"{"n":1}"#).await;
        assert!(matches!(first, RouteOutcome::Relayed { delivered: 1 }));
        let second = handle_message(&registry, &a, r#"{"n":2}"#).await;
        assert!(matches!(second, RouteOutcome::Relayed { delivered: 0 }));

        assert_eq!(rx_b.try_recv().unwrap(), r#"{"type":"joined","code":"888888","players":2}"#);
        assert_eq!(rx_b.try_recv().unwrap(), r#"{"n":1}"#);
        assert!(rx_b.try_recv().is_err());
        assert_eq!(registry.lock().await.member_count("888888"), 2);
    }
}
