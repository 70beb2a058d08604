//! Module `registry`
//!
//! Provides the central registry of live sessions. Each session pairs at most
//! [`SESSION_CAPACITY`] connection handles under one code; the registry also
//! keeps the reverse mapping from handle to the code it currently belongs to.
//!
//! Every mutation happens under one lock (see [`SharedRegistry`]), so the
//! capacity check and member insertion of a join are a single atomic step.

use log::{debug, info};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::client::{ClientHandle, ClientId};
use crate::error::SessionError;
use crate::protocol::ServerMessage;
use crate::session::SessionCode;

/// Maximum number of members in one session.
pub const SESSION_CAPACITY: usize = 2;

/// Registry shared between all connection tasks.
pub type SharedRegistry = Arc<Mutex<SessionRegistry>>;

/// Outcome of a successful join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinResult {
    pub code: SessionCode,
    pub players: usize,
}

/// Members of one session, keyed by handle identity.
#[derive(Default)]
struct Session {
    members: HashMap<ClientId, ClientHandle>,
}

impl Session {
    fn notify_all(&self, message: &ServerMessage) {
        for member in self.members.values().filter(|m| m.is_open()) {
            if let Err(e) = member.send(message) {
                debug!("Skipping notification to {}: {}", member.addr(), e);
            }
        }
    }
}

fn confirm(client: &ClientHandle, result: &JoinResult) {
    let reply = ServerMessage::Joined {
        code: result.code.to_string(),
        players: result.players,
    };
    if let Err(e) = client.send(&reply) {
        debug!("Join confirmation not delivered: {}", e);
    }
}

#[derive(Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionCode, Session>,
    memberships: HashMap<ClientId, SessionCode>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a fresh registry for sharing across connection tasks.
    pub fn shared() -> SharedRegistry {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Adds `client` to the session named by `code`, creating it if absent.
    ///
    /// The joiner is sent its `joined` confirmation before existing members are
    /// sent `peer_joined`, both under the registry lock. Rejections leave the
    /// registry untouched and send nothing. Joining the session the client
    /// already belongs to only repeats the confirmation; joining a different
    /// one first leaves the old session.
    pub fn join(&mut self, code: &str, client: &ClientHandle) -> Result<JoinResult, SessionError> {
        let code = SessionCode::parse(code)?;
        let id = client.id();

        if let Some(session) = self.sessions.get(&code) {
            if session.members.contains_key(&id) {
                let result = JoinResult {
                    players: session.members.len(),
                    code,
                };
                confirm(client, &result);
                return Ok(result);
            }
            if session.members.len() >= SESSION_CAPACITY {
                return Err(SessionError::SessionFull(code));
            }
        }

        if self.memberships.contains_key(&id) {
            self.leave(id);
        }

        let session = self.sessions.entry(code.clone()).or_default();
        let result = JoinResult {
            code: code.clone(),
            players: session.members.len() + 1,
        };
        confirm(client, &result);
        session.notify_all(&ServerMessage::PeerJoined);
        session.members.insert(id, client.clone());
        self.memberships.insert(id, code.clone());

        info!(
            "Client {} ({}) joined session {} ({}/{})",
            id,
            client.addr(),
            code,
            result.players,
            SESSION_CAPACITY
        );

        Ok(result)
    }

    /// Removes the client from its session, if any, and tells remaining
    /// members with `peer_left`. Empty sessions are dropped immediately.
    ///
    /// Returns the code that was left; repeated calls return `None`.
    pub fn leave(&mut self, id: ClientId) -> Option<SessionCode> {
        let code = self.memberships.remove(&id)?;
        let session = self.sessions.get_mut(&code)?;

        session.members.remove(&id);
        session.notify_all(&ServerMessage::PeerLeft);

        if session.members.is_empty() {
            self.sessions.remove(&code);
            info!("Client {} left session {}; session closed", id, code);
        } else {
            info!(
                "Client {} left session {} ({}/{})",
                id,
                code,
                session.members.len(),
                SESSION_CAPACITY
            );
        }

        Some(code)
    }

    /// Returns the other current members of the client's session.
    pub fn peers_of(&self, id: ClientId) -> Vec<ClientHandle> {
        self.memberships
            .get(&id)
            .and_then(|code| self.sessions.get(code))
            .map(|session| {
                session
                    .members
                    .iter()
                    .filter(|(member, _)| **member != id)
                    .map(|(_, handle)| handle.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Code of the session the client currently belongs to.
    pub fn session_of(&self, id: ClientId) -> Option<&SessionCode> {
        self.memberships.get(&id)
    }

    pub fn contains(&self, code: &str) -> bool {
        SessionCode::parse(code).is_ok_and(|code| self.sessions.contains_key(&code))
    }

    pub fn member_count(&self, code: &str) -> usize {
        SessionCode::parse(code)
            .ok()
            .and_then(|code| self.sessions.get(&code))
            .map_or(0, |session| session.members.len())
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}
