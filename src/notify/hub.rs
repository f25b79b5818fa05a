use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::oneshot;
use tracing::{debug, info, instrument, warn};

use super::events::{Audience, Event};
use crate::domain::Identity;

pub type SessionId = u64;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum NotifyError {
    #[error("Unknown session: {0}")]
    UnknownSession(SessionId),
    #[error("Session is not allowed to join the administrators group")]
    NotAdmin,
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

type HubResponse<T> = oneshot::Sender<Result<T, NotifyError>>;

#[derive(Debug)]
pub enum HubRequest {
    Connect {
        identity: Option<Identity>,
        respond_to: HubResponse<Subscription>,
    },
    JoinAdmin {
        session: SessionId,
        respond_to: HubResponse<()>,
    },
    WatchOrder {
        session: SessionId,
        order_id: String,
        respond_to: HubResponse<()>,
    },
    Leave {
        session: SessionId,
    },
    Publish {
        audience: Audience,
        event: Event,
        respond_to: HubResponse<usize>,
    },
    SessionCount {
        respond_to: HubResponse<usize>,
    },
}

/// Receiving end handed to a newly connected session.
#[derive(Debug)]
pub struct Subscription {
    pub session: SessionId,
    pub events: mpsc::Receiver<Event>,
}

struct SessionEntry {
    identity: Option<Identity>,
    admin: bool,
    watching: HashSet<String>,
    sender: mpsc::Sender<Event>,
}

impl SessionEntry {
    fn addressed_by(&self, audience: &Audience) -> bool {
        match audience {
            Audience::Admins => self.admin,
            Audience::Order { order_id, customer_id } => {
                self.watching.contains(order_id)
                    || self.identity.as_ref().is_some_and(|i| &i.user_id == customer_id)
            }
        }
    }
}

/// Owns the registry of connected sessions. Only this task touches it, so
/// concurrent connect/join/leave/publish calls never race.
pub struct NotificationHub {
    receiver: mpsc::Receiver<HubRequest>,
    sessions: HashMap<SessionId, SessionEntry>,
    next_session: SessionId,
    session_capacity: usize,
}

impl NotificationHub {
    pub fn new(buffer_size: usize, session_capacity: usize) -> (Self, NotificationClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let hub = Self {
            receiver,
            sessions: HashMap::new(),
            next_session: 1,
            session_capacity: session_capacity.max(1),
        };
        (hub, NotificationClient::new(sender))
    }

    #[instrument(name = "notification_hub", skip(self))]
    pub async fn run(mut self) {
        info!("NotificationHub starting");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                HubRequest::Connect { identity, respond_to } => {
                    let _ = respond_to.send(Ok(self.handle_connect(identity)));
                }
                HubRequest::JoinAdmin { session, respond_to } => {
                    let _ = respond_to.send(self.handle_join_admin(session));
                }
                HubRequest::WatchOrder { session, order_id, respond_to } => {
                    let _ = respond_to.send(self.handle_watch_order(session, order_id));
                }
                HubRequest::Leave { session } => {
                    if self.sessions.remove(&session).is_some() {
                        debug!(session, "Session left");
                    }
                }
                HubRequest::Publish { audience, event, respond_to } => {
                    let _ = respond_to.send(Ok(self.handle_publish(&audience, event)));
                }
                HubRequest::SessionCount { respond_to } => {
                    let _ = respond_to.send(Ok(self.sessions.len()));
                }
            }
        }

        info!("NotificationHub stopped");
    }

    fn handle_connect(&mut self, identity: Option<Identity>) -> Subscription {
        let session = self.next_session;
        self.next_session += 1;
        let (sender, events) = mpsc::channel(self.session_capacity);
        debug!(session, user_id = ?identity.as_ref().map(|i| i.user_id.as_str()), "Session connected");
        self.sessions.insert(
            session,
            SessionEntry { identity, admin: false, watching: HashSet::new(), sender },
        );
        Subscription { session, events }
    }

    #[instrument(skip(self))]
    fn handle_join_admin(&mut self, session: SessionId) -> Result<(), NotifyError> {
        let entry = self
            .sessions
            .get_mut(&session)
            .ok_or(NotifyError::UnknownSession(session))?;
        if !entry.identity.as_ref().is_some_and(Identity::is_admin) {
            warn!("Non-admin session tried to join the administrators group");
            return Err(NotifyError::NotAdmin);
        }
        entry.admin = true;
        info!("Session joined administrators group");
        Ok(())
    }

    #[instrument(skip(self))]
    fn handle_watch_order(&mut self, session: SessionId, order_id: String) -> Result<(), NotifyError> {
        let entry = self
            .sessions
            .get_mut(&session)
            .ok_or(NotifyError::UnknownSession(session))?;
        entry.watching.insert(order_id);
        debug!("Session watching order");
        Ok(())
    }

    /// Pushes the event to every addressed session without waiting. Returns how
    /// many queues accepted it.
    #[instrument(skip(self, event), fields(event = %event.event))]
    fn handle_publish(&mut self, audience: &Audience, event: Event) -> usize {
        let mut delivered = 0;
        let mut closed = Vec::new();

        for (id, entry) in self.sessions.iter().filter(|(_, e)| e.addressed_by(audience)) {
            match entry.sender.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => warn!(session = *id, "Session queue full, event dropped"),
                Err(TrySendError::Closed(_)) => closed.push(*id),
            }
        }

        for id in closed {
            self.sessions.remove(&id);
            debug!(session = id, "Dropped disconnected session");
        }

        debug!(delivered, "Event published");
        delivered
    }
}

/// Handle to the hub. Cheap to clone.
#[derive(Clone)]
pub struct NotificationClient {
    sender: mpsc::Sender<HubRequest>,
}

impl NotificationClient {
    pub fn new(sender: mpsc::Sender<HubRequest>) -> Self {
        Self { sender }
    }

    /// Fire-and-forget: no response is awaited.
    #[instrument(skip(self))]
    pub async fn leave(&self, session: SessionId) {
        debug!("Sending leave request");
        let _ = self.sender.send(HubRequest::Leave { session }).await;
    }

    #[instrument(skip(self, event), fields(event = %event.event))]
    pub async fn publish(&self, audience: Audience, event: Event) -> Result<usize, NotifyError> {
        debug!("Sending request");
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(HubRequest::Publish { audience, event, respond_to })
            .await
            .map_err(|_| NotifyError::ActorCommunicationError("Actor closed".to_string()))?;
        response
            .await
            .map_err(|_| NotifyError::ActorCommunicationError("Actor dropped".to_string()))?
    }
}

crate::client_method!(NotificationClient => fn connect(identity: Option<Identity>) -> Subscription as HubRequest::Connect, Error = NotifyError);
crate::client_method!(NotificationClient => fn join_admin(session: SessionId) -> () as HubRequest::JoinAdmin, Error = NotifyError);
crate::client_method!(NotificationClient => fn watch_order(session: SessionId, order_id: String) -> () as HubRequest::WatchOrder, Error = NotifyError);
crate::client_method!(NotificationClient => fn session_count() -> usize as HubRequest::SessionCount, Error = NotifyError);
