use std::collections::HashMap;
use std::hash::Hash;
use std::fmt::{Debug, Display};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument, warn};

// =============================================================================
// 1. THE ABSTRACTION (Traits with Hooks, DTOs, and Actions)
// =============================================================================

/// Trait that any stored document must implement to be managed by ResourceActor
pub trait Entity: Clone + Send + Sync + 'static {
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug;
    type CreatePayload: Send + Sync + Debug;
    type Patch: Send + Sync + Debug;
    type Action: Send + Sync + Debug;
    type ActionResult: Send + Sync + Debug;
    type Error: std::error::Error + Clone + Send + Sync + 'static;

    /// Get the ID of the entity
    fn id(&self) -> &Self::Id;

    /// Construct the full Entity from the ID and Payload
    fn from_create(id: Self::Id, payload: Self::CreatePayload) -> Result<Self, Self::Error>;

    /// Key that must be unique across the collection (e.g. a normalized email).
    fn unique_key(&self) -> Option<String> {
        None
    }

    // --- Lifecycle Hooks ---

    fn on_create(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
    fn on_update(&mut self, patch: Self::Patch) -> Result<(), Self::Error>;
    fn on_delete(&self) -> Result<(), Self::Error> {
        Ok(())
    }

    // --- Action Handler ---

    /// Handle a custom domain-specific action
    fn handle_action(&mut self, action: Self::Action) -> Result<Self::ActionResult, Self::Error>;
}

/// Failures raised by the actor machinery itself, or by an entity hook.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FrameworkError<E> {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Duplicate key: {0}")]
    Duplicate(String),
    #[error("{0}")]
    Entity(E),
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped")]
    ActorDropped,
}

// =============================================================================
// 2. THE GENERIC MESSAGES
// =============================================================================

pub type Response<T, E> = oneshot::Sender<Result<T, FrameworkError<E>>>;

/// Predicate evaluated inside the actor for `List` requests.
pub type Filter<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

pub enum ResourceRequest<T: Entity> {
    Create {
        payload: T::CreatePayload,
        respond_to: Response<T, T::Error>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>, T::Error>,
    },
    List {
        filter: Option<Filter<T>>,
        respond_to: Response<Vec<T>, T::Error>,
    },
    Update {
        id: T::Id,
        patch: T::Patch,
        respond_to: Response<T, T::Error>,
    },
    Delete {
        id: T::Id,
        respond_to: Response<(), T::Error>,
    },
    Action {
        id: T::Id,
        action: T::Action,
        respond_to: Response<T::ActionResult, T::Error>,
    },
}

// =============================================================================
// 3. THE GENERIC ACTOR SERVER
// =============================================================================

/// Owns one collection. Every request is applied in mailbox order, so writes
/// to the same document are serialized and the last write wins.
pub struct ResourceActor<T: Entity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    store: HashMap<T::Id, T>,
    next_id_fn: Box<dyn Fn() -> T::Id + Send + Sync>,
}

impl<T: Entity> ResourceActor<T> {
    pub fn new(
        buffer_size: usize,
        next_id_fn: impl Fn() -> T::Id + Send + Sync + 'static,
    ) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            store: HashMap::new(),
            next_id_fn: Box::new(next_id_fn),
        };
        let client = ResourceClient { sender };
        (actor, client)
    }

    #[instrument(name = "resource_actor", skip(self), fields(entity = std::any::type_name::<T>()))]
    pub async fn run(mut self) {
        debug!("ResourceActor starting");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Create { payload, respond_to } => {
                    let _ = respond_to.send(self.handle_create(payload));
                }
                ResourceRequest::Get { id, respond_to } => {
                    let item = self.store.get(&id).cloned();
                    let _ = respond_to.send(Ok(item));
                }
                ResourceRequest::List { filter, respond_to } => {
                    let items = self
                        .store
                        .values()
                        .filter(|item| filter.as_ref().map_or(true, |f| f(item)))
                        .cloned()
                        .collect();
                    let _ = respond_to.send(Ok(items));
                }
                ResourceRequest::Update { id, patch, respond_to } => {
                    let _ = respond_to.send(self.handle_update(id, patch));
                }
                ResourceRequest::Delete { id, respond_to } => {
                    let _ = respond_to.send(self.handle_delete(id));
                }
                ResourceRequest::Action { id, action, respond_to } => {
                    let _ = respond_to.send(self.handle_action(id, action));
                }
            }
        }
        debug!("ResourceActor stopped");
    }

    fn handle_create(&mut self, payload: T::CreatePayload) -> Result<T, FrameworkError<T::Error>> {
        let id = (self.next_id_fn)();
        let mut item = T::from_create(id.clone(), payload).map_err(FrameworkError::Entity)?;
        item.on_create().map_err(FrameworkError::Entity)?;
        self.ensure_unique(&item)?;
        self.store.insert(id, item.clone());
        Ok(item)
    }

    // Hooks run against a copy so a failed hook leaves the stored document untouched.
    fn handle_update(&mut self, id: T::Id, patch: T::Patch) -> Result<T, FrameworkError<T::Error>> {
        let mut item = self
            .store
            .get(&id)
            .cloned()
            .ok_or_else(|| FrameworkError::NotFound(id.to_string()))?;
        item.on_update(patch).map_err(FrameworkError::Entity)?;
        self.ensure_unique(&item)?;
        self.store.insert(id, item.clone());
        Ok(item)
    }

    fn handle_delete(&mut self, id: T::Id) -> Result<(), FrameworkError<T::Error>> {
        let item = self
            .store
            .get(&id)
            .ok_or_else(|| FrameworkError::NotFound(id.to_string()))?;
        item.on_delete().map_err(FrameworkError::Entity)?;
        self.store.remove(&id);
        Ok(())
    }

    fn handle_action(
        &mut self,
        id: T::Id,
        action: T::Action,
    ) -> Result<T::ActionResult, FrameworkError<T::Error>> {
        let mut item = self
            .store
            .get(&id)
            .cloned()
            .ok_or_else(|| FrameworkError::NotFound(id.to_string()))?;
        let result = item.handle_action(action).map_err(FrameworkError::Entity)?;
        self.store.insert(id, item);
        Ok(result)
    }

    fn ensure_unique(&self, item: &T) -> Result<(), FrameworkError<T::Error>> {
        let Some(key) = item.unique_key() else {
            return Ok(());
        };
        let taken = self
            .store
            .values()
            .any(|other| other.id() != item.id() && other.unique_key().as_deref() == Some(key.as_str()));
        if taken {
            warn!(key = %key, "Rejected duplicate key");
            return Err(FrameworkError::Duplicate(key));
        }
        Ok(())
    }
}

// =============================================================================
// 4. THE GENERIC CLIENT
// =============================================================================

pub struct ResourceClient<T: Entity> {
    sender: mpsc::Sender<ResourceRequest<T>>,
}

// Derive would require `T: Clone` on the entity's associated types as well.
impl<T: Entity> Clone for ResourceClient<T> {
    fn clone(&self) -> Self {
        Self { sender: self.sender.clone() }
    }
}

impl<T: Entity> ResourceClient<T> {
    pub fn new(sender: mpsc::Sender<ResourceRequest<T>>) -> Self {
        Self { sender }
    }

    async fn request<R>(
        &self,
        build: impl FnOnce(Response<R, T::Error>) -> ResourceRequest<T>,
    ) -> Result<R, FrameworkError<T::Error>> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn create(&self, payload: T::CreatePayload) -> Result<T, FrameworkError<T::Error>> {
        self.request(|respond_to| ResourceRequest::Create { payload, respond_to }).await
    }

    pub async fn get(&self, id: T::Id) -> Result<Option<T>, FrameworkError<T::Error>> {
        self.request(|respond_to| ResourceRequest::Get { id, respond_to }).await
    }

    pub async fn list(&self) -> Result<Vec<T>, FrameworkError<T::Error>> {
        self.request(|respond_to| ResourceRequest::List { filter: None, respond_to }).await
    }

    pub async fn list_where(
        &self,
        filter: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Result<Vec<T>, FrameworkError<T::Error>> {
        let filter: Filter<T> = Box::new(filter);
        self.request(|respond_to| ResourceRequest::List { filter: Some(filter), respond_to })
            .await
    }

    pub async fn update(&self, id: T::Id, patch: T::Patch) -> Result<T, FrameworkError<T::Error>> {
        self.request(|respond_to| ResourceRequest::Update { id, patch, respond_to }).await
    }

    pub async fn delete(&self, id: T::Id) -> Result<(), FrameworkError<T::Error>> {
        self.request(|respond_to| ResourceRequest::Delete { id, respond_to }).await
    }

    pub async fn perform_action(
        &self,
        id: T::Id,
        action: T::Action,
    ) -> Result<T::ActionResult, FrameworkError<T::Error>> {
        self.request(|respond_to| ResourceRequest::Action { id, action, respond_to }).await
    }
}

// =============================================================================
// 5. EXAMPLE USAGE (Test)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    // --- Domain Definition ---

    #[derive(Clone, Debug, PartialEq)]
    struct Voucher {
        id: String,
        code: String,
        uses_left: u32,
    }

    #[derive(Debug)]
    struct VoucherCreate {
        code: String,
        uses: u32,
    }

    #[derive(Debug)]
    struct VoucherPatch {
        code: Option<String>,
    }

    #[derive(Debug)]
    enum VoucherAction {
        Redeem,
    }

    #[derive(Debug, Clone, PartialEq, Error)]
    enum VoucherError {
        #[error("voucher exhausted")]
        Exhausted,
        #[error("empty code")]
        EmptyCode,
    }

    impl Entity for Voucher {
        type Id = String;
        type CreatePayload = VoucherCreate;
        type Patch = VoucherPatch;
        type Action = VoucherAction;
        type ActionResult = u32;
        type Error = VoucherError;

        fn id(&self) -> &String {
            &self.id
        }

        fn from_create(id: String, payload: VoucherCreate) -> Result<Self, VoucherError> {
            if payload.code.is_empty() {
                return Err(VoucherError::EmptyCode);
            }
            Ok(Self { id, code: payload.code, uses_left: payload.uses })
        }

        fn unique_key(&self) -> Option<String> {
            Some(self.code.to_lowercase())
        }

        fn on_update(&mut self, patch: VoucherPatch) -> Result<(), VoucherError> {
            if let Some(code) = patch.code {
                self.code = code;
            }
            Ok(())
        }

        fn handle_action(&mut self, action: VoucherAction) -> Result<u32, VoucherError> {
            match action {
                VoucherAction::Redeem => {
                    if self.uses_left == 0 {
                        return Err(VoucherError::Exhausted);
                    }
                    self.uses_left -= 1;
                    Ok(self.uses_left)
                }
            }
        }
    }

    fn start() -> ResourceClient<Voucher> {
        let counter = Arc::new(AtomicU64::new(1));
        let next_id = move || format!("voucher_{}", counter.fetch_add(1, Ordering::SeqCst));
        let (actor, client) = ResourceActor::new(10, next_id);
        tokio::spawn(actor.run());
        client
    }

    // --- Test ---

    #[tokio::test]
    async fn test_resource_actor_with_actions() {
        let client = start();

        let created = client
            .create(VoucherCreate { code: "WELCOME".into(), uses: 1 })
            .await
            .unwrap();
        assert_eq!(created.id, "voucher_1");

        let left = client.perform_action(created.id.clone(), VoucherAction::Redeem).await.unwrap();
        assert_eq!(left, 0);

        let err = client
            .perform_action(created.id.clone(), VoucherAction::Redeem)
            .await
            .unwrap_err();
        assert_eq!(err, FrameworkError::Entity(VoucherError::Exhausted));

        let stored = client.get(created.id).await.unwrap().unwrap();
        assert_eq!(stored.uses_left, 0);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_unique_key() {
        let client = start();
        client.create(VoucherCreate { code: "Latte".into(), uses: 1 }).await.unwrap();

        let err = client
            .create(VoucherCreate { code: "LATTE".into(), uses: 3 })
            .await
            .unwrap_err();
        assert_eq!(err, FrameworkError::Duplicate("latte".into()));
        assert_eq!(client.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_rejected_by_unique_key_leaves_document() {
        let client = start();
        let a = client.create(VoucherCreate { code: "A".into(), uses: 1 }).await.unwrap();
        client.create(VoucherCreate { code: "B".into(), uses: 1 }).await.unwrap();

        let err = client
            .update(a.id.clone(), VoucherPatch { code: Some("b".into()) })
            .await
            .unwrap_err();
        assert!(matches!(err, FrameworkError::Duplicate(_)));
        assert_eq!(client.get(a.id).await.unwrap().unwrap().code, "A");
    }

    #[tokio::test]
    async fn test_list_where_filters_inside_actor() {
        let client = start();
        client.create(VoucherCreate { code: "ONE".into(), uses: 0 }).await.unwrap();
        client.create(VoucherCreate { code: "TWO".into(), uses: 5 }).await.unwrap();

        let usable = client.list_where(|v: &Voucher| v.uses_left > 0).await.unwrap();
        assert_eq!(usable.len(), 1);
        assert_eq!(usable[0].code, "TWO");
    }

    #[tokio::test]
    async fn test_missing_ids_report_not_found() {
        let client = start();
        assert_eq!(client.get("nope".into()).await.unwrap(), None);
        assert_eq!(
            client.delete("nope".into()).await.unwrap_err(),
            FrameworkError::NotFound("nope".into())
        );
        assert!(client.create(VoucherCreate { code: String::new(), uses: 1 }).await.is_err());
    }
}
