use std::collections::HashMap;
use std::fmt::{self, Debug, Display};
use std::hash::Hash;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument, warn};

// =============================================================================
// 1. THE ABSTRACTION (Traits with Hooks, Params, and Actions)
// =============================================================================

/// Trait that any record must implement to be owned by a [`ResourceActor`].
///
/// The actor processes one request at a time, so every hook and action runs with
/// exclusive access to the record. Actions are applied to a staged copy and only
/// committed when they succeed.
pub trait Entity: Clone + Debug + Send + Sync + 'static {
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug;
    type CreateParams: Send + Sync + Debug;
    type Patch: Send + Sync + Debug;

    type Action: Send + Sync + Debug;
    type ActionResult: Send + Sync + Debug;

    fn id(&self) -> &Self::Id;

    /// Construct the full record from the generated ID and creation params.
    fn from_create_params(id: Self::Id, params: Self::CreateParams) -> Result<Self, String>;

    // --- Lifecycle Hooks ---

    fn on_create(&mut self) -> Result<(), String> {
        Ok(())
    }
    fn on_update(&mut self, patch: Self::Patch) -> Result<(), String>;
    fn on_delete(&self) -> Result<(), String> {
        Ok(())
    }

    /// Handle a domain-specific action against this record.
    fn handle_action(&mut self, action: Self::Action) -> Result<Self::ActionResult, String>;
}

/// Failures raised by the store itself rather than by domain rules.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FrameworkError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Request rejected: {0}")]
    Rejected(String),
    #[error("Conflicting item already exists: {0}")]
    Conflict(String),
    #[error("Natural key matched {0} items")]
    Ambiguous(usize),
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped the response")]
    ActorDropped,
}

// =============================================================================
// 2. THE GENERIC MESSAGES
// =============================================================================

pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

/// Predicate evaluated inside the actor against each stored record.
pub type Filter<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// Predicate over a staged record and one stored record.
pub type PairFilter<T> = Box<dyn Fn(&T, &T) -> bool + Send + Sync>;

/// Result of an [`ResourceRequest::UpsertBy`]: the record after the write and
/// whether it was newly created.
#[derive(Debug, Clone)]
pub struct Upserted<T> {
    pub entity: T,
    pub created: bool,
}

pub enum ResourceRequest<T: Entity> {
    Create {
        params: T::CreateParams,
        respond_to: Response<T>,
    },
    /// Create unless any stored record satisfies `conflicts`.
    CreateUnique {
        params: T::CreateParams,
        conflicts: Filter<T>,
        respond_to: Response<T>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    List {
        respond_to: Response<Vec<T>>,
    },
    Query {
        filter: Filter<T>,
        respond_to: Response<Vec<T>>,
    },
    Update {
        id: T::Id,
        patch: T::Patch,
        respond_to: Response<T>,
    },
    /// Update unless any other stored record satisfies `conflicts` once patched.
    UpdateUnique {
        id: T::Id,
        patch: T::Patch,
        conflicts: PairFilter<T>,
        respond_to: Response<T>,
    },
    Delete {
        id: T::Id,
        respond_to: Response<()>,
    },
    Action {
        id: T::Id,
        action: T::Action,
        respond_to: Response<T::ActionResult>,
    },
    /// Apply `action` to the single record matching `key`, or create one from
    /// `params` when nothing matches. More than one match is an error.
    UpsertBy {
        key: Filter<T>,
        params: T::CreateParams,
        action: T::Action,
        respond_to: Response<Upserted<T>>,
    },
}

impl<T: Entity> Debug for ResourceRequest<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceRequest::Create { params, .. } => f.debug_struct("Create").field("params", params).finish(),
            ResourceRequest::CreateUnique { params, .. } => {
                f.debug_struct("CreateUnique").field("params", params).finish()
            }
            ResourceRequest::Get { id, .. } => f.debug_struct("Get").field("id", id).finish(),
            ResourceRequest::List { .. } => f.write_str("List"),
            ResourceRequest::Query { .. } => f.write_str("Query"),
            ResourceRequest::Update { id, patch, .. } => {
                f.debug_struct("Update").field("id", id).field("patch", patch).finish()
            }
            ResourceRequest::UpdateUnique { id, patch, .. } => {
                f.debug_struct("UpdateUnique").field("id", id).field("patch", patch).finish()
            }
            ResourceRequest::Delete { id, .. } => f.debug_struct("Delete").field("id", id).finish(),
            ResourceRequest::Action { id, action, .. } => {
                f.debug_struct("Action").field("id", id).field("action", action).finish()
            }
            ResourceRequest::UpsertBy { params, action, .. } => f
                .debug_struct("UpsertBy")
                .field("params", params)
                .field("action", action)
                .finish(),
        }
    }
}

// =============================================================================
// 3. THE GENERIC ACTOR SERVER
// =============================================================================

pub struct ResourceActor<T: Entity> {
    name: &'static str,
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    store: HashMap<T::Id, T>,
    /// Insertion order, so listings are stable.
    order: Vec<T::Id>,
    next_id_fn: Box<dyn Fn() -> T::Id + Send + Sync>,
}

impl<T: Entity> ResourceActor<T> {
    pub fn new(
        name: &'static str,
        buffer_size: usize,
        next_id_fn: impl Fn() -> T::Id + Send + Sync + 'static,
    ) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            name,
            receiver,
            store: HashMap::new(),
            order: Vec::new(),
            next_id_fn: Box::new(next_id_fn),
        };
        (actor, ResourceClient::new(sender))
    }

    /// Main loop. Ends once every client has been dropped.
    #[instrument(name = "resource_actor", fields(store = self.name), skip(self))]
    pub async fn run(mut self) {
        info!("Store starting");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Create { params, respond_to } => {
                    let _ = respond_to.send(self.handle_create(params));
                }
                ResourceRequest::CreateUnique { params, conflicts, respond_to } => {
                    let conflict = self.first_match(&conflicts).map(|id| id.to_string());
                    let result = match conflict {
                        Some(existing) => Err(FrameworkError::Conflict(existing)),
                        None => self.handle_create(params),
                    };
                    let _ = respond_to.send(result);
                }
                ResourceRequest::Get { id, respond_to } => {
                    let _ = respond_to.send(Ok(self.store.get(&id).cloned()));
                }
                ResourceRequest::List { respond_to } => {
                    let _ = respond_to.send(Ok(self.collect(|_| true)));
                }
                ResourceRequest::Query { filter, respond_to } => {
                    let _ = respond_to.send(Ok(self.collect(|item| filter(item))));
                }
                ResourceRequest::Update { id, patch, respond_to } => {
                    let _ = respond_to.send(self.handle_update(id, patch));
                }
                ResourceRequest::UpdateUnique { id, patch, conflicts, respond_to } => {
                    let _ = respond_to.send(self.handle_update_unique(id, patch, &conflicts));
                }
                ResourceRequest::Delete { id, respond_to } => {
                    let _ = respond_to.send(self.handle_delete(id));
                }
                ResourceRequest::Action { id, action, respond_to } => {
                    let _ = respond_to.send(self.handle_action(id, action));
                }
                ResourceRequest::UpsertBy { key, params, action, respond_to } => {
                    let _ = respond_to.send(self.handle_upsert(&key, params, action));
                }
            }
        }

        info!("Store stopped");
    }

    fn handle_create(&mut self, params: T::CreateParams) -> Result<T, FrameworkError> {
        let id = (self.next_id_fn)();
        let mut item = T::from_create_params(id.clone(), params).map_err(FrameworkError::Rejected)?;
        item.on_create().map_err(FrameworkError::Rejected)?;
        self.store.insert(id.clone(), item.clone());
        self.order.push(id.clone());
        debug!(id = %id, "Item created");
        Ok(item)
    }

    fn handle_update(&mut self, id: T::Id, patch: T::Patch) -> Result<T, FrameworkError> {
        let item = self
            .store
            .get_mut(&id)
            .ok_or_else(|| FrameworkError::NotFound(id.to_string()))?;
        let mut staged = item.clone();
        staged.on_update(patch).map_err(FrameworkError::Rejected)?;
        *item = staged.clone();
        Ok(staged)
    }

    /// Stages the patch, then checks the patched record against every other one
    /// before committing.
    fn handle_update_unique(&mut self, id: T::Id, patch: T::Patch, conflicts: &PairFilter<T>) -> Result<T, FrameworkError> {
        let mut staged = self
            .store
            .get(&id)
            .cloned()
            .ok_or_else(|| FrameworkError::NotFound(id.to_string()))?;
        staged.on_update(patch).map_err(FrameworkError::Rejected)?;

        let clash = self
            .order
            .iter()
            .filter(|other| **other != id)
            .find(|other| self.store.get(*other).is_some_and(|item| conflicts(&staged, item)));
        if let Some(existing) = clash {
            return Err(FrameworkError::Conflict(existing.to_string()));
        }

        self.store.insert(id, staged.clone());
        Ok(staged)
    }

    fn handle_delete(&mut self, id: T::Id) -> Result<(), FrameworkError> {
        let item = self
            .store
            .get(&id)
            .ok_or_else(|| FrameworkError::NotFound(id.to_string()))?;
        item.on_delete().map_err(FrameworkError::Rejected)?;
        self.store.remove(&id);
        self.order.retain(|existing| existing != &id);
        Ok(())
    }

    fn handle_action(&mut self, id: T::Id, action: T::Action) -> Result<T::ActionResult, FrameworkError> {
        let item = self
            .store
            .get_mut(&id)
            .ok_or_else(|| FrameworkError::NotFound(id.to_string()))?;
        let mut staged = item.clone();
        let result = staged.handle_action(action).map_err(FrameworkError::Rejected)?;
        *item = staged;
        Ok(result)
    }

    fn handle_upsert(
        &mut self,
        key: &Filter<T>,
        params: T::CreateParams,
        action: T::Action,
    ) -> Result<Upserted<T>, FrameworkError> {
        let matches: Vec<T::Id> = self
            .order
            .iter()
            .filter(|id| self.store.get(*id).is_some_and(|item| key(item)))
            .cloned()
            .collect();

        match matches.as_slice() {
            [] => self.handle_create(params).map(|entity| Upserted { entity, created: true }),
            [id] => {
                self.handle_action(id.clone(), action)?;
                let entity = self
                    .store
                    .get(id)
                    .cloned()
                    .ok_or_else(|| FrameworkError::NotFound(id.to_string()))?;
                Ok(Upserted { entity, created: false })
            }
            many => {
                warn!(matches = many.len(), "Natural key is not unique");
                Err(FrameworkError::Ambiguous(many.len()))
            }
        }
    }

    fn first_match(&self, filter: &Filter<T>) -> Option<&T::Id> {
        self.order
            .iter()
            .find(|id| self.store.get(*id).is_some_and(|item| filter(item)))
    }

    fn collect(&self, keep: impl Fn(&T) -> bool) -> Vec<T> {
        self.order
            .iter()
            .filter_map(|id| self.store.get(id))
            .filter(|item| keep(item))
            .cloned()
            .collect()
    }
}

// =============================================================================
// 4. THE GENERIC CLIENT
// =============================================================================

pub struct ResourceClient<T: Entity> {
    sender: mpsc::Sender<ResourceRequest<T>>,
}

// Manual impl: deriving would demand `T: Clone` on the sender's type parameter.
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
        build: impl FnOnce(Response<R>) -> ResourceRequest<T>,
    ) -> Result<R, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn create(&self, params: T::CreateParams) -> Result<T, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Create { params, respond_to }).await
    }

    pub async fn create_unique(
        &self,
        params: T::CreateParams,
        conflicts: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Result<T, FrameworkError> {
        self.request(|respond_to| ResourceRequest::CreateUnique {
            params,
            conflicts: Box::new(conflicts),
            respond_to,
        })
        .await
    }

    pub async fn get(&self, id: T::Id) -> Result<Option<T>, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Get { id, respond_to }).await
    }

    pub async fn list(&self) -> Result<Vec<T>, FrameworkError> {
        self.request(|respond_to| ResourceRequest::List { respond_to }).await
    }

    pub async fn query(
        &self,
        filter: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Result<Vec<T>, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Query {
            filter: Box::new(filter),
            respond_to,
        })
        .await
    }

    pub async fn update(&self, id: T::Id, patch: T::Patch) -> Result<T, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Update { id, patch, respond_to }).await
    }

    /// Applies `patch` unless the patched record and another stored record
    /// satisfy `conflicts(patched, other)`. Check and write happen in one step.
    pub async fn update_unique(
        &self,
        id: T::Id,
        patch: T::Patch,
        conflicts: impl Fn(&T, &T) -> bool + Send + Sync + 'static,
    ) -> Result<T, FrameworkError> {
        self.request(|respond_to| ResourceRequest::UpdateUnique {
            id,
            patch,
            conflicts: Box::new(conflicts),
            respond_to,
        })
        .await
    }

    pub async fn delete(&self, id: T::Id) -> Result<(), FrameworkError> {
        self.request(|respond_to| ResourceRequest::Delete { id, respond_to }).await
    }

    pub async fn perform_action(&self, id: T::Id, action: T::Action) -> Result<T::ActionResult, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Action { id, action, respond_to }).await
    }

    pub async fn upsert_by(
        &self,
        key: impl Fn(&T) -> bool + Send + Sync + 'static,
        params: T::CreateParams,
        action: T::Action,
    ) -> Result<Upserted<T>, FrameworkError> {
        self.request(|respond_to| ResourceRequest::UpsertBy {
            key: Box::new(key),
            params,
            action,
            respond_to,
        })
        .await
    }
}
