//! Connection registry
//!
//! One task owns the `ClientId -> ConnectionHandle` map and applies commands in
//! arrival order. `Registry` is the cloneable front end every connection holds.

use super::{ConnectionHandle, SendError};
use relay_core::{ClientId, CloseCode};
use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot};

/// Capacity of the registry command queue
pub const DEFAULT_COMMAND_BUFFER: usize = 1024;

/// Proof of a successful `register`
///
/// The generation distinguishes successive connections for the same client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    client_id: ClientId,
    generation: u64,
}

impl Registration {
    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

enum Command {
    Register {
        handle: ConnectionHandle,
        reply: oneshot::Sender<Registration>,
    },
    Unregister {
        client_id: ClientId,
        generation: Option<u64>,
        code: CloseCode,
        reply: oneshot::Sender<bool>,
    },
    SendTo {
        client_id: ClientId,
        generation: Option<u64>,
        payload: String,
        reply: oneshot::Sender<Result<(), SendError>>,
    },
    Count {
        reply: oneshot::Sender<usize>,
    },
}

struct Entry {
    handle: ConnectionHandle,
    generation: u64,
}

/// Registry state, owned by the actor task
struct RegistryActor {
    clients: HashMap<ClientId, Entry>,
    next_generation: u64,
}

impl RegistryActor {
    fn new() -> Self {
        Self {
            clients: HashMap::new(),
            next_generation: 1,
        }
    }

    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        while let Some(command) = commands.recv().await {
            self.apply(command);
        }

        // Every front end is gone: nobody can route to these clients any more
        let remaining = self.clients.len();
        for (_, entry) in self.clients.drain() {
            entry.handle.close(CloseCode::GoingAway);
        }
        tracing::debug!(closed = remaining, "Registry stopped");
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Register { handle, reply } => {
                let registration = self.register(handle);
                let _ = reply.send(registration);
            }
            Command::Unregister {
                client_id,
                generation,
                code,
                reply,
            } => {
                let removed = self.unregister(&client_id, generation, code);
                let _ = reply.send(removed);
            }
            Command::SendTo {
                client_id,
                generation,
                payload,
                reply,
            } => {
                let result = match self.clients.get(&client_id) {
                    Some(entry) if generation.is_none_or(|g| g == entry.generation) => {
                        entry.handle.send(payload)
                    }
                    _ => Err(SendError::NotConnected(client_id)),
                };
                let _ = reply.send(result);
            }
            Command::Count { reply } => {
                let _ = reply.send(self.clients.len());
            }
        }
    }

    fn register(&mut self, handle: ConnectionHandle) -> Registration {
        let client_id = handle.client_id().clone();
        let generation = self.next_generation;
        self.next_generation += 1;

        // The old handle is closed before the new one can receive anything
        if let Some(previous) = self.clients.remove(&client_id) {
            tracing::info!(
                client_id = %client_id,
                generation = previous.generation,
                "Connection superseded by a newer registration"
            );
            previous.handle.close(CloseCode::Superseded);
        }

        self.clients
            .insert(client_id.clone(), Entry { handle, generation });

        tracing::info!(
            client_id = %client_id,
            generation,
            clients = self.clients.len(),
            "Client registered"
        );

        Registration {
            client_id,
            generation,
        }
    }

    fn unregister(
        &mut self,
        client_id: &ClientId,
        generation: Option<u64>,
        code: CloseCode,
    ) -> bool {
        let owned = match (self.clients.get(client_id), generation) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(entry), Some(generation)) => entry.generation == generation,
        };
        if !owned {
            return false;
        }

        let Some(entry) = self.clients.remove(client_id) else {
            return false;
        };
        entry.handle.close(code);

        tracing::info!(
            client_id = %client_id,
            clients = self.clients.len(),
            "Client unregistered"
        );
        true
    }
}

/// Handle to the registry actor
///
/// The actor stops once every `Registry` clone has been dropped, closing any
/// handles still registered.
#[derive(Debug, Clone)]
pub struct Registry {
    commands: mpsc::Sender<Command>,
}

impl Registry {
    /// Spawn the registry actor on the current runtime
    pub fn spawn() -> Self {
        Self::with_capacity(DEFAULT_COMMAND_BUFFER)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (commands, rx) = mpsc::channel(capacity.max(1));
        tokio::spawn(RegistryActor::new().run(rx));
        Self { commands }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, SendError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| SendError::RegistryStopped)?;
        response.await.map_err(|_| SendError::RegistryStopped)
    }

    /// Install `handle` for its client id, superseding any existing connection
    pub async fn register(&self, handle: ConnectionHandle) -> Result<Registration, SendError> {
        self.request(|reply| Command::Register { handle, reply }).await
    }

    /// Remove and close whatever connection `client_id` currently has
    ///
    /// Returns `false` if the client was not registered.
    pub async fn unregister(&self, client_id: &ClientId) -> Result<bool, SendError> {
        let client_id = client_id.clone();
        self.request(|reply| Command::Unregister {
            client_id,
            generation: None,
            code: CloseCode::Unregistered,
            reply,
        })
        .await
    }

    /// Remove and close the connection only if it still belongs to `registration`
    ///
    /// Used by a connection's own teardown so that it never evicts a successor.
    pub async fn release(
        &self,
        registration: Registration,
        code: CloseCode,
    ) -> Result<bool, SendError> {
        self.request(|reply| Command::Unregister {
            client_id: registration.client_id,
            generation: Some(registration.generation),
            code,
            reply,
        })
        .await
    }

    /// Queue `payload` for `client_id` without waiting on its socket
    pub async fn send_to(&self, client_id: &ClientId, payload: String) -> Result<(), SendError> {
        let client_id = client_id.clone();
        self.request(|reply| Command::SendTo {
            client_id,
            generation: None,
            payload,
            reply,
        })
        .await?
    }

    /// Queue `payload` for the connection behind `registration`
    ///
    /// Fails with `NotConnected` once that connection has been superseded, so a
    /// reply never reaches a newer connection for the same client.
    pub async fn send_to_registration(
        &self,
        registration: &Registration,
        payload: String,
    ) -> Result<(), SendError> {
        let client_id = registration.client_id.clone();
        let generation = Some(registration.generation);
        self.request(|reply| Command::SendTo {
            client_id,
            generation,
            payload,
            reply,
        })
        .await?
    }

    /// Number of registered clients
    pub async fn client_count(&self) -> Result<usize, SendError> {
        self.request(|reply| Command::Count { reply }).await
    }
}
