//! Todo document store.
//!
//! # Design
//! The whole collection lives in an `RwLock<HashMap<Uuid, Todo>>`. Reads take
//! the shared lock. Every mutation takes the exclusive lock for its full
//! read-modify-write sequence, so "find max order, then insert" and the
//! two-document order swap run as a single unit of work and can never
//! interleave with another request.
//!
//! Mutations are applied to a staged copy of the collection. The copy is
//! persisted first and only then swapped in, so a failed write leaves both
//! memory and disk as they were.
//!
//! A `file://` store additionally keeps a JSON snapshot of the collection on
//! disk. The snapshot is rewritten (temp file + rename) before the exclusive
//! lock is released, so the file never lags behind an acknowledged write.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::StoreUrl;
use crate::todo::{Todo, UpdateTodo};

/// Failures of the persistence layer. Never caused by client input.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("store document {path} is not valid JSON: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode store snapshot: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("no order above the current maximum is representable")]
    OrderExhausted,
}

#[derive(Debug)]
enum Backend {
    Memory,
    File(PathBuf),
}

#[derive(Debug)]
pub struct TodoStore {
    todos: RwLock<HashMap<Uuid, Todo>>,
    backend: Backend,
}

impl TodoStore {
    /// An empty, purely in-memory store.
    pub fn memory() -> Self {
        Self {
            todos: RwLock::new(HashMap::new()),
            backend: Backend::Memory,
        }
    }

    /// Open the store named by `url`. A `file://` store that does not exist
    /// yet starts empty and is created on the first write.
    pub async fn connect(url: &StoreUrl) -> Result<Self, StoreError> {
        let store = match url {
            StoreUrl::Memory => Self::memory(),
            StoreUrl::File(path) => {
                let todos = load_snapshot(path).await?;
                Self {
                    todos: RwLock::new(todos),
                    backend: Backend::File(path.clone()),
                }
            }
        };
        let count = store.todos.read().await.len();
        tracing::info!(store = %url, todos = count, "store connected");
        Ok(store)
    }

    /// Flush the collection and release the store.
    pub async fn disconnect(&self) -> Result<(), StoreError> {
        let todos = self.todos.write().await;
        self.persist(&todos).await?;
        tracing::info!(todos = todos.len(), "store disconnected");
        Ok(())
    }

    /// All todos, highest order first. Equal orders fall back to id order so
    /// the listing is deterministic.
    pub async fn list_sorted(&self) -> Vec<Todo> {
        let todos = self.todos.read().await;
        let mut all: Vec<Todo> = todos.values().cloned().collect();
        all.sort_by(|a, b| b.order.cmp(&a.order).then_with(|| a.id.cmp(&b.id)));
        all
    }

    /// Insert a new, not yet completed todo ranked above every existing one.
    pub async fn insert_last(&self, value: String) -> Result<Todo, StoreError> {
        let mut todos = self.todos.write().await;
        let order = match find_max_order(&todos) {
            Some(top) => top.order.checked_add(1).ok_or(StoreError::OrderExhausted)?,
            None => 1,
        };
        let todo = Todo {
            id: Uuid::new_v4(),
            value,
            order,
            done_at: None,
        };

        let mut staged = todos.clone();
        staged.insert(todo.id, todo.clone());
        self.commit(&mut todos, staged).await?;
        tracing::debug!(id = %todo.id, order, "todo inserted");
        Ok(todo)
    }

    /// Apply `patch` to the todo `id`. Returns `Ok(None)` when no such todo
    /// exists.
    ///
    /// Moving to an order already held by another todo swaps the two orders.
    /// Moving to an order nobody holds takes it without further checks.
    pub async fn update(&self, id: Uuid, patch: &UpdateTodo) -> Result<Option<Todo>, StoreError> {
        let mut todos = self.todos.write().await;
        let Some(current) = todos.get(&id) else {
            return Ok(None);
        };
        let mut staged = todos.clone();
        let old_order = current.order;

        if let Some(order) = patch.order.filter(|order| *order != 0) {
            if let Some(holder) = find_by_order(&todos, order, id).map(|todo| todo.id) {
                if let Some(holder) = staged.get_mut(&holder) {
                    tracing::debug!(id = %holder.id, from = order, to = old_order, "order swapped");
                    holder.order = old_order;
                }
            }
        }

        let Some(todo) = staged.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(order) = patch.order.filter(|order| *order != 0) {
            todo.order = order;
        }
        if let Some(done) = patch.done {
            todo.done_at = done.unwrap_or(false).then(Utc::now);
        }
        if let Some(value) = patch.value.as_deref().filter(|value| !value.is_empty()) {
            todo.value = value.to_string();
        }
        let updated = todo.clone();

        self.commit(&mut todos, staged).await?;
        Ok(Some(updated))
    }

    /// Hard-delete `id`. Returns whether a todo was removed.
    pub async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut todos = self.todos.write().await;
        if !todos.contains_key(&id) {
            return Ok(false);
        }
        let mut staged = todos.clone();
        staged.remove(&id);
        self.commit(&mut todos, staged).await?;
        Ok(true)
    }

    /// Persist `staged`, then make it the live collection. On a failed write
    /// the live collection is left untouched.
    async fn commit(
        &self,
        live: &mut HashMap<Uuid, Todo>,
        staged: HashMap<Uuid, Todo>,
    ) -> Result<(), StoreError> {
        self.persist(&staged).await?;
        *live = staged;
        Ok(())
    }

    async fn persist(&self, todos: &HashMap<Uuid, Todo>) -> Result<(), StoreError> {
        match &self.backend {
            Backend::Memory => Ok(()),
            Backend::File(path) => write_snapshot(path, todos).await,
        }
    }
}

fn find_max_order(todos: &HashMap<Uuid, Todo>) -> Option<&Todo> {
    todos.values().max_by_key(|todo| todo.order)
}

/// The todo holding `order`, other than `except`.
fn find_by_order(todos: &HashMap<Uuid, Todo>, order: i64, except: Uuid) -> Option<&Todo> {
    todos
        .values()
        .find(|todo| todo.order == order && todo.id != except)
}

async fn load_snapshot(path: &Path) -> Result<HashMap<Uuid, Todo>, StoreError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(source) if source.kind() == io::ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let todos: Vec<Todo> = serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(todos.into_iter().map(|todo| (todo.id, todo)).collect())
}

async fn write_snapshot(path: &Path, todos: &HashMap<Uuid, Todo>) -> Result<(), StoreError> {
    let mut snapshot: Vec<&Todo> = todos.values().collect();
    snapshot.sort_by(|a, b| b.order.cmp(&a.order));
    let content = serde_json::to_vec_pretty(&snapshot)?;

    let io_err = |source: io::Error| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    let tmp = path.with_extension(format!("{}.tmp", Uuid::new_v4()));
    tokio::fs::write(&tmp, content).await.map_err(io_err)?;
    if let Err(source) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(io_err(source));
    }
    Ok(())
}
