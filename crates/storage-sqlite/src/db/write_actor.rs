//! Single writer for the database.
//!
//! Every mutation goes through one task that owns one pooled connection and
//! runs each job in an immediate transaction, so appends to a series are
//! serialized in submission order.

use std::any::Any;

use diesel::SqliteConnection;
use log::error;
use tokio::sync::{mpsc, oneshot};

use optionwatch_core::errors::{DatabaseError, Error, Result};

use super::DbPool;
use crate::errors::StorageError;

type Job<T> = Box<dyn FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static>;
type AnyBox = Box<dyn Any + Send + 'static>;
type Envelope = (Job<AnyBox>, oneshot::Sender<Result<AnyBox>>);

const QUEUE_DEPTH: usize = 1024;

fn actor_gone() -> Error {
    Error::Database(DatabaseError::Internal(
        "Database writer is no longer running".to_string(),
    ))
}

/// Handle for sending jobs to the writer actor.
#[derive(Clone)]
pub struct WriteHandle {
    tx: mpsc::Sender<Envelope>,
}

impl WriteHandle {
    /// Run `job` on the writer connection and wait for its result.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (ret_tx, ret_rx) = oneshot::channel();

        self.tx
            .send((Box::new(move |c| job(c).map(|v| Box::new(v) as AnyBox)), ret_tx))
            .await
            .map_err(|_| actor_gone())?;

        let boxed = ret_rx.await.map_err(|_| actor_gone())??;
        boxed.downcast::<T>().map(|v| *v).map_err(|_| {
            Error::Database(DatabaseError::Internal(
                "Writer returned a value of an unexpected type".to_string(),
            ))
        })
    }
}

/// Spawns the writer task. It holds one connection from `pool` for its whole
/// lifetime and stops once every [`WriteHandle`] is dropped.
pub fn spawn_writer(pool: DbPool) -> WriteHandle {
    let (tx, mut rx) = mpsc::channel::<Envelope>(QUEUE_DEPTH);

    tokio::spawn(async move {
        let mut conn = match pool.get() {
            Ok(conn) => conn,
            Err(e) => {
                error!("Database writer could not acquire a connection: {}", e);
                return;
            }
        };

        while let Some((job, reply_tx)) = rx.recv().await {
            let result: Result<AnyBox> = conn
                .immediate_transaction::<_, StorageError, _>(|c| job(c).map_err(StorageError::from))
                .map_err(Error::from);

            // The requester may have gone away.
            let _ = reply_tx.send(result);
        }
    });

    WriteHandle { tx }
}
