use super::DbPool;
use crate::errors::StorageError;
use bookshelf_core::errors::Result;
use diesel::SqliteConnection;
use log::warn;
use std::any::Any;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};

// Type alias for the job to be executed by the writer actor.
// It takes a mutable reference to a SqliteConnection and returns a Result.
// We use core::Result here since that's what callers expect.
type Job<T> = Box<dyn FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static>;

type ErasedJob = Job<Box<dyn Any + Send + 'static>>;
type Reply = oneshot::Sender<Result<Box<dyn Any + Send + 'static>>>;

struct Envelope {
    job: ErasedJob,
    deadline: Option<Instant>,
    reply: Reply,
}

/// Handle for sending jobs to the writer actor.
#[derive(Clone)]
pub struct WriteHandle {
    // Each job is a boxed closure; the reply comes back on a oneshot channel.
    // Box<dyn Any + Send> erases the job's return type.
    tx: mpsc::Sender<Envelope>,
}

impl WriteHandle {
    /// Executes a database job on the writer actor's dedicated connection,
    /// inside one immediate transaction.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static + Any,
    {
        self.exec_with_timeout(job, None).await
    }

    /// Like [`exec`](Self::exec), but the transaction is rolled back with a
    /// timeout error if `timeout` elapses before it would commit.
    ///
    /// The deadline is checked before the job starts and again after it
    /// finishes, before commit. A job is never interrupted midway.
    pub async fn exec_with_timeout<F, T>(&self, job: F, timeout: Option<Duration>) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static + Any,
    {
        let deadline = timeout.map(|t| Instant::now() + t);
        let (ret_tx, ret_rx) = oneshot::channel();

        self.tx
            .send(Envelope {
                job: Box::new(move |c| job(c).map(|v| Box::new(v) as Box<dyn Any + Send>)),
                deadline,
                reply: ret_tx,
            })
            .await
            .map_err(|_| StorageError::WriterUnavailable("writer actor stopped".to_string()))?;

        let boxed = ret_rx.await.map_err(|_| {
            StorageError::WriterUnavailable("writer actor dropped the reply".to_string())
        })??;

        boxed.downcast::<T>().map(|v| *v).map_err(|_| {
            StorageError::Decode("writer actor returned an unexpected type".to_string()).into()
        })
    }
}

fn past(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}

/// Spawns a background Tokio task that acts as a single writer to the database.
/// The actor owns one pooled connection and processes write jobs serially,
/// so write units of work never interleave within the process.
pub fn spawn_writer(pool: DbPool) -> Result<WriteHandle> {
    let mut conn = pool.get().map_err(StorageError::from)?;
    let (tx, mut rx) = mpsc::channel::<Envelope>(1024);

    tokio::spawn(async move {
        while let Some(Envelope {
            job,
            deadline,
            reply,
        }) = rx.recv().await
        {
            if past(deadline) {
                warn!("Write job expired in queue before it started");
                let _ = reply.send(Err(StorageError::Timeout.into()));
                continue;
            }

            // BEGIN IMMEDIATE takes the write lock up front, so a job's reads
            // and writes are not interleaved with another connection's writes.
            let result: Result<Box<dyn Any + Send + 'static>> = conn
                .immediate_transaction::<_, StorageError, _>(|c| {
                    let value = job(c).map_err(StorageError::from)?;
                    if past(deadline) {
                        return Err(StorageError::Timeout);
                    }
                    Ok(value)
                })
                .map_err(|e: StorageError| e.into());

            // The requester may have gone away (dropped future); nothing to do then.
            let _ = reply.send(result);
        }
    });

    Ok(WriteHandle { tx })
}
