//! Serial scene mutation queue.
//!
//! The scene graph is touched by the tracking loop every frame and by load
//! completions at arbitrary times. All of those writes go through one worker
//! thread that owns the [`SceneSink`] and applies tasks strictly in
//! submission order, one at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam::channel::{bounded, unbounded, Receiver, Sender};
use decor_core::{DecorError, Result};
use parking_lot::Mutex;

use crate::sink::{SceneMutation, SceneSink};

/// A unit of work run against the scene on the queue's worker.
pub type SceneTask = Box<dyn FnOnce(&mut dyn SceneSink) + Send + 'static>;

enum Message {
    Task(SceneTask),
    Barrier(Sender<()>),
    Shutdown,
}

/// Handle to the serial scene mutation queue.
///
/// Cloning the handle is cheap; all clones feed the same worker.
#[derive(Clone)]
pub struct SceneMutationQueue {
    sender: Sender<Message>,
    closed: Arc<AtomicBool>,
    worker: Arc<Mutex<Option<thread::JoinHandle<()>>>>,
}

impl SceneMutationQueue {
    /// Spawns the worker that will own `sink`.
    pub fn new<S>(sink: S) -> Result<Self>
    where
        S: SceneSink + 'static,
    {
        let (sender, receiver) = unbounded();
        let worker = thread::Builder::new()
            .name("decor-scene-queue".to_string())
            .spawn(move || run_worker(Box::new(sink), &receiver))?;

        log::debug!("scene mutation queue started");

        Ok(Self {
            sender,
            closed: Arc::new(AtomicBool::new(false)),
            worker: Arc::new(Mutex::new(Some(worker))),
        })
    }

    /// Submits a mutation. Never blocks.
    pub fn submit(&self, mutation: SceneMutation) -> Result<()> {
        self.submit_task(move |sink| sink.apply(mutation))
    }

    /// Submits an arbitrary task. Never blocks.
    ///
    /// Tasks must not block; they run on the single worker and would stall
    /// every other scene write behind them.
    pub fn submit_task<F>(&self, task: F) -> Result<()>
    where
        F: FnOnce(&mut dyn SceneSink) + Send + 'static,
    {
        self.send(Message::Task(Box::new(task)))
    }

    /// Blocks until every task submitted before this call has been applied.
    pub fn flush(&self) -> Result<()> {
        let (done_tx, done_rx) = bounded(1);
        self.send(Message::Barrier(done_tx))?;
        done_rx.recv().map_err(|_| DecorError::QueueClosed)
    }

    /// Returns whether the queue has been shut down.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Applies everything already queued, then stops the worker.
    ///
    /// Later submissions from any clone fail with [`DecorError::QueueClosed`].
    pub fn shutdown(&self) {
        let worker = {
            let mut worker = self.worker.lock();
            if self.closed.swap(true, Ordering::AcqRel) {
                return;
            }
            let _ = self.sender.send(Message::Shutdown);
            worker.take()
        };
        // Joined outside the lock: running tasks may still submit and get QueueClosed
        if let Some(worker) = worker {
            if worker.join().is_err() {
                log::error!("scene mutation worker panicked");
            }
        }
        log::debug!("scene mutation queue stopped");
    }

    fn send(&self, message: Message) -> Result<()> {
        // Checked under the worker lock so nothing lands behind the shutdown marker
        let _guard = self.worker.lock();
        if self.is_closed() {
            return Err(DecorError::QueueClosed);
        }
        self.sender
            .send(message)
            .map_err(|_| DecorError::QueueClosed)
    }
}

fn run_worker(mut sink: Box<dyn SceneSink>, receiver: &Receiver<Message>) {
    for message in receiver {
        match message {
            Message::Task(task) => task(sink.as_mut()),
            Message::Barrier(done) => {
                let _ = done.send(());
            }
            Message::Shutdown => break,
        }
    }
}
