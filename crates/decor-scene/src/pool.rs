//! Bounded pool of background workers for asset loading.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam::channel::{unbounded, Receiver, Sender};
use decor_core::Result;

/// A boxed unit of background work.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct Counters {
    active: AtomicUsize,
    completed: AtomicUsize,
}

/// A fixed-size pool of load workers.
pub struct LoadPool {
    sender: Option<Sender<Job>>,
    workers: Vec<thread::JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    counters: Arc<Counters>,
}

impl LoadPool {
    /// Spawns `num_workers` workers (at least one).
    pub fn new(num_workers: usize) -> Result<Self> {
        let num_workers = num_workers.max(1);
        let (sender, receiver) = unbounded::<Job>();
        let counters = Arc::new(Counters::default());

        let mut workers = Vec::with_capacity(num_workers);
        for id in 0..num_workers {
            let receiver = receiver.clone();
            let counters = Arc::clone(&counters);
            let handle = thread::Builder::new()
                .name(format!("decor-loader-{id}"))
                .spawn(move || run_worker(&receiver, &counters))?;
            workers.push(handle);
        }

        log::debug!("load pool started with {num_workers} workers");

        Ok(Self {
            sender: Some(sender),
            workers,
            shutdown: Arc::new(AtomicBool::new(false)),
            counters,
        })
    }

    /// Queues a job.
    ///
    /// Returns the job back if the pool is shutting down, so the caller can
    /// decide what to do with it instead of losing it.
    pub fn execute(&self, job: Job) -> std::result::Result<(), Job> {
        if self.shutdown.load(Ordering::Acquire) {
            return Err(job);
        }
        let Some(sender) = &self.sender else {
            return Err(job);
        };
        sender.send(job).map_err(|err| err.into_inner())
    }

    /// Returns the number of workers.
    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }

    /// Get the number of jobs currently running.
    pub fn active_count(&self) -> usize {
        self.counters.active.load(Ordering::Relaxed)
    }

    /// Get the number of finished jobs.
    pub fn completed_count(&self) -> usize {
        self.counters.completed.load(Ordering::Relaxed)
    }

    /// Finishes queued jobs and joins every worker.
    pub fn shutdown(&mut self) {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }
        // Dropping the only sender ends each worker's receive loop once the queue drains
        self.sender.take();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                log::error!("load worker panicked");
            }
        }
        log::debug!("load pool stopped");
    }
}

impl Drop for LoadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(receiver: &Receiver<Job>, counters: &Counters) {
    for job in receiver {
        counters.active.fetch_add(1, Ordering::Relaxed);
        job();
        counters.active.fetch_sub(1, Ordering::Relaxed);
        counters.completed.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel::bounded;

    #[test]
    fn test_jobs_run_in_background() {
        let pool = LoadPool::new(2).unwrap();
        assert_eq!(pool.num_workers(), 2);

        let (tx, rx) = bounded(4);
        for i in 0..4 {
            let tx = tx.clone();
            assert!(pool.execute(Box::new(move || tx.send(i).unwrap())).is_ok());
        }
        let mut seen: Vec<i32> = (0..4).map(|_| rx.recv().unwrap()).collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_zero_workers_means_one() {
        let pool = LoadPool::new(0).unwrap();
        assert_eq!(pool.num_workers(), 1);
    }

    #[test]
    fn test_shutdown_drains_then_returns_jobs() {
        let mut pool = LoadPool::new(1).unwrap();
        let (tx, rx) = unbounded();
        for i in 0..3 {
            let tx = tx.clone();
            assert!(pool.execute(Box::new(move || tx.send(i).unwrap())).is_ok());
        }
        pool.shutdown();
        assert_eq!(rx.try_iter().count(), 3);
        assert_eq!(pool.completed_count(), 3);
        assert_eq!(pool.active_count(), 0);

        let rejected = pool.execute(Box::new(|| {}));
        assert!(rejected.is_err());
    }
}
