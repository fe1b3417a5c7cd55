//! Background saving.
//!
//! Commands hand a snapshot copy to a worker thread and return immediately.
//! Snapshots queued while the worker is busy are coalesced to the newest one.

use crate::domain::Snapshot;
use crate::persistence::store::SnapshotStore;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tracing::{error, warn};

enum Job {
    Save(Box<Snapshot>),
    Flush(Sender<()>),
}

pub struct AutoSaver {
    sender: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
    last_error: Arc<Mutex<Option<String>>>,
}

impl AutoSaver {
    pub fn spawn(store: Arc<dyn SnapshotStore>) -> Self {
        let (sender, receiver) = mpsc::channel();
        let last_error = Arc::new(Mutex::new(None));
        let worker_error = Arc::clone(&last_error);

        let worker = thread::Builder::new()
            .name("timetally-autosave".to_string())
            .spawn(move || worker_loop(store, receiver, worker_error));

        let (sender, worker) = match worker {
            Ok(handle) => (Some(sender), Some(handle)),
            Err(e) => {
                error!(error = %e, "could not start autosave worker");
                record(&last_error, Some(format!("autosave unavailable: {}", e)));
                (None, None)
            }
        };

        Self {
            sender,
            worker,
            last_error,
        }
    }

    /// Queue a save of the current snapshot state
    pub fn request(&self, snapshot: &Snapshot) {
        let Some(sender) = &self.sender else {
            return;
        };
        if sender.send(Job::Save(Box::new(snapshot.clone()))).is_err() {
            warn!("autosave worker has stopped; save dropped");
        }
    }

    /// Block until everything queued so far has been written
    pub fn flush(&self) {
        let Some(sender) = &self.sender else {
            return;
        };
        let (ack_tx, ack_rx) = mpsc::channel();
        if sender.send(Job::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.recv();
        }
    }

    /// Message of the most recent failed save, cleared by the next success
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().ok().and_then(|guard| guard.clone())
    }
}

impl Drop for AutoSaver {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain and exit
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("autosave worker panicked");
            }
        }
    }
}

fn record(slot: &Mutex<Option<String>>, message: Option<String>) {
    if let Ok(mut guard) = slot.lock() {
        *guard = message;
    }
}

fn worker_loop(store: Arc<dyn SnapshotStore>, receiver: Receiver<Job>, last_error: Arc<Mutex<Option<String>>>) {
    while let Ok(first) = receiver.recv() {
        let mut latest = None;
        let mut acks = Vec::new();

        // Coalesce everything already queued; the newest snapshot wins
        let mut next = Some(first);
        while let Some(job) = next {
            match job {
                Job::Save(snapshot) => latest = Some(snapshot),
                Job::Flush(ack) => acks.push(ack),
            }
            next = receiver.try_recv().ok();
        }

        if let Some(snapshot) = latest {
            match store.save(&snapshot) {
                Ok(()) => record(&last_error, None),
                Err(e) => {
                    error!(error = %e, user = %snapshot.user_id, "autosave failed");
                    record(&last_error, Some(e.to_string()));
                }
            }
        }

        for ack in acks {
            let _ = ack.send(());
        }
    }
}
