//! [`ExportFacade`]: writer-thread lifecycle and dispatch (`spec.md` §4.I).

use crate::error::ExportError;
use crate::sink::ExportSink;
use crate::snapshot::FrozenSnapshot;
use crossbeam_channel::{bounded, Sender};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

enum SinkMessage {
    Write(Arc<FrozenSnapshot>),
    Close,
}

struct PendingSink {
    name: String,
    sink: Box<dyn ExportSink>,
}

struct ActiveSink {
    name: String,
    sender: Sender<SinkMessage>,
    worker: JoinHandle<Result<(), ExportError>>,
}

enum FacadeState {
    Pending(Vec<PendingSink>),
    Started(Vec<ActiveSink>),
    Joined,
}

/// Dispatches frozen timestep snapshots to every attached sink.
///
/// Each sink gets its own bounded `crossbeam-channel` queue and
/// dedicated writer thread (`spec.md` §4.I: "multiple sinks may be
/// attached"); the at-most-once-per-(step, entity-type) contract is
/// enforced once here rather than duplicated in every sink.
pub struct ExportFacade {
    state: Mutex<FacadeState>,
    seen: Mutex<HashSet<(u64, String)>>,
    queue_capacity: usize,
}

impl ExportFacade {
    /// Build a facade whose per-sink queues hold up to `queue_capacity`
    /// snapshots before `write` blocks (backpressure, never drops).
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            state: Mutex::new(FacadeState::Pending(Vec::new())),
            seen: Mutex::new(HashSet::new()),
            queue_capacity,
        }
    }

    /// Attach a sink under `name`. Must be called before [`Self::start`].
    pub fn attach(&self, name: impl Into<String>, sink: Box<dyn ExportSink>) -> Result<(), ExportError> {
        let mut state = self.state.lock().expect("export facade state lock poisoned");
        match &mut *state {
            FacadeState::Pending(sinks) => {
                sinks.push(PendingSink { name: name.into(), sink });
                Ok(())
            }
            _ => Err(ExportError::AlreadyStarted),
        }
    }

    /// Launch one writer thread per attached sink.
    pub fn start(&self) -> Result<(), ExportError> {
        let mut state = self.state.lock().expect("export facade state lock poisoned");
        let pending = match std::mem::replace(&mut *state, FacadeState::Joined) {
            FacadeState::Pending(sinks) => sinks,
            other => {
                *state = other;
                return Err(ExportError::AlreadyStarted);
            }
        };

        let mut active = Vec::with_capacity(pending.len());
        for PendingSink { name, mut sink } in pending {
            let (sender, receiver) = bounded::<SinkMessage>(self.queue_capacity);
            let worker = std::thread::Builder::new()
                .name(format!("josh-export-{name}"))
                .spawn(move || -> Result<(), ExportError> {
                    for message in receiver {
                        match message {
                            SinkMessage::Write(snapshot) => sink.write(&snapshot)?,
                            SinkMessage::Close => break,
                        }
                    }
                    sink.flush()
                })
                .expect("failed to spawn export writer thread");
            active.push(ActiveSink { name, sender, worker });
        }
        *state = FacadeState::Started(active);
        Ok(())
    }

    /// Enqueue a snapshot for every attached sink, unless this exact
    /// (step, entity-type) pair has already been presented, in which
    /// case it is silently dropped.
    pub fn write(&self, snapshot: FrozenSnapshot) -> Result<(), ExportError> {
        let key = (snapshot.step(), snapshot.entity_type().to_string());
        {
            let mut seen = self.seen.lock().expect("export facade seen-set lock poisoned");
            if !seen.insert(key) {
                return Ok(());
            }
        }

        let state = self.state.lock().expect("export facade state lock poisoned");
        let active = match &*state {
            FacadeState::Started(active) => active,
            _ => return Err(ExportError::NotStarted),
        };
        let shared = Arc::new(snapshot);
        for sink in active {
            sink.sender
                .send(SinkMessage::Write(Arc::clone(&shared)))
                .map_err(|_| ExportError::SinkUnavailable { name: sink.name.clone() })?;
        }
        Ok(())
    }

    /// Signal every sink to close, wait for its writer thread, and
    /// return the first failure encountered, if any.
    pub fn join(&self) -> Result<(), ExportError> {
        let mut state = self.state.lock().expect("export facade state lock poisoned");
        let active = match std::mem::replace(&mut *state, FacadeState::Joined) {
            FacadeState::Started(active) => active,
            FacadeState::Joined => return Ok(()),
            other => {
                *state = other;
                return Err(ExportError::NotStarted);
            }
        };
        drop(state);

        for sink in &active {
            let _ = sink.sender.send(SinkMessage::Close);
        }

        let mut first_error = None;
        for sink in active {
            match sink.worker.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    first_error.get_or_insert(e);
                }
                Err(_) => {
                    first_error.get_or_insert(ExportError::WriterPanicked { name: sink.name });
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use josh_entity::{Entity, Prototype};
    use josh_core::EntityKind;
    use std::sync::Arc as StdArc;

    struct CollectingSink {
        received: Arc<Mutex<Vec<FrozenSnapshot>>>,
    }

    impl ExportSink for CollectingSink {
        fn write(&mut self, snapshot: &FrozenSnapshot) -> Result<(), ExportError> {
            self.received.lock().unwrap().push(snapshot.clone());
            Ok(())
        }

        fn flush(&mut self) -> Result<(), ExportError> {
            Ok(())
        }
    }

    struct FailingSink;

    impl ExportSink for FailingSink {
        fn write(&mut self, _snapshot: &FrozenSnapshot) -> Result<(), ExportError> {
            Err(ExportError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full")))
        }

        fn flush(&mut self) -> Result<(), ExportError> {
            Ok(())
        }
    }

    fn sample_snapshot(step: u64) -> FrozenSnapshot {
        let prototype = StdArc::new(Prototype::new("Cell", EntityKind::Patch));
        let entity = Entity::new(prototype, None, None);
        FrozenSnapshot::new(step, "Cell", vec![entity.freeze()])
    }

    #[test]
    fn write_before_start_errors() {
        let facade = ExportFacade::new(4);
        assert!(matches!(facade.write(sample_snapshot(0)), Err(ExportError::NotStarted)));
    }

    #[test]
    fn attached_sink_receives_every_distinct_snapshot() {
        let facade = ExportFacade::new(4);
        let received = Arc::new(Mutex::new(Vec::new()));
        facade
            .attach("collector", Box::new(CollectingSink { received: Arc::clone(&received) }))
            .unwrap();
        facade.start().unwrap();

        facade.write(sample_snapshot(0)).unwrap();
        facade.write(sample_snapshot(1)).unwrap();
        facade.join().unwrap();

        assert_eq!(received.lock().unwrap().len(), 2);
    }

    #[test]
    fn duplicate_step_and_type_is_dropped_silently() {
        let facade = ExportFacade::new(4);
        let received = Arc::new(Mutex::new(Vec::new()));
        facade
            .attach("collector", Box::new(CollectingSink { received: Arc::clone(&received) }))
            .unwrap();
        facade.start().unwrap();

        facade.write(sample_snapshot(0)).unwrap();
        facade.write(sample_snapshot(0)).unwrap();
        facade.join().unwrap();

        assert_eq!(received.lock().unwrap().len(), 1);
    }

    #[test]
    fn failing_sink_surfaces_its_error_at_join() {
        let facade = ExportFacade::new(4);
        facade.attach("failing", Box::new(FailingSink)).unwrap();
        facade.start().unwrap();

        facade.write(sample_snapshot(0)).unwrap();
        assert!(matches!(facade.join(), Err(ExportError::Io(_))));
    }
}
