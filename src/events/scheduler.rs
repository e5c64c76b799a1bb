//! Scheduled spawn events and the background event worker.
//!
//! One worker thread owns a min-heap of spawn events keyed on start time
//! plus the mission board, both behind a single mutex with a condvar.
//! `add_event` / `add_mission` are thread-safe. The worker suspends while
//! the engine is paused or outside the game scene (waiting at most one
//! second when idle) and wakes on every add, clock push, or shutdown.
//!
//! The worker never mutates entities. When an event comes due it sends a
//! [`SpawnCmd`] through a crossbeam channel; the engine drains that
//! channel at the top of each frame, so spawns join the entity set between
//! frames and determinism survives the thread hop.
//!
//! Scheduler state persists to a little-endian binary file: `i32 count`,
//! then per record `i32 event_kind` followed by `i32 enemy_kind,
//! i32 num_enemies, f32 start_time` for spawn events or `i32 enemy_kind,
//! i32 num_enemies` for missions (missions carry no start time).

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{info, warn};
use thiserror::Error;

use crate::components::ai::EnemyKind;
use crate::events::missions::{Mission, MissionBoard};

/// Wire codes for persisted records.
const EVENT_KIND_SPAWN: i32 = 0;
const EVENT_KIND_MISSION: i32 = 1;

/// How long the worker sleeps when there is nothing due.
const IDLE_WAIT: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum PersistError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("truncated event file")]
    UnexpectedEof,
    #[error("unknown event kind {0}")]
    UnknownEventKind(i32),
    #[error("unknown enemy kind {0}")]
    UnknownEnemyKind(i32),
}

/// A spawn scheduled for a simulation time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnEvent {
    pub kind: EnemyKind,
    pub count: i32,
    pub start_time: f32,
}

/// What the worker asks the main thread to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnCmd {
    pub kind: EnemyKind,
    pub count: i32,
}

/// Min-heap entry; BinaryHeap is a max-heap so the ordering is reversed.
struct HeapEntry(SpawnEvent);

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.0.start_time.total_cmp(&other.0.start_time) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other.0.start_time.total_cmp(&self.0.start_time)
    }
}

struct SchedulerState {
    heap: BinaryHeap<HeapEntry>,
    board: MissionBoard,
    sim_time: f32,
    /// True only while the engine is in the game scene and unpaused.
    active: bool,
    running: bool,
}

/// Handle to the event worker. Owned by the engine context.
pub struct EventScheduler {
    shared: Arc<(Mutex<SchedulerState>, Condvar)>,
    rx_spawn: Receiver<SpawnCmd>,
    worker: Option<std::thread::JoinHandle<()>>,
}

impl EventScheduler {
    pub fn spawn() -> Self {
        let shared = Arc::new((
            Mutex::new(SchedulerState {
                heap: BinaryHeap::new(),
                board: MissionBoard::default(),
                sim_time: 0.0,
                active: false,
                running: true,
            }),
            Condvar::new(),
        ));
        let (tx_spawn, rx_spawn) = unbounded::<SpawnCmd>();
        let worker_shared = Arc::clone(&shared);
        let worker = std::thread::Builder::new()
            .name("event-scheduler".into())
            .spawn(move || worker_loop(worker_shared, tx_spawn))
            .expect("failed to spawn event scheduler thread");
        Self {
            shared,
            rx_spawn,
            worker: Some(worker),
        }
    }

    /// Queue a spawn event. Dropped silently after shutdown.
    pub fn add_event(&self, event: SpawnEvent) {
        let (mutex, cv) = &*self.shared;
        let mut state = mutex.lock().expect("scheduler mutex poisoned");
        if !state.running {
            return;
        }
        state.heap.push(HeapEntry(event));
        cv.notify_all();
    }

    /// Register a kill-count mission.
    pub fn add_mission(&self, kind: EnemyKind, count: i32) {
        let (mutex, cv) = &*self.shared;
        let mut state = mutex.lock().expect("scheduler mutex poisoned");
        if !state.running {
            return;
        }
        state.board.add(kind, count);
        cv.notify_all();
    }

    /// Push the simulation clock and the activity flag to the worker.
    /// Called once per frame by the engine.
    pub fn sync_clock(&self, sim_time: f32, active: bool) {
        let (mutex, cv) = &*self.shared;
        let mut state = mutex.lock().expect("scheduler mutex poisoned");
        state.sim_time = sim_time;
        state.active = active;
        cv.notify_all();
    }

    /// Drain spawn commands produced since the last call. Main thread
    /// only; this is the single point where worker output enters the
    /// frame.
    pub fn drain_spawns(&self) -> Vec<SpawnCmd> {
        self.rx_spawn.try_iter().collect()
    }

    /// Report an enemy death; returns true when this kill latched the
    /// win condition.
    pub fn record_kill(&self, kind: EnemyKind) -> bool {
        let (mutex, _) = &*self.shared;
        let mut state = mutex.lock().expect("scheduler mutex poisoned");
        state.board.record_kill(kind)
    }

    pub fn is_win(&self) -> bool {
        let (mutex, _) = &*self.shared;
        let state = mutex.lock().expect("scheduler mutex poisoned");
        state.board.is_win()
    }

    pub fn missions(&self) -> Vec<Mission> {
        let (mutex, _) = &*self.shared;
        let state = mutex.lock().expect("scheduler mutex poisoned");
        state.board.missions().to_vec()
    }

    /// Number of events still waiting.
    pub fn pending_events(&self) -> usize {
        let (mutex, _) = &*self.shared;
        let state = mutex.lock().expect("scheduler mutex poisoned");
        state.heap.len()
    }

    /// Drop all queued events and missions (scene change).
    pub fn clear(&self) {
        let (mutex, _) = &*self.shared;
        let mut state = mutex.lock().expect("scheduler mutex poisoned");
        state.heap.clear();
        state.board.clear();
    }

    /// Serialize pending events and missions to the binary format.
    pub fn save_to_file(&self, path: &Path) -> Result<(), PersistError> {
        let (mutex, _) = &*self.shared;
        let state = mutex.lock().expect("scheduler mutex poisoned");
        let events: Vec<SpawnEvent> = state.heap.iter().map(|e| e.0).collect();
        let missions = state.board.missions().to_vec();
        drop(state);

        let mut buf = Vec::new();
        let count = (events.len() + missions.len()) as i32;
        buf.extend_from_slice(&count.to_le_bytes());
        for ev in &events {
            buf.extend_from_slice(&EVENT_KIND_SPAWN.to_le_bytes());
            buf.extend_from_slice(&ev.kind.to_i32().to_le_bytes());
            buf.extend_from_slice(&ev.count.to_le_bytes());
            buf.extend_from_slice(&ev.start_time.to_le_bytes());
        }
        for m in &missions {
            buf.extend_from_slice(&EVENT_KIND_MISSION.to_le_bytes());
            buf.extend_from_slice(&m.kind.to_i32().to_le_bytes());
            buf.extend_from_slice(&m.total.to_le_bytes());
        }
        fs::write(path, buf)?;
        Ok(())
    }

    /// Replace the scheduler's contents with a persisted file.
    pub fn load_from_file(&self, path: &Path) -> Result<(), PersistError> {
        let bytes = fs::read(path)?;
        let mut cursor = ByteCursor::new(&bytes);
        let count = cursor.read_i32()?;
        let mut events = Vec::new();
        let mut missions = Vec::new();
        for _ in 0..count {
            let event_kind = cursor.read_i32()?;
            match event_kind {
                EVENT_KIND_SPAWN => {
                    let kind = read_enemy_kind(&mut cursor)?;
                    let count = cursor.read_i32()?;
                    let start_time = cursor.read_f32()?;
                    events.push(SpawnEvent {
                        kind,
                        count,
                        start_time,
                    });
                }
                EVENT_KIND_MISSION => {
                    let kind = read_enemy_kind(&mut cursor)?;
                    let count = cursor.read_i32()?;
                    missions.push((kind, count));
                }
                other => return Err(PersistError::UnknownEventKind(other)),
            }
        }

        let (mutex, cv) = &*self.shared;
        let mut state = mutex.lock().expect("scheduler mutex poisoned");
        state.heap.clear();
        state.board.clear();
        for ev in events {
            state.heap.push(HeapEntry(ev));
        }
        for (kind, count) in missions {
            state.board.add(kind, count);
        }
        cv.notify_all();
        Ok(())
    }

    /// Clear the running flag, wake the worker, and join it.
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.worker.take() {
            {
                let (mutex, cv) = &*self.shared;
                let mut state = mutex.lock().expect("scheduler mutex poisoned");
                state.running = false;
                cv.notify_all();
            }
            let _ = handle.join();
        }
    }
}

impl Drop for EventScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn read_enemy_kind(cursor: &mut ByteCursor<'_>) -> Result<EnemyKind, PersistError> {
    let code = cursor.read_i32()?;
    EnemyKind::from_i32(code).ok_or(PersistError::UnknownEnemyKind(code))
}

fn worker_loop(shared: Arc<(Mutex<SchedulerState>, Condvar)>, tx_spawn: Sender<SpawnCmd>) {
    let (mutex, cv) = &*shared;
    let mut state = mutex.lock().expect("scheduler mutex poisoned");
    loop {
        if !state.running {
            break;
        }
        if !state.active {
            let (guard, _) = cv
                .wait_timeout(state, IDLE_WAIT)
                .expect("scheduler mutex poisoned");
            state = guard;
            continue;
        }
        let mut fired = false;
        while let Some(entry) = state.heap.peek() {
            if entry.0.start_time > state.sim_time {
                break;
            }
            let event = state.heap.pop().expect("peeked entry vanished").0;
            info!(
                "scheduler: spawning {} x {:?} (due {:.2}s, now {:.2}s)",
                event.count, event.kind, event.start_time, state.sim_time
            );
            if tx_spawn
                .send(SpawnCmd {
                    kind: event.kind,
                    count: event.count,
                })
                .is_err()
            {
                warn!("scheduler: spawn channel closed, dropping event");
            }
            fired = true;
        }
        if !fired {
            let (guard, _) = cv
                .wait_timeout(state, IDLE_WAIT)
                .expect("scheduler mutex poisoned");
            state = guard;
        }
    }
}

/// Little-endian reader over a byte slice.
struct ByteCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], PersistError> {
        if self.pos + n > self.bytes.len() {
            return Err(PersistError::UnexpectedEof);
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_i32(&mut self) -> Result<i32, PersistError> {
        let b = self.take(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_f32(&mut self) -> Result<f32, PersistError> {
        let b = self.take(4)?;
        Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}
