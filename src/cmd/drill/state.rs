// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use tokio::spawn;
use tokio::sync::oneshot::Sender;
use tokio::task::JoinHandle;
use tokio::task::id;
use tokio::time::sleep;
use vocacards_core::Command;
use vocacards_core::Outcome;
use vocacards_core::Plugin;
use vocacards_core::Scheduled;
use vocacards_core::Session;

#[derive(Clone)]
pub struct ServerState {
    pub note: String,
    pub mutable: Arc<Mutex<MutableState>>,
    pub shutdown_tx: Arc<Mutex<Option<Sender<()>>>>,
}

pub struct MutableState {
    pub plugin: Plugin,
    pub blocks: Vec<BlockState>,
}

/// A rendered block and its pending automatic-mode timer.
pub struct BlockState {
    pub session: Session,
    pub timer: Option<JoinHandle<()>>,
    /// Messages not yet shown to the user.
    pub notices: Vec<String>,
}

impl ServerState {
    pub fn lock(&self) -> MutexGuard<'_, MutableState> {
        self.mutable.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn shutdown(&self) {
        let sender = self
            .shutdown_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(tx) = sender {
            let _ = tx.send(());
        }
    }
}

impl MutableState {
    /// Run a command on the block at `index` and carry out its outcome.
    pub fn run(&mut self, state: &ServerState, index: usize, command: Command) {
        let Some(block) = self.blocks.get_mut(index) else {
            log::warn!("No block {index} to run {command:?} on");
            return;
        };
        match block.session.handle(&mut self.plugin, command) {
            Ok(outcome) => block.apply(state, index, outcome),
            Err(e) => block.notices.push(e.message().to_string()),
        }
    }

    /// Abort every pending timer.
    pub fn stop_timers(&mut self) {
        for block in self.blocks.iter_mut() {
            if let Some(timer) = block.timer.take() {
                timer.abort();
            }
        }
    }
}

impl BlockState {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            timer: None,
            notices: Vec::new(),
        }
    }

    fn apply(&mut self, state: &ServerState, index: usize, outcome: Outcome) {
        if outcome.cancel.is_some() || outcome.schedule.is_some() {
            if let Some(timer) = self.timer.take() {
                timer.abort();
            }
        }
        if let Some(scheduled) = outcome.schedule {
            self.timer = Some(schedule(state.clone(), index, scheduled));
        }
        self.notices
            .extend(outcome.notices.iter().map(|notice| notice.to_string()));
    }
}

/// Send `Tick` to the block once the delay elapses.
fn schedule(state: ServerState, index: usize, scheduled: Scheduled) -> JoinHandle<()> {
    spawn(async move {
        sleep(scheduled.after).await;
        let mut mutable = state.lock();
        if let Some(block) = mutable.blocks.get_mut(index) {
            // Forget our own handle before the tick schedules the next one.
            if block.timer.as_ref().map(JoinHandle::id) == Some(id()) {
                block.timer = None;
            }
        }
        mutable.run(&state, index, Command::Tick(scheduled.ticket));
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::oneshot;
    use vocacards_core::BlockRef;
    use vocacards_core::Fallible;
    use vocacards_core::MemoryStore;
    use vocacards_core::MemoryVault;
    use vocacards_core::TinyRng;
    use vocacards_core::host::FixedClock;

    use super::*;
    use crate::helper::NOTE;
    use crate::helper::NOTE_TEXT;

    fn server_state() -> Fallible<ServerState> {
        let mut vault = MemoryVault::new();
        vault.insert(NOTE, NOTE_TEXT);
        let mut plugin =
            Plugin::load(vault, MemoryStore::new(), TinyRng::from_seed(0), FixedClock(0))?;
        let session = plugin.open(BlockRef::new(NOTE, 0))?;
        let (shutdown_tx, _) = oneshot::channel();
        Ok(ServerState {
            note: NOTE.to_string(),
            mutable: Arc::new(Mutex::new(MutableState {
                plugin,
                blocks: vec![BlockState::new(session)],
            })),
            shutdown_tx: Arc::new(Mutex::new(Some(shutdown_tx))),
        })
    }

    /// A tick for a cycle that has already been switched off.
    fn stale_tick(state: &ServerState) -> Fallible<Scheduled> {
        let mut guard = state.lock();
        let MutableState { plugin, blocks } = &mut *guard;
        let session = &mut blocks[0].session;
        let outcome = session.handle(plugin, Command::ToggleAuto)?;
        session.handle(plugin, Command::ToggleAuto)?;
        let Some(scheduled) = outcome.schedule else {
            panic!("automatic mode did not start");
        };
        Ok(Scheduled {
            ticket: scheduled.ticket,
            after: Duration::ZERO,
        })
    }

    #[tokio::test]
    async fn test_fired_timer_keeps_newer_handle() -> Fallible<()> {
        let state = server_state()?;
        let tick = stale_tick(&state)?;
        let newer = spawn(sleep(Duration::from_secs(3600)));
        let newer_id = newer.id();
        state.lock().blocks[0].timer = Some(newer);
        let fired = schedule(state.clone(), 0, tick);
        let _ = fired.await;
        let mut mutable = state.lock();
        assert_eq!(
            mutable.blocks[0].timer.as_ref().map(JoinHandle::id),
            Some(newer_id)
        );
        mutable.stop_timers();
        assert!(mutable.blocks[0].timer.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_fired_timer_clears_own_handle() -> Fallible<()> {
        let state = server_state()?;
        let tick = stale_tick(&state)?;
        let timer = schedule(state.clone(), 0, tick);
        state.lock().blocks[0].timer = Some(timer);
        for _ in 0..100 {
            if state.lock().blocks[0].timer.is_none() {
                return Ok(());
            }
            sleep(Duration::from_millis(10)).await;
        }
        panic!("timer handle was never cleared");
    }
}
