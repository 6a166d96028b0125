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

use crate::block::BlockRef;
use crate::error::Fallible;
use crate::host::Clock;
use crate::host::Host;
use crate::rng::RandomSource;
use crate::session::Session;
use crate::settings::Settings;
use crate::settings::SettingsStore;
use crate::settings::StudyConfig;
use crate::stats::IdMinter;
use crate::stats::SweepReport;
use crate::stats::sweep_stats;

/// Process-wide state shared by every rendered block: the host seams, the
/// loaded settings and the study options.
pub struct Plugin {
    pub(crate) host: Box<dyn Host + Send>,
    pub(crate) store: Box<dyn SettingsStore + Send>,
    pub(crate) rng: Box<dyn RandomSource + Send>,
    pub(crate) clock: Box<dyn Clock + Send>,
    pub(crate) minter: IdMinter,
    pub(crate) settings: Settings,
    pub(crate) config: StudyConfig,
}

impl Plugin {
    /// Load the settings from `store` and set up the plugin.
    pub fn load(
        host: impl Host + Send + 'static,
        store: impl SettingsStore + Send + 'static,
        rng: impl RandomSource + Send + 'static,
        clock: impl Clock + Send + 'static,
    ) -> Fallible<Self> {
        let settings = Settings::from_value(store.load()?);
        log::debug!("Loaded settings with stats for {} blocks", settings.stats.len());
        Ok(Self {
            host: Box::new(host),
            store: Box::new(store),
            rng: Box::new(rng),
            clock: Box::new(clock),
            minter: IdMinter::new(),
            settings,
            config: StudyConfig::default(),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn config(&self) -> StudyConfig {
        self.config
    }

    pub fn host(&self) -> &dyn Host {
        &*self.host
    }

    /// Change the settings and persist them.
    #[cfg(test)]
    pub(crate) fn update_settings(&mut self, edit: impl FnOnce(&mut Settings)) -> Fallible<()> {
        edit(&mut self.settings);
        self.store.save(&self.settings)
    }

    /// Render a block for the first time.
    pub fn open(&mut self, block: BlockRef) -> Fallible<Session> {
        Session::open(self, block)
    }

    /// Delete the stats of blocks that no longer exist in any document.
    pub fn cleanup_stats(&mut self) -> Fallible<SweepReport> {
        sweep_stats(&*self.host, &mut self.settings, &mut *self.store)
    }
}
