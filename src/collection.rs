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

//! The vault on disk: a directory of Markdown notes plus the settings file.

use std::env::current_dir;
use std::fs::create_dir_all;
use std::fs::read_to_string;
use std::fs::rename;
use std::fs::write;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use vocacards_core::ErrorReport;
use vocacards_core::Fallible;
use vocacards_core::Host;
use vocacards_core::Plugin;
use vocacards_core::Settings;
use vocacards_core::SettingsStore;
use vocacards_core::TinyRng;
use vocacards_core::fail;
use vocacards_core::host::SystemClock;
use walkdir::DirEntry;
use walkdir::WalkDir;

use crate::utils::seed;

/// Directory inside the vault holding plugin data.
const DATA_DIR: &str = ".vocacards";

const DATA_FILE: &str = "data.json";

pub struct Collection {
    pub directory: PathBuf,
}

impl Collection {
    /// Open the vault at `directory`, or at the current working directory.
    pub fn new(directory: Option<String>) -> Fallible<Self> {
        let directory: PathBuf = match directory {
            Some(dir) => PathBuf::from(dir),
            None => current_dir()?,
        };
        if !directory.is_dir() {
            return fail("directory does not exist.");
        }
        let directory = directory.canonicalize()?;
        log::debug!("Opened vault at {}", directory.display());
        Ok(Self { directory })
    }

    pub fn vault(&self) -> FsVault {
        FsVault::new(self.directory.clone())
    }

    pub fn store(&self) -> JsonFileStore {
        JsonFileStore::new(&self.directory)
    }

    pub fn plugin(&self) -> Fallible<Plugin> {
        Plugin::load(
            self.vault(),
            self.store(),
            TinyRng::from_seed(seed()),
            SystemClock,
        )
    }
}

/// Markdown notes under a directory. Paths are relative to the root and use
/// `/` as the separator.
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn resolve(&self, path: &str) -> Fallible<PathBuf> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return fail(format!("{path} is outside the vault."));
        }
        Ok(self.root.join(relative))
    }
}

impl Host for FsVault {
    fn documents(&self) -> Fallible<Vec<String>> {
        let mut paths = Vec::new();
        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));
        for entry in walker {
            let entry =
                entry.map_err(|e| ErrorReport::new(format!("cannot walk the vault: {e}")))?;
            let is_note = entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == "md");
            if !is_note {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .map_err(|e| ErrorReport::new(e.to_string()))?;
            paths.push(relative.to_string_lossy().replace('\\', "/"));
        }
        Ok(paths)
    }

    fn read(&self, path: &str) -> Fallible<String> {
        Ok(read_to_string(self.resolve(path)?)?)
    }

    fn process(&mut self, path: &str, edit: &mut dyn FnMut(&str) -> String) -> Fallible<()> {
        let full = self.resolve(path)?;
        let text = read_to_string(&full)?;
        let edited = edit(&text);
        if edited == text {
            return Ok(());
        }
        write_atomic(&full, &edited)?;
        log::debug!("Rewrote {path}");
        Ok(())
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Write through a temporary file in the same directory, then rename it over
/// the target.
fn write_atomic(path: &Path, contents: &str) -> Fallible<()> {
    let Some(name) = path.file_name() else {
        return fail(format!("{} is not a file path.", path.display()));
    };
    let tmp = path.with_file_name(format!(".{}.tmp", name.to_string_lossy()));
    write(&tmp, contents)?;
    rename(&tmp, path)?;
    Ok(())
}

/// Settings persisted as JSON at `<vault>/.vocacards/data.json`.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: &Path) -> Self {
        Self {
            path: root.join(DATA_DIR).join(DATA_FILE),
        }
    }
}

impl SettingsStore for JsonFileStore {
    fn load(&self) -> Fallible<Option<serde_json::Value>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    fn save(&mut self, settings: &Settings) -> Fallible<()> {
        if let Some(parent) = self.path.parent() {
            create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(settings)?;
        write_atomic(&self.path, &text)
    }
}

#[cfg(test)]
mod tests {
    use vocacards_core::BlockId;
    use vocacards_core::StatRecord;

    use super::*;
    use crate::helper::create_tmp_vault;

    #[test]
    fn test_missing_directory() {
        let result = Collection::new(Some("./derpherp".to_string()));
        assert!(result.is_err());
        assert_eq!(
            result.err().map(|e| e.to_string()),
            Some("error: directory does not exist.".to_string())
        );
    }

    #[test]
    fn test_documents() -> Fallible<()> {
        let dir = create_tmp_vault(&[
            ("b.md", "b"),
            ("a.md", "a"),
            ("sub/c.md", "c"),
            ("notes.txt", "x"),
            (".vocacards/hidden.md", "x"),
        ])?;
        let vault = Collection::new(Some(dir))?.vault();
        assert_eq!(vault.documents()?, vec!["a.md", "b.md", "sub/c.md"]);
        assert_eq!(vault.read("sub/c.md")?, "c");
        Ok(())
    }

    #[test]
    fn test_process() -> Fallible<()> {
        let dir = create_tmp_vault(&[("a.md", "one\n")])?;
        let mut vault = Collection::new(Some(dir))?.vault();
        vault.process("a.md", &mut |text: &str| text.replace("one", "two"))?;
        assert_eq!(vault.read("a.md")?, "two\n");
        vault.process("a.md", &mut |text: &str| text.to_string())?;
        assert_eq!(vault.read("a.md")?, "two\n");
        Ok(())
    }

    #[test]
    fn test_paths_stay_inside_the_vault() -> Fallible<()> {
        let dir = create_tmp_vault(&[("a.md", "a")])?;
        let vault = Collection::new(Some(dir))?.vault();
        assert!(vault.read("../a.md").is_err());
        assert!(vault.read("/etc/passwd").is_err());
        Ok(())
    }

    #[test]
    fn test_store_round_trip() -> Fallible<()> {
        let dir = create_tmp_vault(&[])?;
        let collection = Collection::new(Some(dir))?;
        let mut store = collection.store();
        assert_eq!(store.load()?, None);

        let mut settings = Settings::default();
        settings
            .stats
            .entry(BlockId::from_millis(5))
            .or_default()
            .insert("cat".to_string(), StatRecord::new(1, 0));
        settings.set_show_time(4.5);
        store.save(&settings)?;

        assert!(collection.directory.join(".vocacards/data.json").exists());
        assert_eq!(Settings::from_value(store.load()?), settings);
        Ok(())
    }
}
