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

use std::fs::create_dir_all;
use std::fs::write;

use tempfile::tempdir;
use vocacards_core::Fallible;

pub const NOTE: &str = "words.md";

pub const NOTE_TEXT: &str = "# Animals

```voca-card
```
- cat [kæt]: a small feline
- dog: a loyal canine

## Plants

```voca-table id:42
```
fern: a flowerless plant
";

/// Create a vault in a temporary directory holding `files`, and return its
/// path. The directory outlives the test.
pub fn create_tmp_vault(files: &[(&str, &str)]) -> Fallible<String> {
    let dir = tempdir()?.keep().canonicalize()?;
    for (path, text) in files {
        let path = dir.join(path);
        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }
        write(path, text)?;
    }
    Ok(dir.display().to_string())
}

/// A vault holding the sample note.
pub fn create_sample_vault() -> Fallible<String> {
    create_tmp_vault(&[(NOTE, NOTE_TEXT)])
}
