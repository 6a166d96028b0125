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

use vocacards_core::Fallible;
use vocacards_core::SweepReport;

use crate::collection::Collection;

pub fn clean_stats(directory: Option<String>) -> Fallible<()> {
    let mut plugin = Collection::new(directory)?.plugin()?;
    let report = plugin.cleanup_stats()?;
    print!("{}", summarize(&report));
    Ok(())
}

fn summarize(report: &SweepReport) -> String {
    let mut out = String::new();
    for path in &report.unreadable {
        out.push_str(&format!("Skipped unreadable note {path}.\n"));
    }
    if report.removed.is_empty() {
        out.push_str("Nothing to clean.\n");
        return out;
    }
    for id in &report.removed {
        out.push_str(&format!("{id}\n"));
    }
    out.push_str(&format!("Stats cleaned: {} blocks.\n", report.removed.len()));
    out
}
