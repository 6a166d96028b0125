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

use std::process::exit;

use clap::Parser;
use tokio::spawn;
use vocacards_core::Fallible;

use crate::cmd::check::check_collection;
use crate::cmd::clean::clean_stats;
use crate::cmd::drill::server::ServerConfig;
use crate::cmd::drill::server::start_server;
use crate::cmd::stats::StatsFormat;
use crate::cmd::stats::print_stats;
use crate::cmd::table::print_tables;
use crate::utils::wait_for_server;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Drill the vocabulary blocks of a note through a web interface.
    Drill {
        /// Path of the note, relative to the vault.
        note: String,
        /// Path to the vault directory. By default, the current working directory is used.
        #[arg(long)]
        vault: Option<String>,
        /// The host address to bind to. Default is 127.0.0.1.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// The port to use for the web server. Default is 8000.
        #[arg(long, default_value_t = 8000)]
        port: u16,
        /// Whether to open the browser automatically. Default is true.
        #[arg(long)]
        open_browser: Option<bool>,
    },
    /// Print the vocabulary blocks of a note as tables.
    Table {
        /// Path of the note, relative to the vault.
        note: String,
        /// Path to the vault directory. By default, the current working directory is used.
        #[arg(long)]
        vault: Option<String>,
    },
    /// Check that every vocabulary block in the vault is well-formed.
    Check {
        /// Path to the vault directory. By default, the current working directory is used.
        directory: Option<String>,
    },
    /// Delete the stats of blocks that no longer exist.
    Clean {
        /// Path to the vault directory. By default, the current working directory is used.
        directory: Option<String>,
    },
    /// Print per-block answer statistics.
    Stats {
        /// Path to the vault directory. By default, the current working directory is used.
        directory: Option<String>,
        /// Which output format to use.
        #[arg(long, default_value_t = StatsFormat::Text)]
        format: StatsFormat,
    },
}

pub async fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::Drill {
            note,
            vault,
            host,
            port,
            open_browser,
        } => {
            if open_browser.unwrap_or(true) {
                // Start a separate task to open the browser once the server is up.
                let browser_host = host.clone();
                spawn(async move {
                    match wait_for_server(&browser_host, port).await {
                        Ok(_) => {
                            let _ = open::that(format!("http://{browser_host}:{port}/"));
                        }
                        Err(e) => {
                            eprintln!("Failed to connect to server: {e}");
                            exit(-1)
                        }
                    }
                });
            }
            let config = ServerConfig {
                directory: vault,
                note,
                host,
                port,
            };
            start_server(config).await
        }
        Command::Table { note, vault } => print_tables(vault, &note),
        Command::Check { directory } => check_collection(directory),
        Command::Clean { directory } => clean_stats(directory),
        Command::Stats { directory, format } => print_stats(directory, format),
    }
}
