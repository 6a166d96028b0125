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

mod get;
mod post;
pub mod server;
mod state;
mod template;

#[cfg(test)]
mod tests {
    use std::error::Error;
    use std::fs::read_to_string;
    use std::path::Path;
    use std::time::Duration;

    use portpicker::pick_unused_port;
    use reqwest::StatusCode;
    use tokio::spawn;
    use tokio::time::sleep;

    use crate::cmd::drill::server::ServerConfig;
    use crate::cmd::drill::server::start_server;
    use crate::helper::NOTE;
    use crate::helper::create_sample_vault;
    use crate::helper::create_tmp_vault;
    use crate::utils::wait_for_server;

    type TestResult = Result<(), Box<dyn Error>>;

    const TEST_HOST: &str = "127.0.0.1";

    fn config(directory: &str, port: u16) -> ServerConfig {
        ServerConfig {
            directory: Some(directory.to_string()),
            note: NOTE.to_string(),
            host: TEST_HOST.to_string(),
            port,
        }
    }

    async fn serve(directory: &str) -> Result<u16, Box<dyn Error>> {
        let port = pick_unused_port().ok_or("no free port")?;
        let config = config(directory, port);
        spawn(async move { start_server(config).await });
        wait_for_server(TEST_HOST, port).await?;
        Ok(port)
    }

    async fn act(port: u16, block: usize, action: &str) -> Result<String, Box<dyn Error>> {
        let response = reqwest::Client::new()
            .post(format!("http://{TEST_HOST}:{port}/"))
            .form(&[("block", block.to_string().as_str()), ("action", action)])
            .send()
            .await?;
        assert!(response.status().is_success());
        Ok(response.text().await?)
    }

    fn note(directory: &str) -> Result<String, Box<dyn Error>> {
        Ok(read_to_string(Path::new(directory).join(NOTE))?)
    }

    #[tokio::test]
    async fn test_start_server_on_non_existent_directory() -> TestResult {
        let port = pick_unused_port().ok_or("no free port")?;
        let result = start_server(config("./derpherp", port)).await;
        assert_eq!(
            result.err().map(|e| e.to_string()),
            Some("error: directory does not exist.".to_string())
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_start_server_on_missing_note() -> TestResult {
        let port = pick_unused_port().ok_or("no free port")?;
        let directory = create_tmp_vault(&[])?;
        let result = start_server(config(&directory, port)).await;
        assert_eq!(
            result.err().map(|e| e.to_string()),
            Some("error: note does not exist.".to_string())
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_start_server_without_blocks() -> TestResult {
        let port = pick_unused_port().ok_or("no free port")?;
        let directory = create_tmp_vault(&[(NOTE, "# Nothing to drill\n")])?;
        start_server(config(&directory, port)).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_e2e() -> TestResult {
        let directory = create_sample_vault()?;
        let port = serve(&directory).await?;

        // Hit the `style.css` endpoint.
        let response = reqwest::get(format!("http://{TEST_HOST}:{port}/style.css")).await?;
        assert!(response.status().is_success());
        assert_eq!(
            response.headers().get("content-type").map(|v| v.as_bytes()),
            Some(b"text/css".as_slice())
        );

        // Hit the not found endpoint.
        let response = reqwest::get(format!("http://{TEST_HOST}:{port}/herp-derp")).await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        // Opening the card block stamped an id into it.
        assert!(note(&directory)?.contains("```voca-card id:"));

        // Hit the root endpoint.
        let response = reqwest::get(format!("http://{TEST_HOST}:{port}/")).await?;
        assert!(response.status().is_success());
        let html = response.text().await?;
        assert!(html.contains("words.md"));
        assert!(html.contains("class=\"answer blurred\""));
        assert!(html.contains("a small feline") || html.contains("a loyal canine"));
        assert!(html.contains("a flowerless plant"));

        // Hit reveal.
        let html = act(port, 0, "Reveal").await?;
        assert!(!html.contains("answer blurred"));

        // Hit 'I know'.
        let html = act(port, 0, "Right").await?;
        assert!(html.contains("answer blurred"));
        let data = read_to_string(Path::new(&directory).join(".vocacards/data.json"))?;
        assert!(data.contains("\"r\": 1"));

        // Switch the table to a card view.
        act(port, 1, "Switch").await?;
        assert!(note(&directory)?.contains("```voca-card id:42"));

        Ok(())
    }

    #[tokio::test]
    async fn test_single_card() -> TestResult {
        let directory = create_tmp_vault(&[(NOTE, "```voca-card\n```\ncat: gato\n")])?;
        let port = serve(&directory).await?;
        let html = act(port, 0, "Right").await?;
        assert!(html.contains("Only one card"));
        // Notices are shown once.
        let html = reqwest::get(format!("http://{TEST_HOST}:{port}/")).await?.text().await?;
        assert!(!html.contains("Only one card"));
        Ok(())
    }

    #[tokio::test]
    async fn test_auto_mode() -> TestResult {
        let data = r#"{"showTime": 1, "explainTime": 5}"#;
        let directory = create_tmp_vault(&[
            (NOTE, "```voca-card\n```\ncat: gato\ndog: perro\n"),
            (".vocacards/data.json", data),
        ])?;
        let port = serve(&directory).await?;

        let html = act(port, 0, "Auto").await?;
        assert!(html.contains("http-equiv=\"refresh\""));
        assert!(html.contains(">Stop<"));
        assert!(html.contains("answer blurred"));

        // Buttons are disabled by default while automatic mode runs.
        let html = act(port, 0, "Right").await?;
        assert!(html.contains("Buttons are disabled in automatic mode"));

        // The answer is revealed after `showTime`.
        sleep(Duration::from_millis(1500)).await;
        let html = reqwest::get(format!("http://{TEST_HOST}:{port}/")).await?.text().await?;
        assert!(!html.contains("answer blurred"));

        let html = act(port, 0, "Auto").await?;
        assert!(!html.contains("http-equiv=\"refresh\""));
        assert!(html.contains(">Auto<"));
        Ok(())
    }

    #[tokio::test]
    async fn test_shutdown() -> TestResult {
        let directory = create_sample_vault()?;
        let port = pick_unused_port().ok_or("no free port")?;
        let server = spawn(start_server(config(&directory, port)));
        wait_for_server(TEST_HOST, port).await?;
        let html = act(port, 0, "Shutdown").await?;
        assert!(html.contains("Server stopped."));
        server.await??;
        Ok(())
    }
}
