use repodoc::generator::{GeminiClient, API_KEY_ENV};
use repodoc::load_config::GeneratorSection;
use repodoc_core::analyze::{analyze, FileRecord};
use repodoc_core::config::AnalysisConfig;
use repodoc_core::context::RepositoryContext;
use repodoc_core::contract::DocGenerator;
use repodoc_core::tables::LanguageTables;
use serial_test::serial;
use std::env;
use std::fs::write;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const TEST_KEY: &str = "test-key-0123456789abcdef";

fn sample_record(dir: &TempDir) -> FileRecord {
    let path = dir.path().join("main.py");
    write(&path, "import os\n\ndef main():\n    print(os.getcwd())\n").unwrap();
    analyze(
        &path,
        dir.path(),
        &AnalysisConfig::default(),
        &LanguageTables::default(),
    )
    .expect("sample file analyses")
}

/// Serve exactly one HTTP request with a canned response; hand back the raw request.
async fn serve_once(status_line: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}/v1beta", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&request);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|l| {
                        let lower = l.to_ascii_lowercase();
                        lower
                            .strip_prefix("content-length:")
                            .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                    })
                    .unwrap_or(0);
                if request.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        let response = format!(
            "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        String::from_utf8_lossy(&request).into_owned()
    });

    (endpoint, handle)
}

fn settings(endpoint: String) -> GeneratorSection {
    GeneratorSection {
        endpoint,
        model: "test-model".to_string(),
        timeout_secs: 5,
        ..GeneratorSection::default()
    }
}

#[tokio::test]
async fn generate_posts_prompt_and_joins_candidate_parts() {
    let (endpoint, server) = serve_once(
        "HTTP/1.1 200 OK",
        r###"{"candidates":[{"content":{"parts":[{"text":"## main.py\n"},{"text":"Prints the cwd."}]}}]}"###,
    )
    .await;
    let dir = TempDir::new().unwrap();
    let record = sample_record(&dir);
    let client = GeminiClient::new(settings(endpoint), TEST_KEY.to_string()).unwrap();

    let markdown = client
        .generate(&record, &RepositoryContext::default())
        .await
        .expect("generation succeeds");

    assert_eq!(markdown, "## main.py\nPrints the cwd.");
    let request = server.await.unwrap();
    assert!(request.starts_with("POST /v1beta/models/test-model:generateContent"));
    assert!(request.to_ascii_lowercase().contains(&format!("x-goog-api-key: {TEST_KEY}")));
    assert!(request.contains("generationConfig"));
    assert!(request.contains("maxOutputTokens"));
    assert!(request.contains("main.py"));
}

#[tokio::test]
async fn generate_maps_error_status_to_generation_error() {
    let (endpoint, server) = serve_once(
        "HTTP/1.1 429 Too Many Requests",
        r#"{"error":{"message":"quota"}}"#,
    )
    .await;
    let dir = TempDir::new().unwrap();
    let record = sample_record(&dir);
    let client = GeminiClient::new(settings(endpoint), TEST_KEY.to_string()).unwrap();

    let err = client
        .generate(&record, &RepositoryContext::default())
        .await
        .expect_err("429 is an error");

    assert!(err.0.contains("429"), "unexpected error: {}", err.0);
    server.await.unwrap();
}

#[tokio::test]
async fn generate_rejects_empty_candidates() {
    let (endpoint, server) = serve_once("HTTP/1.1 200 OK", r#"{"candidates":[]}"#).await;
    let dir = TempDir::new().unwrap();
    let record = sample_record(&dir);
    let client = GeminiClient::new(settings(endpoint), TEST_KEY.to_string()).unwrap();

    let result = client
        .generate(&record, &RepositoryContext::default())
        .await;

    assert!(result.is_err());
    server.await.unwrap();
}

#[test]
#[serial]
fn new_from_env_requires_key() {
    let saved = env::var(API_KEY_ENV).ok();
    env::remove_var(API_KEY_ENV);

    let result = GeminiClient::new_from_env(GeneratorSection::default());

    if let Some(value) = saved {
        env::set_var(API_KEY_ENV, value);
    }
    let err = result.err().expect("missing key is an error");
    assert!(err.to_string().contains(API_KEY_ENV));
}

#[test]
#[serial]
fn new_from_env_reads_key() {
    let saved = env::var(API_KEY_ENV).ok();
    env::set_var(API_KEY_ENV, TEST_KEY);

    let result = GeminiClient::new_from_env(GeneratorSection::default());

    match saved {
        Some(value) => env::set_var(API_KEY_ENV, value),
        None => env::remove_var(API_KEY_ENV),
    }
    assert!(result.is_ok());
}
