use std::io::Write;
use std::net::SocketAddr;

use hive_config::{load, Codec, ConfigError, LoaderOptions, Source};
use serde_json::json;
use tempfile::NamedTempFile;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

fn write_config(suffix: &str, text: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[tokio::test]
async fn test_load_json_file_with_template() {
    let file = write_config(
        ".json",
        r#"// demo service
{
    "Context": { "Http": { "Port": 8000 } },
    "Components": [
        { "Name": "eventsystem", "UUID": "events" },
        {
            "Name": "httpserver",
            "UUID": "web",
            // listen one above the base port
            "Options": { "Addr": ":{{ .Http.Port | add 1 }}" }
        },
        { "Name": "auth", "Refs": { "HTTPServer": "web", "EventSystem": "events" } }
    ]
}
"#,
    );

    let source = Source::parse(file.path().to_str().unwrap());
    let options = LoaderOptions::default().with_template(true);
    let document = load(&source, options).await.unwrap();

    let names: Vec<_> = document.components.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["eventsystem", "httpserver", "auth"]);
    assert_eq!(document.components[1].options, json!({ "Addr": ":8001" }));
    assert_eq!(document.components[2].uuid, "auth");
}

#[tokio::test]
async fn test_load_toml_file_by_extension() {
    let file = write_config(
        ".toml",
        r#"
[[Components]]
Name = "logger"

[Components.Options]
Level = "warn"
"#,
    );

    let source = Source::parse(file.path().to_str().unwrap());
    let codec = source.codec_hint().unwrap_or_default();
    assert_eq!(codec, Codec::TOML);

    let document = load(&source, LoaderOptions::default().with_codec(codec))
        .await
        .unwrap();
    assert_eq!(document.components[0].options, json!({ "Level": "warn" }));
}

#[tokio::test]
async fn test_load_yaml_file_by_extension() {
    let file = write_config(
        ".yml",
        r#"
Components:
  - Name: eventsystem
    UUID: events
    Options:
      Ordered: false
  - Name: users
    Refs:
      EventSystem: events
"#,
    );

    let source = Source::parse(file.path().to_str().unwrap());
    let codec = source.codec_hint().unwrap_or_default();
    assert_eq!(codec, Codec::YAML);

    let document = load(&source, LoaderOptions::default().with_codec(codec))
        .await
        .unwrap();
    assert_eq!(document.components[0].options, json!({ "Ordered": false }));
    assert_eq!(document.components[1].uuid, "users");
}

/// Serve `body` at `path` over plain HTTP/1.1; any other path is a 404.
async fn serve_config(path: &'static str, body: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let mut buf = vec![0u8; 4096];
            let n = stream.read(&mut buf).await.unwrap_or(0);
            let request = String::from_utf8_lossy(&buf[..n]);
            let target = request.split_whitespace().nth(1).unwrap_or("");
            let (status, body) = if target == path {
                ("200 OK", body)
            } else {
                ("404 Not Found", "not found")
            };
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });
    addr
}

#[tokio::test]
async fn test_load_from_url() {
    let addr = serve_config("/app.json", "// fetched\n{\"Components\":[{\"Name\":\"x\"}]}").await;

    let source = Source::parse(&format!("http://{addr}/app.json"));
    assert!(matches!(source, Source::Url(_)));
    let document = load(&source, LoaderOptions::default()).await.unwrap();
    assert_eq!(document.components.len(), 1);
    assert_eq!(document.components[0].uuid, "x");
}

#[tokio::test]
async fn test_url_not_found_is_a_fetch_error() {
    let addr = serve_config("/app.json", "{}").await;

    let source = Source::parse(&format!("http://{addr}/missing.json"));
    let err = load(&source, LoaderOptions::default()).await.unwrap_err();
    assert!(matches!(err, ConfigError::Fetch { .. }), "{err}");
    assert!(err.to_string().contains("missing.json"), "{err}");
}

#[tokio::test]
async fn test_missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let source = Source::parse(dir.path().join("absent.json").to_str().unwrap());
    let err = load(&source, LoaderOptions::default()).await.unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[tokio::test]
async fn test_decode_error_reports_original_line() {
    let file = write_config(
        ".json",
        "// one\n// two\n{\n  \"Components\": [\n    { \"Name\": }\n  ]\n}\n",
    );
    let source = Source::parse(file.path().to_str().unwrap());
    let err = load(&source, LoaderOptions::default()).await.unwrap_err();
    assert_eq!(err.location().map(|l| l.line), Some(5));
    assert!(err.to_string().contains("line 5"), "{err}");
}
