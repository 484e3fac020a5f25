use retail_assistant::config::{Config, MemoryBackend};
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Configuration pointing the model and product search at `server`
///
/// Store and policy tools are left unconfigured.
#[allow(dead_code)]
pub fn config_for(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.provider.ollama.host = server.uri();
    config.provider.timeout_seconds = 5;
    config.memory.backend = MemoryBackend::Memory;
    config.tools.timeout_seconds = 5;
    config.tools.product_search_url = Some(format!("{}/products/search", server.uri()));
    config.tools.store_locator_url = None;
    config.tools.policy_search_url = None;
    config
}

/// Ollama `/api/chat` body with plain content
#[allow(dead_code)]
pub fn ollama_reply(content: &str) -> Value {
    json!({
        "message": {"role": "assistant", "content": content},
        "done": true,
        "prompt_eval_count": 40,
        "eval_count": 10
    })
}

/// Ollama `/api/chat` body requesting one tool call
#[allow(dead_code)]
pub fn ollama_tool_call(name: &str, arguments: Value) -> Value {
    json!({
        "message": {
            "role": "assistant",
            "content": "",
            "tool_calls": [{"function": {"name": name, "arguments": arguments}}]
        },
        "done": true
    })
}

/// Answer the next `times` model calls with `body`
#[allow(dead_code)]
pub async fn mount_model_reply(server: &MockServer, body: Value, times: u64) {
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .up_to_n_times(times)
        .mount(server)
        .await;
}
