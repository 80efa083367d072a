use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn aichat_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("aichat"));
    cmd.env_remove("CHAT_PROVIDER")
        .env_remove("GROQ_API_KEY")
        .env_remove("OPENAI_API_KEY")
        .env_remove("ANTHROPIC_API_KEY")
        .env_remove("GROQ_MODEL")
        .env_remove("OPENAI_MODEL")
        .env_remove("ANTHROPIC_MODEL")
        .env_remove("OLLAMA_MODEL")
        .env_remove("AICHAT_CONFIG")
        .env_remove("AICHAT_LOG");
    cmd
}

fn unique_temp_path(label: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    std::env::temp_dir().join(format!("aichat-test-{label}-{nanos}"))
}

#[test]
fn unsupported_provider_from_env_fails_construction() {
    aichat_cmd()
        .env("CHAT_PROVIDER", "mistral")
        .write_stdin("exit\n")
        .assert()
        .failure()
        .stderr(contains(
            "Unsupported provider 'mistral'. Supported values: groq, openai, anthropic, ollama.",
        ));
}

#[test]
fn unsupported_provider_from_flag_fails_construction() {
    aichat_cmd()
        .args(["--provider", "bard"])
        .write_stdin("exit\n")
        .assert()
        .failure()
        .stderr(contains("Unsupported provider 'bard'"));
}

#[test]
fn default_provider_without_key_names_the_variable() {
    aichat_cmd()
        .write_stdin("exit\n")
        .assert()
        .failure()
        .stderr(contains("GROQ_API_KEY not set!").and(contains(".env file")));
}

#[test]
fn anthropic_without_key_names_its_variable() {
    aichat_cmd()
        .env("CHAT_PROVIDER", "anthropic")
        .env("GROQ_API_KEY", "unused")
        .write_stdin("exit\n")
        .assert()
        .failure()
        .stderr(contains("ANTHROPIC_API_KEY not set!"));
}

#[test]
fn ollama_session_starts_without_any_credentials() {
    aichat_cmd()
        .env("CHAT_PROVIDER", "ollama")
        .write_stdin("exit\n")
        .assert()
        .success()
        .stdout(contains("OLLAMA Active").and(contains("Goodbye!")));
}

#[test]
fn provider_command_reports_model_override() {
    aichat_cmd()
        .env("CHAT_PROVIDER", "ollama")
        .env("OLLAMA_MODEL", "qwen2.5")
        .write_stdin("/provider\nquit\n")
        .assert()
        .success()
        .stdout(contains("Provider: ollama (model: qwen2.5)"));
}

#[test]
fn help_and_clear_commands_keep_the_session_open() {
    aichat_cmd()
        .args(["--provider", "ollama"])
        .write_stdin("/help\n/clear\nbye\n")
        .assert()
        .success()
        .stdout(
            contains("/provider")
                .and(contains("Chat cleared!"))
                .and(contains("Goodbye!")),
        );
}

#[test]
fn end_of_input_exits_cleanly() {
    aichat_cmd()
        .args(["--provider", "ollama"])
        .write_stdin("")
        .assert()
        .success()
        .stdout(contains("Goodbye!"));
}

#[test]
fn config_check_for_ollama_needs_no_key() {
    aichat_cmd()
        .env("CHAT_PROVIDER", "ollama")
        .args(["config", "check"])
        .assert()
        .success()
        .stdout(
            contains("provider: ollama")
                .and(contains("model: llama3.1"))
                .and(contains("api key: not needed")),
        );
}

#[test]
fn config_check_does_not_leak_api_key() {
    let secret = "gsk-secret-value";

    aichat_cmd()
        .env("GROQ_API_KEY", secret)
        .args(["config", "check", "--verbose"])
        .assert()
        .success()
        .stdout(contains("GROQ_API_KEY: set").and(contains(secret).not()))
        .stderr(contains(secret).not());
}

#[test]
fn config_check_reports_missing_key() {
    aichat_cmd()
        .env("CHAT_PROVIDER", "openai")
        .args(["config", "check"])
        .assert()
        .success()
        .stdout(
            contains("provider: openai")
                .and(contains("model: gpt-4o-mini"))
                .and(contains("OPENAI_API_KEY: not set")),
        );
}

#[test]
fn config_check_honors_root_provider_flag() {
    aichat_cmd()
        .args(["--provider", "ollama", "config", "check"])
        .assert()
        .success()
        .stdout(
            contains("provider: ollama")
                .and(contains("model: llama3.1"))
                .and(contains("api key: not needed")),
        );
}

#[test]
fn config_check_honors_root_model_flag() {
    aichat_cmd()
        .env("GROQ_API_KEY", "gsk")
        .args(["--model", "llama-3.3-70b-versatile", "config", "check"])
        .assert()
        .success()
        .stdout(contains("provider: groq").and(contains("model: llama-3.3-70b-versatile")));
}

fn dir_with_dotenv(label: &str, contents: &str) -> PathBuf {
    let dir = unique_temp_path(label);
    fs::create_dir_all(&dir).expect("temp dir should be creatable");
    fs::write(dir.join(".env"), contents).expect(".env should be writable");
    dir
}

#[test]
fn dotenv_in_working_directory_selects_provider() {
    let dir = dir_with_dotenv("dotenv", "CHAT_PROVIDER=ollama\nOLLAMA_MODEL=llama3.2\n");

    aichat_cmd()
        .current_dir(&dir)
        .args(["config", "check"])
        .assert()
        .success()
        .stdout(contains("provider: ollama").and(contains("model: llama3.2")));

    aichat_cmd()
        .current_dir(&dir)
        .write_stdin("exit\n")
        .assert()
        .success()
        .stdout(contains("OLLAMA Active"));
}

#[test]
fn exported_variable_beats_dotenv() {
    let dir = dir_with_dotenv("dotenv-precedence", "CHAT_PROVIDER=ollama\n");

    aichat_cmd()
        .current_dir(&dir)
        .env("CHAT_PROVIDER", "groq")
        .env("GROQ_API_KEY", "gsk")
        .args(["config", "check"])
        .assert()
        .success()
        .stdout(contains("provider: groq"));
}

#[test]
fn malformed_dotenv_is_fatal() {
    let dir = dir_with_dotenv("dotenv-malformed", "this line is not valid\n");

    aichat_cmd()
        .current_dir(&dir)
        .args(["config", "check"])
        .assert()
        .failure()
        .stderr(contains("Failed to load .env"));
}

#[test]
fn profile_supplies_provider_model_and_passes_check() {
    let config_path = unique_temp_path("config");
    fs::write(
        &config_path,
        "[profiles.local]\nprovider = \"ollama\"\nmodel = \"llama3.2\"\nsystem = \"Be brief.\"\n",
    )
    .expect("config should be writable");

    aichat_cmd()
        .env("AICHAT_CONFIG", &config_path)
        .args(["config", "check", "--profile", "local"])
        .assert()
        .success()
        .stdout(
            contains("config OK:")
                .and(contains("provider: ollama"))
                .and(contains("model: llama3.2")),
        );
}

#[test]
fn environment_provider_beats_profile_provider() {
    let config_path = unique_temp_path("precedence");
    fs::write(
        &config_path,
        "[profiles.local]\nprovider = \"ollama\"\nmodel = \"llama3.2\"\n",
    )
    .expect("config should be writable");

    aichat_cmd()
        .env("AICHAT_CONFIG", &config_path)
        .env("CHAT_PROVIDER", "groq")
        .env("GROQ_API_KEY", "gsk")
        .args(["config", "check", "--profile", "local"])
        .assert()
        .success()
        .stdout(contains("provider: groq").and(contains("model: llama3-8b-8192")));
}

#[test]
fn profile_file_missing_returns_explicit_error() {
    let config_path = unique_temp_path("missing-config");

    aichat_cmd()
        .env("AICHAT_CONFIG", &config_path)
        .args(["--profile", "local"])
        .write_stdin("exit\n")
        .assert()
        .failure()
        .stderr(contains("Failed to read config file"));
}

#[test]
fn invalid_profile_toml_returns_parse_error() {
    let config_path = unique_temp_path("invalid-toml");
    fs::write(&config_path, "[profiles.bad\nprovider = \"ollama\"")
        .expect("config should be writable");

    aichat_cmd()
        .env("AICHAT_CONFIG", &config_path)
        .args(["config", "check", "--profile", "bad"])
        .assert()
        .failure()
        .stderr(contains("Failed to parse config file"));
}

#[test]
fn profile_not_found_returns_error() {
    let config_path = unique_temp_path("profile-not-found");
    fs::write(&config_path, "[profiles.local]\nprovider = \"ollama\"\n")
        .expect("config should be writable");

    aichat_cmd()
        .env("AICHAT_CONFIG", &config_path)
        .args(["config", "check", "--profile", "missing"])
        .assert()
        .failure()
        .stderr(contains("Profile 'missing' not found"));
}

#[test]
fn invalid_profile_provider_returns_error() {
    let config_path = unique_temp_path("invalid-provider");
    fs::write(&config_path, "[profiles.bad]\nprovider = \"unknown\"\n")
        .expect("config should be writable");

    aichat_cmd()
        .env("AICHAT_CONFIG", &config_path)
        .args(["config", "check", "--profile", "bad"])
        .assert()
        .failure()
        .stderr(contains("Unsupported provider 'unknown'"));
}

#[test]
fn version_prints_build_metadata() {
    aichat_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(contains("commit:").and(contains("built:")));
}

#[test]
fn help_mentions_completion_and_chat_commands() {
    aichat_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            contains("Generate shell completion script")
                .and(contains("/clear"))
                .and(contains("CHAT_PROVIDER")),
        );
}

#[test]
fn completion_bash_outputs_script() {
    aichat_cmd()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(contains("_aichat").and(contains("complete")));
}

#[test]
fn completion_fish_outputs_script() {
    aichat_cmd()
        .args(["completion", "fish"])
        .assert()
        .success()
        .stdout(contains("complete -c aichat"));
}
