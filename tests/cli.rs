//! CLI tests.

mod support;

use predicates::prelude::*;
use support::*;

#[test]
fn test_help_lists_commands() {
    let t = Test::new();
    t.cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("keygen"))
        .stdout(predicate::str::contains("secrets"))
        .stdout(predicate::str::contains("pat"));
}

#[test]
fn test_keygen_prints_pair() {
    let t = Test::new();
    let output = t.run(&["keygen"]);
    assert_success(&output);
    assert_stdout_contains(&output, "public key:");
    assert_stdout_contains(&output, "private key:");
    assert!(!t.config_path().exists());
}

#[test]
fn test_keygen_json() {
    let t = Test::new();
    let output = t.run(&["keygen", "--json"]);
    assert_success(&output);

    let json = stdout_json(&output);
    assert_eq!(json["public_key"].as_str().unwrap().len(), 64);
    assert_eq!(json["private_key"].as_str().unwrap().len(), 64);
    assert_eq!(json["fingerprint"].as_str().unwrap().len(), 16);
}

#[test]
fn test_keygen_save_writes_config() {
    let t = Test::new();
    let output = t.run(&["keygen", "--save", "--json"]);
    assert_success(&output);

    let json = stdout_json(&output);
    assert!(json.get("private_key").is_none());

    let contents = std::fs::read_to_string(t.config_path()).unwrap();
    assert!(contents.contains("[keys]"));
    assert!(contents.contains(json["public_key"].as_str().unwrap()));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(t.config_path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}

#[test]
fn test_keygen_save_refuses_to_overwrite() {
    let t = Test::with_keys();
    let before = std::fs::read_to_string(t.config_path()).unwrap();

    let output = t.keygen();
    assert_failure(&output);
    assert_stderr_contains(&output, "--force");
    assert_eq!(std::fs::read_to_string(t.config_path()).unwrap(), before);

    let output = t.run(&["keygen", "--save", "--force"]);
    assert_success(&output);
    assert_ne!(std::fs::read_to_string(t.config_path()).unwrap(), before);
}

#[test]
fn test_encrypt_decrypt_with_saved_keys() {
    let t = Test::with_keys();

    let output = t.encrypt("Hello, World!", "text");
    assert_success(&output);
    let encrypted = stdout_json(&output);
    assert_eq!(encrypted["success"], true);
    assert_eq!(encrypted["algorithm"], "x25519-xsalsa20poly1305-sealedbox");

    let output = t.decrypt(encrypted["encrypted"].as_str().unwrap(), "text");
    assert_success(&output);
    assert_eq!(stdout_json(&output)["decrypted"], "Hello, World!");
}

#[test]
fn test_json_kind_canonicalizes() {
    let t = Test::with_keys();

    let output = t.encrypt(r#"{"a":1, "b": true}"#, "json");
    let ciphertext = stdout_json(&output)["encrypted"].as_str().unwrap().to_string();

    let output = t.decrypt(&ciphertext, "json");
    assert_eq!(stdout_json(&output)["decrypted"], r#"{"a":1,"b":true}"#);
}

#[test]
fn test_validate_reports_size() {
    let t = Test::with_keys();
    let output = t.encrypt("Hello, World!", "text");
    let ciphertext = stdout_json(&output)["encrypted"].as_str().unwrap().to_string();

    let output = t.validate(&ciphertext, "text");
    assert_success(&output);
    let json = stdout_json(&output);
    assert_eq!(json["can_decrypt"], true);
    assert_eq!(json["size_bytes"], 13);
    assert!(!json.to_string().contains("Hello"));
}

#[test]
fn test_failed_decrypt_prints_result_and_exits_nonzero() {
    let t = Test::with_keys();
    let output = t.decrypt("AAAA", "text");

    assert_failure(&output);
    let json = stdout_json(&output);
    assert_eq!(json["success"], false);
    assert_eq!(json["error_type"], "DECRYPTION_FAILED");
    assert_stderr_contains(&output, "DECRYPTION_FAILED");
}

#[test]
fn test_explicit_keys_bypass_config() {
    let t = Test::new();
    let keys = stdout_json(&t.run(&["keygen", "--json"]));
    let public = keys["public_key"].as_str().unwrap();
    let private = keys["private_key"].as_str().unwrap();

    let output = t.run(&["encrypt", "sealed", "--public-key", public]);
    assert_success(&output);
    let ciphertext = stdout_json(&output)["encrypted"].as_str().unwrap().to_string();

    let output = t
        .cmd()
        .args(["decrypt", &ciphertext])
        .env("GHSEAL_PRIVATE_KEY", private)
        .output()
        .unwrap();
    assert_success(&output);
    assert_eq!(stdout_json(&output)["decrypted"], "sealed");
}

#[test]
fn test_missing_keys_hint() {
    let t = Test::new();
    let output = t.encrypt("value", "text");

    assert_failure(&output);
    assert_stderr_contains(&output, "not configured");
    assert_stderr_contains(&output, "ghseal keygen --save");
}

#[test]
fn test_named_config_must_exist() {
    let t = Test::new();
    let missing = t.home.path().join("nowhere.toml");
    let output = t.run(&["--config", missing.to_str().unwrap(), "encrypt", "value"]);

    assert_failure(&output);
    assert_stderr_contains(&output, "does not exist");
}

#[test]
fn test_malformed_config_is_reported() {
    let t = Test::new();
    let path = t.home.path().join("bad.toml");
    std::fs::write(&path, "[keys\nprivate_key = ").unwrap();

    let output = t.run(&["--config", path.to_str().unwrap(), "encrypt", "value"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "failed to parse config");
}

#[test]
fn test_pat_seal_without_verification() {
    let t = Test::with_keys();
    let output = t.run(&["pat", "seal", TOKEN, "--no-verify"]);
    assert_success(&output);

    let json = stdout_json(&output);
    assert_eq!(json["verified"], false);
    let encrypted = json["encrypted_pat"].as_str().unwrap();
    assert!(!encrypted.contains(TOKEN));
    assert!(!stdout(&output).contains(TOKEN));
}

#[test]
fn test_pat_seal_reads_stdin() {
    let t = Test::with_keys();
    let output = t
        .cmd()
        .args(["pat", "seal", "--no-verify"])
        .write_stdin(format!("{}\n", TOKEN))
        .output()
        .unwrap();
    assert_success(&output);
    assert!(stdout_json(&output)["encrypted_pat"].is_string());
}

#[test]
fn test_pat_test_reports_unreachable_github() {
    let t = Test::with_keys();
    let sealed = stdout_json(&t.run(&["pat", "seal", TOKEN, "--no-verify"]));
    let encrypted = sealed["encrypted_pat"].as_str().unwrap();

    let output = t
        .cmd()
        .args(["pat", "test", encrypted])
        .env("GHSEAL_GITHUB_API_URL", "http://127.0.0.1:9")
        .output()
        .unwrap();

    assert_failure(&output);
    let json = stdout_json(&output);
    assert_eq!(json["success"], false);
    assert_eq!(json["error_type"], "GITHUB_ERROR");
}

#[test]
fn test_pat_test_rejects_garbage_locally() {
    let t = Test::with_keys();
    let output = t
        .cmd()
        .args(["pat", "test", "AAAA"])
        .env("GHSEAL_GITHUB_API_URL", "http://127.0.0.1:9")
        .output()
        .unwrap();

    assert_failure(&output);
    assert_eq!(stdout_json(&output)["error_type"], "DECRYPTION_FAILED");
}

#[test]
fn test_secrets_require_a_scope() {
    let t = Test::with_keys();
    let output = t.run(&["secrets", "list", "--encrypted-pat", "abc"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "--repo");
}

#[test]
fn test_secrets_reject_malformed_repo() {
    let t = Test::with_keys();
    let output = t.run(&["secrets", "list", "--repo", "widgets", "--encrypted-pat", "abc"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "OWNER/REPO");
}

#[test]
fn test_secrets_set_rejects_ids_without_selected() {
    let t = Test::with_keys();
    let sealed = stdout_json(&t.run(&["pat", "seal", TOKEN, "--no-verify"]));
    let encrypted = sealed["encrypted_pat"].as_str().unwrap();

    let output = t
        .cmd()
        .args([
            "secrets", "set", "--org", "acme", "SHARED", "v", "--visibility", "all", "--repo-id", "42",
            "--encrypted-pat", encrypted,
        ])
        .env("GHSEAL_GITHUB_API_URL", "http://127.0.0.1:9")
        .output()
        .unwrap();

    assert_failure(&output);
    assert_stderr_contains(&output, "only apply to visibility 'selected'");
}

#[test]
fn test_secrets_encrypted_pat_from_env() {
    let t = Test::with_keys();
    let output = t
        .cmd()
        .args(["secrets", "list", "--org", "acme"])
        .env("GHSEAL_ENCRYPTED_PAT", "AAAA")
        .output()
        .unwrap();

    assert_failure(&output);
    assert_stderr_contains(&output, "too short");
}

#[test]
fn test_verbose_logs_to_stderr() {
    let t = Test::new();
    let output = t.run(&["--verbose", "keygen", "--save"]);
    assert_success(&output);
    assert_stderr_contains(&output, "key pair saved");
}

#[test]
fn test_quiet_by_default() {
    let t = Test::new();
    let output = t.run(&["keygen", "--save"]);
    assert_success(&output);
    assert!(!stderr(&output).contains("key pair saved"));
}

#[test]
fn test_log_json() {
    let t = Test::new();
    let output = t.run(&["--verbose", "--log-json", "keygen", "--save"]);
    assert_success(&output);

    let line = stderr(&output)
        .lines()
        .find(|l| l.contains("key pair saved"))
        .map(String::from)
        .expect("no log line");
    let event: serde_json::Value = serde_json::from_str(&line).unwrap();
    assert_eq!(event["level"], "INFO");
}

#[test]
fn test_log_filter_from_env() {
    let t = Test::new();
    let output = t
        .cmd()
        .args(["keygen", "--save"])
        .env("GHSEAL_LOG", "ghseal=debug")
        .output()
        .unwrap();
    assert_success(&output);
    assert_stderr_contains(&output, "generated key pair");
}

#[test]
fn test_completions() {
    let t = Test::new();
    for shell in ["bash", "zsh", "fish", "power-shell", "elvish"] {
        let output = t.run(&["completions", shell]);
        assert_success(&output);
        assert_stdout_contains(&output, "ghseal");
    }
}
