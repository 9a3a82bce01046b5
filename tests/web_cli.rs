//! Web 服务器命令行测试

use assert_cmd::Command;

#[test]
fn test_help_lists_options() {
    let output = Command::cargo_bin("line-translator-web")
        .unwrap()
        .arg("--help")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for option in ["--bind", "--port", "--config", "--list-env"] {
        assert!(stdout.contains(option), "missing {}", option);
    }
}

#[test]
fn test_list_env_prints_variables_and_exits() {
    let output = Command::cargo_bin("line-translator-web")
        .unwrap()
        .arg("--list-env")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("OPENAI_API_KEY"));
    assert!(stdout.contains("MONGODB_URL"));
    assert!(stdout.contains("LINE_TRANSLATOR_PORT"));
}

#[test]
fn test_rejects_invalid_port() {
    Command::cargo_bin("line-translator-web")
        .unwrap()
        .args(["--port", "not-a-port"])
        .assert()
        .failure();
}
