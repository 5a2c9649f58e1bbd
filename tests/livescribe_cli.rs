use std::process::Command;

fn combined_output(output: &std::process::Output) -> String {
    let mut combined = String::new();
    combined.push_str(&String::from_utf8_lossy(&output.stdout));
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    combined
}

fn livescribe_bin() -> &'static str {
    option_env!("CARGO_BIN_EXE_livescribe").expect("livescribe test binary not built")
}

#[test]
fn help_mentions_name() {
    let output = Command::new(livescribe_bin())
        .arg("--help")
        .output()
        .expect("run livescribe --help");
    assert!(output.status.success());
    let combined = combined_output(&output);
    assert!(combined.contains("LiveScribe"));
}

#[test]
fn list_input_devices_prints_message() {
    let output = Command::new(livescribe_bin())
        .arg("--list-input-devices")
        .env_remove("LIVESCRIBE_MODEL_PATH")
        .output()
        .expect("run livescribe --list-input-devices");
    assert!(output.status.success());
    let combined = combined_output(&output);
    assert!(
        combined.contains("audio input devices")
            || combined.contains("No audio input devices detected")
    );
}

#[test]
fn missing_model_path_fails_fast() {
    let output = Command::new(livescribe_bin())
        .env_remove("LIVESCRIBE_MODEL_PATH")
        .output()
        .expect("run livescribe without a model");
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("--model-path"));
}

#[test]
fn nonexistent_model_path_fails_fast() {
    let output = Command::new(livescribe_bin())
        .args(["--model-path", "/no/such/model.bin"])
        .output()
        .expect("run livescribe with a bogus model");
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("does not exist"));
}
