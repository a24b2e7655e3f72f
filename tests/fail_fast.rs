//! The fail-fast compile policy terminates the process, so it is exercised in
//! a child copy of this test binary.

use std::{env, process::Command};

use vibrant_demos::shaders::{
    CompilePolicy, ShaderCompiler, ShaderSource, ShaderStage, COMPILE_FAILURE_HEADER,
};

const CHILD_ENV: &str = "VIBRANT_DEMOS_FAIL_FAST_CHILD";
const RETURNED_MARKER: &str = "enforce returned";

const MALFORMED_FRAGMENT: &str = "#version 330 core\n\
    out vec4 FragColor;\n\
    void main() { FragColor = vec4(1.0, 1.0, 0.0, 1.0) }\n";

fn enforce_on_malformed_source() {
    let mut compiler = ShaderCompiler::new().unwrap();
    let shader = compiler.compile(
        ShaderStage::Fragment,
        &ShaderSource::from_text("triangle.frag", MALFORMED_FRAGMENT),
    );

    CompilePolicy::FailFast.enforce(&shader);
    println!("{RETURNED_MARKER}");
}

#[test]
fn fail_fast_prints_diagnostic_and_exits_with_status_one() {
    if env::var_os(CHILD_ENV).is_some() {
        enforce_on_malformed_source();
        return;
    }

    let output = Command::new(env::current_exe().unwrap())
        .args([
            "--exact",
            "fail_fast_prints_diagnostic_and_exits_with_status_one",
            "--nocapture",
            "--test-threads=1",
        ])
        .env(CHILD_ENV, "1")
        .output()
        .unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(1), "stdout:\n{stdout}");
    assert!(!stdout.contains(RETURNED_MARKER), "stdout:\n{stdout}");

    let report = stdout
        .split_once(COMPILE_FAILURE_HEADER)
        .map(|(_, rest)| rest)
        .unwrap_or_else(|| panic!("no failure header in stdout:\n{stdout}"));
    assert!(report.contains("triangle.frag"), "stdout:\n{stdout}");
}
