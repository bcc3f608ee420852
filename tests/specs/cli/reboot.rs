use crate::prelude::CliHome;

#[test]
fn reboot_without_a_running_server_fails_with_a_clear_message() {
    let home = CliHome::new();
    let output = home.cmd().arg("reboot").output().expect("run pipulate reboot");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no running server found"));
}

#[test]
fn reboot_signals_the_pid_in_the_pid_file() {
    let home = CliHome::new();
    std::fs::create_dir_all(home.path()).expect("state dir");
    let child = std::process::Command::new("sleep")
        .arg("30")
        .spawn()
        .expect("spawn sleep");
    std::fs::write(home.path().join("pipulate-server.pid"), child.id().to_string()).expect("write pid file");

    let output = home.cmd().arg("reboot").output().expect("run pipulate reboot");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(&child.id().to_string()));

    // The child process should have received SIGTERM and exited.
    let mut child = child;
    let status = child.wait().expect("wait for child");
    assert!(!status.success());
}
