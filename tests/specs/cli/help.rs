use crate::prelude::CliHome;

#[test]
fn no_args_prints_usage_and_fails() {
    let home = CliHome::new();
    let output = home.cmd().output().expect("run pipulate");
    assert!(!output.status.success());
}

#[test]
fn help_flag_lists_subcommands() {
    let home = CliHome::new();
    let output = home.cmd().arg("--help").output().expect("run pipulate --help");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("reboot"));
    assert!(stdout.contains("keychain"));
}
