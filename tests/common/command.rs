use assert_cmd::Command;
use std::path::Path;

pub fn run_lineage_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("lineage").expect("Failed to find lineage binary");
    cmd.envs(vec![("NO_PAGER", "1"), ("NO_COLOR", "1")]);
    cmd.env_remove("RUST_LOG");
    cmd.current_dir(dir);
    for arg in args {
        cmd.arg(arg);
    }
    cmd
}
