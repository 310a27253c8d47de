use assert_cmd::Command;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use std::path::Path;

fn kappa(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("kappa").unwrap();
    cmd.current_dir(dir).env_remove("RUST_LOG").arg("--no-toolchain");
    cmd
}

fn init(parent: &Path, args: &[&str]) {
    kappa(parent)
        .arg("init")
        .arg("myapp")
        .args(args)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn init_cli_project() {
    let parent = tempfile::tempdir().unwrap();
    init(parent.path(), &["--applicationType=cli"]);

    let main = std::fs::read_to_string(parent.path().join("myapp/cmd/cli/main.go")).unwrap();
    assert!(main.contains("applicationConfig, err := config.NewApplicationConfig()"));
    assert!(main.contains(
        "fmt.Printf(\"Hello world! Welcome to %s!\\n\", applicationConfig.ApplicationName)"
    ));
    assert!(parent.path().join("myapp/templates").is_dir());
}

#[test]
fn init_twice_needs_force() {
    let parent = tempfile::tempdir().unwrap();
    init(parent.path(), &["-t", "api"]);

    kappa(parent.path())
        .args(["init", "myapp"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    init(parent.path(), &["-f"]);
    assert!(parent.path().join("myapp/cmd/cli/main.go").is_file());
}

#[test]
fn create_and_add_through_project_dir() {
    let parent = tempfile::tempdir().unwrap();
    init(parent.path(), &[]);
    let root = parent.path().join("myapp");

    kappa(parent.path())
        .args(["-C", "myapp", "config", "create", "billing"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
    kappa(&root)
        .args(["config", "add", "billing", "retrydelay", "-t", "int"])
        .assert()
        .success();

    assert_eq!(
        std::fs::read_to_string(root.join("config/billing.yaml")).unwrap(),
        "retrydelay: 0\n"
    );
    let source = std::fs::read_to_string(root.join("pkg/infra/config/billing.go")).unwrap();
    assert!(source.contains("Retrydelay int `yaml:\"retrydelay\"`"));
}

#[test]
fn missing_category_fails() {
    let parent = tempfile::tempdir().unwrap();
    init(parent.path(), &[]);

    kappa(&parent.path().join("myapp"))
        .args(["config", "add", "nosuchcategory", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("the category nosuchcategory doesn't exist"));
    assert!(!parent.path().join("myapp/config/nosuchcategory.yaml").exists());
}

#[test]
fn config_outside_a_project_fails() {
    let dir = tempfile::tempdir().unwrap();
    kappa(dir.path())
        .args(["config", "create", "billing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not a kappa project"));
}

#[test]
fn invalid_names_fail() {
    let parent = tempfile::tempdir().unwrap();
    init(parent.path(), &[]);
    kappa(&parent.path().join("myapp"))
        .args(["config", "create", "2fast"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid name"));
}

#[test]
fn init_runs_the_chosen_toolchain() {
    let parent = tempfile::tempdir().unwrap();
    Command::cargo_bin("kappa")
        .unwrap()
        .current_dir(parent.path())
        .env_remove("RUST_LOG")
        .args(["init", "myapp", "--toolchain", "kappa-no-such-go-binary"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("kappa-no-such-go-binary mod init myapp"));
    assert!(!parent.path().join("myapp").exists());
}

#[test]
fn verbose_logs_go_to_stderr() {
    let parent = tempfile::tempdir().unwrap();
    kappa(parent.path())
        .args(["-v", "init", "myapp"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Initialized cli project myapp"));
}
