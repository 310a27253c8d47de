//! End-to-end engine behavior on scratch projects

use kappa_composition::CategoryLock;
use kappa_core::{
    default_value_for, locate, ApplicationType, ErrorKind, InitOptions, KappaError, Project,
};
use kappa_symbol::{CategoryName, PropertyName};
use kappa_test_utils::{
    assert_in_order, snapshot, RecordingToolchain, ScratchProject, BILLING_SOURCE,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn billing() -> CategoryName {
    CategoryName::new("billing").unwrap()
}

#[test]
fn init_cli_bootstraps_the_entry_point() {
    let scratch = ScratchProject::new(ApplicationType::Cli);
    let main = scratch.read("cmd/cli/main.go");
    assert_in_order(
        &main,
        &[
            "applicationConfig, err := config.NewApplicationConfig()",
            "if err != nil {",
            "log.Fatalf(\"Failed to read configuration file: %v\", err)",
            "fmt.Printf(\"Hello world! Welcome to %s!\\n\", applicationConfig.ApplicationName)",
        ],
    );
    assert_eq!(scratch.read("config/application.yaml"), "applicationname: myapp\n");
    assert!(scratch
        .read("pkg/infra/config/application.go")
        .contains("ApplicationName string `yaml:\"applicationname\"`"));
    assert!(scratch.exists("templates"));
    assert!(!scratch.exists(".kappa"));
}

#[test]
fn init_runs_the_toolchain_in_order() {
    let scratch = ScratchProject::new(ApplicationType::Api);
    assert_eq!(
        scratch.toolchain.commands(),
        vec![
            vec!["mod", "init", "myapp"],
            vec!["get", "github.com/spf13/viper"],
            vec!["get", "github.com/gin-gonic/gin"],
            vec!["mod", "tidy"],
        ]
    );
    assert!(scratch
        .toolchain
        .invocations()
        .iter()
        .all(|i| i.dir == scratch.root()));
    assert_eq!(scratch.read("go.mod"), "module myapp\n\ngo 1.21\n");
    assert!(scratch.read("cmd/api/main.go").contains("r := gin.Default()"));
}

#[test]
fn init_failure_leaves_nothing_behind() {
    let parent = tempfile::tempdir().unwrap();
    let toolchain = RecordingToolchain::failing_on(&["get"]);
    let err = kappa_core::init_project(&InitOptions::new("myapp", parent.path()), &toolchain)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Toolchain);
    assert!(snapshot(parent.path()).is_empty());
}

#[test]
fn create_category_yields_an_empty_declaration() {
    let scratch = ScratchProject::new(ApplicationType::Cli);
    let project = scratch.project();
    assert!(!project.category_exists("billing").unwrap());

    project.create_category("Billing").unwrap();
    assert!(project.category_exists("billing").unwrap());
    let decl = project.locate("billing").unwrap().unwrap();
    assert_eq!(decl.fields().count(), 0);
    assert_eq!(scratch.read("config/billing.yaml"), "");
}

#[test]
fn create_category_twice_is_already_exists() {
    let scratch = ScratchProject::new(ApplicationType::Cli);
    let project = scratch.project();
    project.create_category("billing").unwrap();
    let err = project.create_category("billing").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
}

#[test]
fn add_property_updates_struct_and_settings() {
    let scratch = ScratchProject::new(ApplicationType::Cli);
    let project = scratch.project();
    project.create_category("billing").unwrap();
    project.add_property("billing", "retrydelay", "int").unwrap();

    assert_eq!(scratch.read("config/billing.yaml"), "retrydelay: 0\n");
    let source = scratch.read("pkg/infra/config/billing.go");
    let decl = locate(&source, &billing()).unwrap().unwrap();
    let field = decl.fields().next().unwrap();
    assert_eq!(field.names, vec!["Retrydelay"]);
    assert_eq!(field.ty, "int");
    assert_eq!(field.tag.as_deref(), Some("`yaml:\"retrydelay\"`"));
    assert!(decl.has_field(&PropertyName::new("RetryDelay").unwrap()));
}

#[test]
fn add_property_keeps_existing_fields() {
    let scratch = ScratchProject::new(ApplicationType::Cli);
    scratch.write("config/billing.yaml", "region: eu\nretries: 3\njobs: 1\nlegacy: false");
    scratch.write("pkg/infra/config/billing.go", BILLING_SOURCE);

    let project = scratch.project();
    project.add_property("billing", "timeout", "time.Duration").unwrap();

    let source = scratch.read("pkg/infra/config/billing.go");
    assert_in_order(
        &source,
        &[
            "import (\n\t\"time\"\n\n\t\"github.com/spf13/viper\"\n)",
            "// BillingConfig holds payment settings",
            "\tRegion        string `yaml:\"region\"`\n\tRetries, Jobs int\n",
            "\t// deprecated\n",
            "\tLegacy  bool          `yaml:\"legacy\"` // kept for old files\n",
            "\tTimeout time.Duration `yaml:\"timeout\"`\n}",
            "func NewBillingConfig() (*BillingConfig, error) {",
        ],
    );
    assert_eq!(
        scratch.read("config/billing.yaml"),
        "region: eu\nretries: 3\njobs: 1\nlegacy: false\ntimeout: string_value\n"
    );
}

#[test]
fn duplicate_property_on_multi_name_field() {
    let scratch = ScratchProject::new(ApplicationType::Cli);
    scratch.write("config/billing.yaml", "");
    scratch.write("pkg/infra/config/billing.go", BILLING_SOURCE);
    let before = scratch.snapshot();

    let err = scratch.project().add_property("billing", "JOBS", "int").unwrap_err();
    assert!(matches!(err, KappaError::PropertyExists { .. }));
    assert_eq!(scratch.snapshot(), before);
}

#[test]
fn missing_category_changes_nothing() {
    let scratch = ScratchProject::new(ApplicationType::Cli);
    let before = scratch.snapshot();
    let err = scratch
        .project()
        .add_property("nosuchcategory", "x", "string")
        .unwrap_err();
    assert!(err.is_not_found(), "{err}");
    assert_eq!(scratch.snapshot(), before);
}

#[test]
fn held_lock_is_a_conflict() {
    let scratch = ScratchProject::new(ApplicationType::Cli);
    let project = scratch.project();
    project.create_category("billing").unwrap();
    let before = scratch.snapshot();

    let lock = CategoryLock::acquire(&scratch.layout().locks_dir(), "billing").unwrap();
    let err = project.add_property("billing", "retries", "int").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    drop(lock);

    assert_eq!(scratch.snapshot(), before);
    project.add_property("billing", "retries", "int").unwrap();
}

#[test]
fn broken_source_is_a_parse_error() {
    let scratch = ScratchProject::new(ApplicationType::Cli);
    scratch.write("config/billing.yaml", "");
    scratch.write("pkg/infra/config/billing.go", "package config\n\ntype BillingConfig struct {\n");
    let err = scratch.project().add_property("billing", "x", "int").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
}

#[test]
fn outside_a_project_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = Project::open(dir.path()).unwrap_err();
    assert!(matches!(err, KappaError::NotAProject { .. }));
    assert!(snapshot(dir.path()).is_empty());
}

#[cfg(unix)]
#[test]
fn generated_files_are_world_readable() {
    use std::os::unix::fs::PermissionsExt;
    let scratch = ScratchProject::new(ApplicationType::Cli);
    let project = scratch.project();
    project.create_category("billing").unwrap();
    project.add_property("application", "port", "int").unwrap();

    for relative in [
        "cmd/cli/main.go",
        "config/application.yaml",
        "pkg/infra/config/application.go",
        "config/billing.yaml",
        "pkg/infra/config/billing.go",
    ] {
        let mode = std::fs::metadata(scratch.root().join(relative))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o644, "{relative}");
    }
}

#[test]
fn build_excluded_category_is_rejected() {
    let scratch = ScratchProject::new(ApplicationType::Cli);
    let before = scratch.snapshot();
    let err = scratch.project().create_category("billing_test").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Argument);
    assert_eq!(scratch.snapshot(), before);
}

#[test]
fn field_list_fragments_are_not_types() {
    let scratch = ScratchProject::new(ApplicationType::Cli);
    let project = scratch.project();
    project.create_category("billing").unwrap();
    let before = scratch.snapshot();
    for bad in ["int; Evil string", "int // note"] {
        let err = project.add_property("billing", "retries", bad).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Argument, "{bad:?}");
    }
    assert_eq!(scratch.snapshot(), before);
}

#[test]
fn default_value_table() {
    let values: Vec<&str> = ["int", "int64", "float32", "time.Duration", "string", "bool"]
        .iter()
        .map(|t| default_value_for(t).as_str())
        .collect();
    assert_eq!(values, vec!["0", "0", "0.0", "string_value", "string_value", "string_value"]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn added_properties_are_found_again(
        names in proptest::collection::btree_set("p[a-z0-9_]{0,8}", 1..5),
    ) {
        let scratch = ScratchProject::new(ApplicationType::Cli);
        let project = scratch.project();
        project.create_category("billing").unwrap();
        for name in &names {
            project.add_property("billing", name, "string").unwrap();
        }

        let decl = project.locate("billing").unwrap().unwrap();
        for name in &names {
            prop_assert!(decl.has_field(&PropertyName::new(name).unwrap()));
        }
        let keys = kappa_constitutional::setting_keys(&scratch.read("config/billing.yaml"));
        prop_assert_eq!(keys, names.iter().cloned().collect::<Vec<_>>());
    }
}
