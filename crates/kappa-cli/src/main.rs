use anyhow::Context;
use clap::{builder::PossibleValuesParser, value_parser, Arg, ArgAction, ArgMatches, Command};
use kappa_core::{
    init_project, ApplicationType, GoToolchain, InitOptions, NoopToolchain, Project, Toolchain,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn cli() -> Command {
    Command::new("kappa")
        .version(kappa_core::VERSION)
        .about("Scaffold Go projects and generate their configuration code")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("project-dir")
                .short('C')
                .long("project-dir")
                .global(true)
                .default_value(".")
                .value_parser(value_parser!(PathBuf))
                .help("Directory to run in (the project root for config commands)"),
        )
        .arg(
            Arg::new("no-toolchain")
                .long("no-toolchain")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Skip the external go commands"),
        )
        .arg(
            Arg::new("toolchain")
                .long("toolchain")
                .global(true)
                .default_value("go")
                .value_name("PROGRAM")
                .help("Go binary used by init"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::Count)
                .help("Log more (-v info, -vv debug); RUST_LOG overrides"),
        )
        .subcommand(
            Command::new("init")
                .about("Create a new project")
                .arg(
                    Arg::new("projectName")
                        .required(true)
                        .help("Project directory and Go module name"),
                )
                .arg(
                    Arg::new("forceCreate")
                        .short('f')
                        .long("forceCreate")
                        .action(ArgAction::SetTrue)
                        .help("Replace an existing directory"),
                )
                .arg(
                    Arg::new("applicationType")
                        .short('t')
                        .long("applicationType")
                        .default_value("cli")
                        .ignore_case(true)
                        .value_parser(PossibleValuesParser::new(["cli", "api"]))
                        .help("Entry point template"),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Manage configuration categories")
                .subcommand_required(true)
                .subcommand(
                    Command::new("create")
                        .about("Create a category: settings file, struct and loader")
                        .arg(Arg::new("categoryName").required(true)),
                )
                .subcommand(
                    Command::new("add")
                        .about("Add a property to an existing category")
                        .arg(Arg::new("categoryName").required(true))
                        .arg(Arg::new("propertyName").required(true))
                        .arg(
                            Arg::new("propertyType")
                                .short('t')
                                .long("propertyType")
                                .default_value("string")
                                .help("Go type of the new field"),
                        ),
                ),
        )
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}

fn string_arg<'a>(matches: &'a ArgMatches, id: &str) -> anyhow::Result<&'a str> {
    matches
        .get_one::<String>(id)
        .map(String::as_str)
        .with_context(|| format!("missing argument <{id}>"))
}

fn toolchain(matches: &ArgMatches) -> anyhow::Result<Box<dyn Toolchain>> {
    if matches.get_flag("no-toolchain") {
        return Ok(Box::new(NoopToolchain));
    }
    Ok(Box::new(GoToolchain::new(string_arg(matches, "toolchain")?)))
}

fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let dir = matches
        .get_one::<PathBuf>("project-dir")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."));
    tracing::debug!("kappa {} in {}", kappa_core::VERSION, dir.display());

    match matches.subcommand() {
        Some(("init", args)) => {
            let name = string_arg(args, "projectName")?;
            let app_type: ApplicationType = string_arg(args, "applicationType")?.parse()?;
            let options = InitOptions::new(name, &dir)
                .with_app_type(app_type)
                .with_force(args.get_flag("forceCreate"));
            init_project(&options, toolchain(matches)?.as_ref())?;
        }
        Some(("config", config)) => {
            let project = Project::open(&dir)?;
            match config.subcommand() {
                Some(("create", args)) => {
                    project.create_category(string_arg(args, "categoryName")?)?;
                }
                Some(("add", args)) => {
                    project.add_property(
                        string_arg(args, "categoryName")?,
                        string_arg(args, "propertyName")?,
                        string_arg(args, "propertyType")?,
                    )?;
                }
                _ => anyhow::bail!("unknown config command"),
            }
        }
        _ => anyhow::bail!("unknown command"),
    }
    Ok(())
}

/// Error message followed by every cause not already part of it
fn render_error(err: &anyhow::Error) -> String {
    let mut message = err.to_string();
    for cause in err.chain().skip(1) {
        let cause = cause.to_string();
        if !message.contains(&cause) {
            message.push_str(": ");
            message.push_str(&cause);
        }
    }
    message
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_tracing(matches.get_count("verbose"));

    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", render_error(&err));
            ExitCode::FAILURE
        }
    }
}
