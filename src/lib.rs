pub mod ast;
pub mod cache;
pub mod compiler;
pub mod config;
pub mod context;
pub mod css;
pub mod error;
pub mod incremental;
pub mod plugin;
pub mod preflight;
pub mod registry;
pub mod runtime;
pub mod scanner;
pub mod theme;
pub mod tokenizer;
pub mod variant;

pub use compiler::{GenerationResult, generate_class, generate_css, parse_class_to_ast};
pub use config::Config;
pub use context::{Context, create_context};
pub use error::CliError;
pub use incremental::IncrementalParser;
pub use runtime::{ObserveOptions, Runtime, RuntimeOptions, RuntimeStats};

use runtime::fs_host::FsHost;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Scan {
        inputs: Vec<String>,
        ignore: Vec<String>,
    },
    Build(BuildArgs),
    Watch {
        build: BuildArgs,
        poll: bool,
        poll_interval_ms: u64,
    },
    Help,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildArgs {
    pub inputs: Vec<String>,
    pub out: Option<String>,
    pub config: Option<String>,
    pub ignore: Vec<String>,
}

pub fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Scan { inputs, ignore } => run_scan(inputs, ignore),
        Command::Build(args) => run_build(&args).map(|_| ()),
        Command::Watch {
            build,
            poll,
            poll_interval_ms,
        } => run_watch(&build, poll.then(|| Duration::from_millis(poll_interval_ms))),
        Command::Help => {
            print_help();
            Ok(())
        }
    }
}

pub fn run_from_env() -> Result<(), CliError> {
    let command = parse_args(env::args().skip(1))?;
    run(command)
}

pub fn parse_args<I>(args: I) -> Result<Command, CliError>
where
    I: IntoIterator<Item = String>,
{
    let mut iter = args.into_iter();
    let Some(cmd) = iter.next() else {
        return Ok(Command::Help);
    };
    let rest = iter.collect::<Vec<_>>();

    match cmd.as_str() {
        "scan" => {
            let parsed = parse_flags("scan", &rest, false)?;
            Ok(Command::Scan {
                inputs: parsed.build.inputs,
                ignore: parsed.build.ignore,
            })
        }
        "build" => Ok(Command::Build(parse_flags("build", &rest, false)?.build)),
        "watch" => {
            let parsed = parse_flags("watch", &rest, true)?;
            Ok(Command::Watch {
                build: parsed.build,
                poll: parsed.poll,
                poll_interval_ms: parsed.poll_interval_ms,
            })
        }
        "-h" | "--help" | "help" => Ok(Command::Help),
        _ => Err(CliError::usage(format!("unknown command: {}", cmd))),
    }
}

struct ParsedFlags {
    build: BuildArgs,
    poll: bool,
    poll_interval_ms: u64,
}

fn parse_flags(command: &str, args: &[String], watch: bool) -> Result<ParsedFlags, CliError> {
    let mut parsed = ParsedFlags {
        build: BuildArgs::default(),
        poll: false,
        poll_interval_ms: 500,
    };
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        let mut value_for = |flag: &str| {
            iter.next().cloned().ok_or_else(|| {
                CliError::usage(format!("{} requires a value for {}", command, flag))
            })
        };
        match arg.as_str() {
            "--ignore" | "-I" => parsed.build.ignore.push(value_for("--ignore")?),
            "--output" | "--out" | "-o" if command != "scan" => {
                parsed.build.out = Some(value_for("--output")?);
            }
            "--config" | "-c" if command != "scan" => {
                parsed.build.config = Some(value_for("--config")?);
            }
            "--poll" if watch => parsed.poll = true,
            "--poll-interval" if watch => {
                let value = value_for("--poll-interval")?;
                parsed.poll = true;
                parsed.poll_interval_ms = value.parse::<u64>().map_err(|_| {
                    CliError::usage(format!(
                        "--poll-interval requires a positive integer, got '{}'",
                        value
                    ))
                })?;
            }
            "--poll" | "--poll-interval" => {
                return Err(CliError::usage(format!("{} is only supported with watch", arg)));
            }
            flag if flag.starts_with('-') && flag.len() > 1 => {
                return Err(CliError::usage(format!("{}: unknown flag {}", command, flag)));
            }
            value => parsed.build.inputs.push(value.to_string()),
        }
    }

    if parsed.build.inputs.is_empty() {
        return Err(CliError::usage(format!(
            "{} requires at least one path or glob pattern",
            command
        )));
    }
    Ok(parsed)
}

fn run_scan(inputs: Vec<String>, ignore: Vec<String>) -> Result<(), CliError> {
    let output = scanner::scan_patterns(&inputs, &ignore, &scanner::ScanOptions::default())?;
    let mut classes = output.classes;
    classes.sort();

    for class in &classes {
        println!("{}", class);
    }
    eprintln!(
        "scanned {} files, found {} classes",
        output.files.len(),
        classes.len()
    );
    Ok(())
}

fn load_config(path: Option<&str>) -> Result<Config, CliError> {
    match path {
        Some(path) => Ok(config::load(Path::new(path))?),
        None => Ok(Config::default()),
    }
}

fn run_build(args: &BuildArgs) -> Result<(Runtime, FsHost), CliError> {
    let config = load_config(args.config.as_deref())?;
    let host = FsHost::new(args.inputs.clone(), args.ignore.clone())?;
    let mut runtime = Runtime::new(RuntimeOptions::new(config));
    for diagnostic in runtime.context().diagnostics() {
        eprintln!(
            "plugin '{}' failed: {}",
            diagnostic.plugin_id, diagnostic.message
        );
    }

    let compiled = runtime.scan(&host, &PathBuf::from("."), None);
    write_output(args.out.as_deref(), &runtime.stylesheet())?;
    eprintln!(
        "generated {} rules from {} classes",
        compiled,
        runtime.stats().classes
    );
    Ok((runtime, host))
}

fn write_output(out: Option<&str>, css: &str) -> Result<(), CliError> {
    let Some(out) = out else {
        println!("{}", css);
        return Ok(());
    };
    let path = PathBuf::from(out);
    let write = || -> std::io::Result<()> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut text = css.to_string();
        text.push('\n');
        fs::write(&path, text)
    };
    write().map_err(|source| CliError::Write {
        path: path.clone(),
        source,
    })
}

fn run_watch(args: &BuildArgs, poll: Option<Duration>) -> Result<(), CliError> {
    let (mut runtime, host) = run_build(args)?;
    let mut host = match poll {
        Some(interval) => host.with_poll_interval(interval),
        None => host,
    };

    let root = PathBuf::from(".");
    if !runtime.observe(Some(&mut host), &root, ObserveOptions::default()) {
        return Err(error::HostError::Unavailable.into());
    }
    if poll.is_some() {
        eprintln!("watching for changes (polling, press Ctrl+C to stop)...");
    } else {
        eprintln!("watching for changes (press Ctrl+C to stop)...");
    }

    while runtime.is_observing() {
        let Some(added) = runtime.wait_for_batch(Duration::from_millis(200)) else {
            continue;
        };
        let added = added + runtime.process_pending();
        if added == 0 {
            continue;
        }
        eprintln!("{} new rules, rewriting stylesheet", added);
        if let Err(err) = write_output(args.out.as_deref(), &runtime.stylesheet()) {
            eprintln!("write failed: {}", err);
        }
    }
    Ok(())
}

fn print_help() {
    println!("barocss");
    println!();
    println!("USAGE:");
    println!("  barocss scan [--ignore <glob>] <glob...>");
    println!("  barocss build [--output <path>] [--config <path>] [--ignore <glob>] <glob...>");
    println!(
        "  barocss watch [--output <path>] [--config <path>] [--ignore <glob>] [--poll] [--poll-interval <ms>] <glob...>"
    );
    println!();
    println!("EXAMPLES:");
    println!("  barocss scan \"src/**/*.{{html,tsx}}\"");
    println!("  barocss build -c barocss.toml -o dist/app.css \"src/**/*.{{html,tsx}}\"");
    println!("  barocss watch --poll --poll-interval 250 -o dist/app.css \"src/**/*.html\"");
    println!();
    println!("Set BAROCSS_LOG (e.g. BAROCSS_LOG=debug) to control log output.");
}

#[cfg(test)]
mod tests {
    use super::{BuildArgs, Command, parse_args};
    use crate::error::CliError;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn no_arguments_prints_help() {
        assert_eq!(parse_args(Vec::new()).expect("help"), Command::Help);
    }

    #[test]
    fn parses_build_flags() {
        let command = parse_args(args(&[
            "build", "-o", "dist/app.css", "-c", "barocss.toml", "-I", "**/gen/**", "src/**/*.html",
        ]))
        .expect("build");
        assert_eq!(
            command,
            Command::Build(BuildArgs {
                inputs: vec!["src/**/*.html".to_string()],
                out: Some("dist/app.css".to_string()),
                config: Some("barocss.toml".to_string()),
                ignore: vec!["**/gen/**".to_string()],
            })
        );
    }

    #[test]
    fn poll_interval_implies_poll() {
        let command =
            parse_args(args(&["watch", "--poll-interval", "250", "*.html"])).expect("watch");
        let Command::Watch {
            poll,
            poll_interval_ms,
            ..
        } = command
        else {
            panic!("expected watch");
        };
        assert!(poll);
        assert_eq!(poll_interval_ms, 250);
    }

    #[test]
    fn rejects_bad_usage() {
        for list in [
            &["build"][..],
            &["build", "--poll", "*.html"],
            &["scan", "-o", "out.css", "*.html"],
            &["watch", "--poll-interval", "soon", "*.html"],
            &["build", "--output"],
            &["compile", "*.html"],
        ] {
            assert!(matches!(parse_args(args(list)), Err(CliError::Usage(_))), "{:?}", list);
        }
    }
}
