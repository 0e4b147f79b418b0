//! # IPPcode21 Interpreter — CLI entry point
//!
//! Parses argv by hand, wires the chosen source/input/statistics paths to
//! the loader and execution engine, and is the single place in the crate
//! that calls `std::process::exit`. Every other module returns
//! `Result<_, IppError>` and never touches the process directly.
//!
//! Usage:
//!     ipp21 --source=prog.xml --input=data.txt --stats=out.txt --insts --vars

mod engine;
mod error;
mod frame;
mod hexfloat;
mod instruction;
mod io;
mod lex;
mod loader;
mod opcode;
mod stats;
mod value;

use engine::Engine;
use error::IppError;
use stats::{StatKind, StatsTarget};

enum Cli {
    Help,
    Run {
        source: Option<String>,
        input: Option<String>,
        targets: Vec<StatsTarget>,
    },
}

fn usage() -> String {
    r#"ipp21 - an interpreter for IPPcode21

Usage:
    ipp21 --help
    ipp21 [--source=FILE] [--input=FILE] [--stats=FILE (--insts|--hot|--vars)...]...

Arguments:
    --source=FILE
        Path to the XML-encoded IPPcode21 program. Defaults to standard input.
    --input=FILE
        Path to the line source consumed by READ. Defaults to standard input.
    --stats=FILE
        Opens FILE as a statistics sink; must be followed by one or more of
        --insts, --hot, --vars selecting which counters to print, one per
        line, in the order given. May repeat with different files.

At least one of --source / --input must be given; omitting both is a
parameter error."#
        .to_string()
}

fn parse_args(args: &[String]) -> Result<Cli, IppError> {
    if args.iter().any(|a| a == "--help") {
        if args.len() != 1 {
            return Err(error::ErrorKind::BadParam.with_msg("--help must be given alone"));
        }
        return Ok(Cli::Help);
    }

    let mut source = None;
    let mut input = None;
    let mut targets: Vec<StatsTarget> = Vec::new();
    let mut current: Option<StatsTarget> = None;

    for arg in args {
        if let Some(path) = arg.strip_prefix("--source=") {
            if source.is_some() {
                return Err(error::ErrorKind::BadParam.with_msg("--source given more than once"));
            }
            source = Some(path.to_string());
        } else if let Some(path) = arg.strip_prefix("--input=") {
            if input.is_some() {
                return Err(error::ErrorKind::BadParam.with_msg("--input given more than once"));
            }
            input = Some(path.to_string());
        } else if let Some(path) = arg.strip_prefix("--stats=") {
            if let Some(t) = current.take() {
                targets.push(t);
            }
            current = Some(StatsTarget { path: path.to_string(), kinds: Vec::new() });
        } else {
            let kind = match arg.as_str() {
                "--insts" => StatKind::Insts,
                "--hot" => StatKind::Hot,
                "--vars" => StatKind::Vars,
                other => return Err(error::ErrorKind::BadParam.with_msg(format!("unrecognized flag {other}"))),
            };
            match &mut current {
                Some(t) => t.kinds.push(kind),
                None => return Err(error::ErrorKind::BadParam.with_msg(format!("{arg} given without a preceding --stats="))),
            }
        }
    }
    if let Some(t) = current.take() {
        targets.push(t);
    }

    if source.is_none() && input.is_none() {
        return Err(error::ErrorKind::BadParam
            .with_msg("at least one of --source or --input must be given"));
    }

    Ok(Cli::Run { source, input, targets })
}

fn run(args: &[String]) -> Result<i32, IppError> {
    match parse_args(args)? {
        Cli::Help => {
            println!("{}", usage());
            Ok(0)
        }
        Cli::Run { source, input, targets } => {
            let bytes = io::read_source_bytes(source.as_deref())?;
            let program = loader::load(&bytes)?;
            let input_source = io::open_input_source(input.as_deref())?;

            let mut stdout = std::io::stdout();
            let mut stderr = std::io::stderr();
            let mut engine = Engine::new(&program, input_source, &mut stdout, &mut stderr);
            let run_result = engine.run();

            // Statistics are flushed on every termination path, whether the
            // program ended cleanly, via EXIT, or with a classified error;
            // a flush failure always escalates to WRITE_ERR.
            engine.stats().flush_all(&targets)?;

            run_result.map(|outcome| outcome.code)
        }
    }
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(e.kind.exit_code());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_must_stand_alone() {
        assert!(matches!(parse_args(&["--help".to_string()]).unwrap(), Cli::Help));
        let err = parse_args(&["--help".to_string(), "--source=x".to_string()]).unwrap_err();
        assert_eq!(err.kind, error::ErrorKind::BadParam);
    }

    #[test]
    fn stats_groups_collect_in_order() {
        let args = vec![
            "--stats=a.txt".to_string(),
            "--insts".to_string(),
            "--hot".to_string(),
            "--stats=b.txt".to_string(),
            "--vars".to_string(),
        ];
        let cli = parse_args(&args).unwrap();
        match cli {
            Cli::Run { targets, .. } => {
                assert_eq!(targets.len(), 2);
                assert_eq!(targets[0].path, "a.txt");
                assert_eq!(targets[0].kinds, vec![StatKind::Insts, StatKind::Hot]);
                assert_eq!(targets[1].path, "b.txt");
                assert_eq!(targets[1].kinds, vec![StatKind::Vars]);
            }
            _ => panic!("expected Cli::Run"),
        }
    }

    #[test]
    fn stat_flag_without_stats_group_is_bad_param() {
        let err = parse_args(&["--insts".to_string()]).unwrap_err();
        assert_eq!(err.kind, error::ErrorKind::BadParam);
    }

    #[test]
    fn duplicate_source_is_bad_param() {
        let args = vec!["--source=a".to_string(), "--source=b".to_string()];
        let err = parse_args(&args).unwrap_err();
        assert_eq!(err.kind, error::ErrorKind::BadParam);
    }

    #[test]
    fn unrecognized_flag_is_bad_param() {
        let err = parse_args(&["--nope".to_string()]).unwrap_err();
        assert_eq!(err.kind, error::ErrorKind::BadParam);
    }

    #[test]
    fn neither_source_nor_input_is_bad_param() {
        let err = parse_args(&[]).unwrap_err();
        assert_eq!(err.kind, error::ErrorKind::BadParam);
    }

    #[test]
    fn source_alone_is_accepted() {
        let args = vec!["--source=a.xml".to_string()];
        assert!(matches!(parse_args(&args).unwrap(), Cli::Run { .. }));
    }

    #[test]
    fn input_alone_is_accepted() {
        let args = vec!["--input=a.txt".to_string()];
        assert!(matches!(parse_args(&args).unwrap(), Cli::Run { .. }));
    }
}
