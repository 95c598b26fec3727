#[macro_use]
extern crate clap;

use clap::{Arg, ArgMatches, SubCommand};
use hera::Config;
use std::io::Write;
use std::path::Path;
use std::process::exit;

fn file_arg() -> Arg<'static, 'static> {
    Arg::with_name("FILE")
        .help("HERA source file")
        .required(true)
        .index(1)
}

fn main() {
    let app = app_from_crate!()
        .arg(
            Arg::with_name("FILE")
                .help("HERA source file to run")
                .index(1),
        )
        .arg(
            Arg::with_name("verbose")
                .long("verbose")
                .global(true)
                .help("Report extra detail on stderr"),
        )
        .arg(
            Arg::with_name("quiet")
                .long("quiet")
                .global(true)
                .help("Suppress warnings"),
        )
        .arg(
            Arg::with_name("no-color")
                .long("no-color")
                .global(true)
                .help("Disable ANSI colors in diagnostics"),
        )
        .arg(
            Arg::with_name("no-debug-ops")
                .long("no-debug-ops")
                .global(true)
                .help("Strip print_reg/print/__eval/__dump_state before running"),
        )
        .arg(
            Arg::with_name("warn-octal-off")
                .long("warn-octal-off")
                .global(true)
                .help("Do not warn about octal integer literals"),
        )
        .arg(
            Arg::with_name("warn-return-off")
                .long("warn-return-off")
                .global(true)
                .help("Do not warn about suspicious RETURN targets"),
        )
        .arg(
            Arg::with_name("big-stack")
                .long("big-stack")
                .global(true)
                .help("Move the data segment up to enlarge the stack region"),
        )
        .arg(
            Arg::with_name("throttle")
                .long("throttle")
                .takes_value(true)
                .value_name("N")
                .global(true)
                .help("Stop with an error after N executed operations"),
        )
        .arg(
            Arg::with_name("init")
                .long("init")
                .takes_value(true)
                .value_name("R=V[,R=V...]")
                .global(true)
                .help("Set registers before execution"),
        )
        .arg(
            Arg::with_name("credits")
                .long("credits")
                .help("Print attribution and exit"),
        )
        .subcommand(SubCommand::with_name("run").about("Check and execute a program").arg(file_arg()))
        .subcommand(
            SubCommand::with_name("debug")
                .about("Execute under the interactive debugger")
                .arg(file_arg()),
        )
        .subcommand(
            SubCommand::with_name("preprocess")
                .about("Show the program after symbol resolution and expansion")
                .arg(file_arg()),
        )
        .subcommand(
            SubCommand::with_name("assemble")
                .about("Emit machine code")
                .arg(file_arg())
                .arg(
                    Arg::with_name("output")
                        .short("o")
                        .long("output")
                        .takes_value(true)
                        .value_name("OUTPUT")
                        .help("Write to a file instead of stdout"),
                )
                .arg(
                    Arg::with_name("raw")
                        .long("raw")
                        .help("Emit raw big-endian bytes instead of a hex listing"),
                ),
        )
        .subcommand(
            SubCommand::with_name("disassemble")
                .about("Reconstruct operations from a machine-code listing")
                .arg(file_arg()),
        );

    let matches = match app.get_matches_safe() {
        Ok(matches) => matches,
        Err(err) => {
            use clap::ErrorKind::{HelpDisplayed, VersionDisplayed};
            if err.kind == HelpDisplayed || err.kind == VersionDisplayed {
                println!("{}", err.message);
                exit(hera::EXIT_OK);
            }
            eprintln!("{}", err.message);
            exit(hera::EXIT_USAGE);
        }
    };

    if matches.is_present("credits") {
        print!("{}", hera::CREDITS);
        exit(hera::EXIT_OK);
    }

    let (config, usage_error) = build_config(&matches);
    if let Some(problem) = usage_error {
        eprintln!("error: {}", problem);
        exit(hera::EXIT_USAGE);
    }

    let code = dispatch(&matches, &config);
    exit(code);
}

fn build_config(matches: &ArgMatches) -> (Config, Option<String>) {
    // Global flags may appear before or after the subcommand.
    let sub = matches.subcommand().1;
    let present = |name: &str| {
        matches.is_present(name) || sub.map_or(false, |m| m.is_present(name))
    };
    let value = |name: &str| {
        matches
            .value_of(name)
            .or_else(|| sub.and_then(|m| m.value_of(name)))
            .map(str::to_string)
    };

    let mut config = Config {
        verbose: present("verbose"),
        quiet: present("quiet"),
        color: !present("no-color"),
        no_debug_ops: present("no-debug-ops"),
        warn_octal: !present("warn-octal-off"),
        warn_return: !present("warn-return-off"),
        big_stack: present("big-stack"),
        ..Config::default()
    };

    if let Some(text) = value("throttle") {
        match text.parse() {
            Ok(limit) => config.throttle = Some(limit),
            Err(_) => return (config, Some(format!("bad throttle \"{}\"", text))),
        }
    }
    if let Some(text) = value("init") {
        match hera::parse_inits(&text) {
            Ok(inits) => config.inits = inits,
            Err(problem) => return (config, Some(problem)),
        }
    }
    (config, None)
}

fn dispatch(matches: &ArgMatches, config: &Config) -> i32 {
    let stdout = std::io::stdout();
    let stderr = std::io::stderr();
    let mut out = stdout.lock();
    let mut err = stderr.lock();

    let result = match matches.subcommand() {
        ("run", Some(sub)) => hera::run(Path::new(sub.value_of("FILE").unwrap()), config, &mut out, &mut err),
        ("debug", Some(sub)) => {
            let stdin = std::io::stdin();
            let path = Path::new(sub.value_of("FILE").unwrap()).to_path_buf();
            let code = hera::debug(&path, config, stdin.lock(), &mut out, &mut err);
            let _ = out.flush();
            code
        }
        ("preprocess", Some(sub)) => {
            hera::preprocess(Path::new(sub.value_of("FILE").unwrap()), config, &mut out, &mut err)
        }
        ("assemble", Some(sub)) => hera::assemble(
            Path::new(sub.value_of("FILE").unwrap()),
            sub.value_of("output").map(Path::new),
            sub.is_present("raw"),
            config,
            &mut out,
            &mut err,
        ),
        ("disassemble", Some(sub)) => {
            hera::disassemble(Path::new(sub.value_of("FILE").unwrap()), config, &mut out, &mut err)
        }
        _ => match matches.value_of("FILE") {
            Some(file) => hera::run(Path::new(file), config, &mut out, &mut err),
            None => {
                let _ = writeln!(err, "error: no input file; see 'hera --help'");
                return hera::EXIT_USAGE;
            }
        },
    };

    match result {
        Ok(code) => code,
        Err(io_error) => {
            let _ = writeln!(err, "error: {}", io_error);
            hera::EXIT_RUNTIME
        }
    }
}
