use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use log::LevelFilter;

use lox::diagnostic::{Diagnostic, ansi::AnsiRenderer, json, registry};
use lox::{Config, InterpretError, Vm};

#[derive(Parser, Debug)]
#[command(name = "lox", version, about = "Compile and run Lox on a bytecode virtual machine")]
struct Cli {
    /// Script to run; starts an interactive prompt when omitted
    script: Option<PathBuf>,

    /// Print the stack and each instruction as it executes
    #[arg(long)]
    trace: bool,

    /// Disassemble each chunk after it compiles
    #[arg(long)]
    print_bytecode: bool,

    /// Report errors as JSON lines
    #[arg(long)]
    json: bool,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Explain an error code, e.g. LOX-C001
    #[arg(long, value_name = "CODE")]
    explain: Option<String>,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .target(env_logger::Target::Stderr)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Some(code) = &cli.explain {
        match registry::lookup(code) {
            Some(entry) => {
                print!("{}", entry.long);
                std::process::exit(0);
            }
            None => {
                eprintln!("Unknown error code: {code}. Known codes:");
                for entry in registry::REGISTRY {
                    eprintln!("  {:<10} {}", entry.code, entry.short);
                }
                std::process::exit(64);
            }
        }
    }

    let config = Config { trace_execution: cli.trace, print_bytecode: cli.print_bytecode };
    let mut vm = Vm::with_config(config);

    let code = match &cli.script {
        Some(path) => run_file(&mut vm, path, cli.json),
        None => repl(&mut vm, cli.json),
    };
    drop(vm);
    std::process::exit(code);
}

fn run_file(vm: &mut Vm, path: &Path, json: bool) -> i32 {
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Could not read {}: {}", path.display(), e);
            return 74;
        }
    };
    log::info!("running {}", path.display());

    let mut stdout = io::stdout().lock();
    match vm.interpret(&source, &mut stdout) {
        Ok(()) => 0,
        Err(e) => {
            let _ = stdout.flush();
            report(&e, &source, json);
            e.exit_code()
        }
    }
}

fn repl(vm: &mut Vm, json: bool) -> i32 {
    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();

        line.clear();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => {
                println!();
                return 0;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("Error reading input: {e}");
                return 74;
            }
        }

        let mut stdout = io::stdout().lock();
        if let Err(e) = vm.interpret(&line, &mut stdout) {
            let _ = stdout.flush();
            report(&e, &line, json);
        }
    }
}

fn report(error: &InterpretError, source: &str, json: bool) {
    let diagnostics: Vec<Diagnostic> = match error {
        InterpretError::Compile(errors) => errors.iter().map(Diagnostic::from).collect(),
        InterpretError::Runtime(e) => vec![Diagnostic::from(e)],
        InterpretError::Output(e) => vec![Diagnostic::error(format!("Failed to write output: {e}"))],
    };

    let renderer = AnsiRenderer { use_color: io::stderr().is_terminal() };
    for d in diagnostics {
        let d = d.with_source(source);
        if json {
            eprintln!("{}", json::render(&d));
        } else {
            eprint!("{}", renderer.render(&d));
        }
    }
}
