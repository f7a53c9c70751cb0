use ocprs::{Machine, NoMatchPolicy, OcpResult, Program, Status, VmOptions};
use ocprs_debugger::Session;
use ocprs_interpreter::{decode_input, default_output_path, load_program, logger};
use std::env;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Write};

const VERSION: &str = concat!("ocp ", env!("CARGO_PKG_VERSION"));

fn print_usage() {
    eprintln!("usage: ocp [options] program [input]");
    eprintln!("Available options are:");
    eprintln!("  -c        compile only, write bytecode");
    eprintln!("  -o file   bytecode output file (default program.ocp)");
    eprintln!("  -b        program is compiled bytecode");
    eprintln!("  -p        copy unmatched characters to the output");
    eprintln!("  -x        drop unmatched characters");
    eprintln!("  -d        run under the debugger (commands on stdin)");
    eprintln!("  -s n      fault after n steps without progress (0: no limit)");
    eprintln!("  -v        show version information");
    eprintln!("Input is read from 'input' or stdin; output goes to stdout as UTF-8.");
    eprintln!("Input lines that are not UTF-8 are read as ISO-8859-1.");
    eprintln!("OCP_LOG=level sets logging (error, warn, info, debug, trace).");
}

#[derive(Default)]
struct Options {
    compile_only: bool,
    output: Option<String>,
    binary: bool,
    no_match: NoMatchPolicy,
    debug: bool,
    max_steps: Option<u64>,
    show_version: bool,
    program: Option<String>,
    input: Option<String>,
}

fn parse_args() -> Result<Options, String> {
    let args: Vec<String> = env::args().collect();
    let mut opts = Options::default();
    let mut policy_flag: Option<&str> = None;
    let mut i = 1;

    while i < args.len() {
        let arg = args[i].as_str();

        if arg.starts_with('-') && arg.len() > 1 {
            match arg {
                "-c" => opts.compile_only = true,
                "-o" => {
                    i += 1;
                    let file = args.get(i).ok_or("'-o' needs argument")?;
                    opts.output = Some(file.clone());
                }
                "-b" => opts.binary = true,
                "-p" | "-x" => {
                    if let Some(other) = policy_flag.filter(|&other| other != arg) {
                        return Err(format!("'{other}' and '{arg}' cannot be combined"));
                    }
                    policy_flag = Some(arg);
                    opts.no_match = if arg == "-p" {
                        NoMatchPolicy::PassThrough
                    } else {
                        NoMatchPolicy::Drop
                    };
                }
                "-d" => opts.debug = true,
                "-s" => {
                    i += 1;
                    let n = args.get(i).ok_or("'-s' needs argument")?;
                    let n: u64 = n.parse().map_err(|_| format!("bad step limit '{n}'"))?;
                    opts.max_steps = Some(n);
                }
                "-v" => opts.show_version = true,
                _ => return Err(format!("unrecognized option '{arg}'")),
            }
        } else if opts.program.is_none() {
            opts.program = Some(arg.to_string());
        } else if opts.input.is_none() {
            opts.input = Some(arg.to_string());
        } else {
            return Err(format!("unexpected argument '{arg}'"));
        }
        i += 1;
    }

    Ok(opts)
}

/// Feed input a line at a time, writing output as it becomes final
fn translate(
    program: &Program,
    options: VmOptions,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<(), String> {
    let mut machine = Machine::with_options(program, options);
    let mut line = Vec::new();

    loop {
        line.clear();
        let read = input
            .read_until(b'\n', &mut line)
            .map_err(|e| format!("error reading input: {e}"))?;
        if read == 0 {
            machine.finish();
        } else {
            machine.feed(&decode_input(&line));
        }

        let status = drain(&mut machine, out)
            .map_err(|e| format!("error writing output: {e}"))?
            .map_err(|e| e.to_string())?;
        match status {
            Status::Halted => break,
            Status::Stopped | Status::Ready | Status::NeedsInput => {}
        }
    }
    out.flush().map_err(|e| format!("error writing output: {e}"))
}

fn drain(machine: &mut Machine<'_>, out: &mut dyn Write) -> io::Result<OcpResult<Status>> {
    let status = match machine.run() {
        Ok(status) => status,
        Err(err) => {
            // Output produced before the fault is still valid
            if let Ok(text) = machine.take_output_string() {
                out.write_all(text.as_bytes())?;
            }
            return Ok(Err(err));
        }
    };
    match machine.take_output_string() {
        Ok(text) => out.write_all(text.as_bytes())?,
        Err(err) => return Ok(Err(err)),
    }
    Ok(Ok(status))
}

fn ocp_main() -> i32 {
    let opts = match parse_args() {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("ocp: {e}");
            print_usage();
            return 1;
        }
    };

    if opts.show_version {
        println!("{VERSION}");
        if opts.program.is_none() {
            return 0;
        }
    }

    logger::init();

    let Some(program_path) = opts.program.as_deref() else {
        print_usage();
        return 1;
    };

    let program = match load_program(program_path, opts.binary) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("{e}");
            return 1;
        }
    };

    if opts.compile_only {
        let path = opts
            .output
            .clone()
            .unwrap_or_else(|| default_output_path(program_path));
        if let Err(e) = fs::write(&path, program.serialize()) {
            eprintln!("ocp: cannot write {path}: {e}");
            return 1;
        }
        log::info!("wrote {} rules to {path}", program.rule_count());
        return 0;
    }

    let options = VmOptions {
        no_match: opts.no_match,
        max_steps: match opts.max_steps {
            Some(0) => None,
            Some(n) => Some(n),
            None => VmOptions::default().max_steps,
        },
    };

    if opts.debug {
        return debug(&program, options, opts.input.as_deref());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = match opts.input.as_deref() {
        Some(path) => match File::open(path) {
            Ok(file) => translate(&program, options, &mut BufReader::new(file), &mut out),
            Err(e) => Err(format!("cannot open {path}: {e}")),
        },
        None => translate(&program, options, &mut io::stdin().lock(), &mut out),
    };

    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("ocp: {e}");
            1
        }
    }
}

/// The debugger reads its commands from stdin, so the input must be a file
fn debug(program: &Program, options: VmOptions, input: Option<&str>) -> i32 {
    let Some(path) = input else {
        eprintln!("ocp: '-d' needs an input file");
        return 1;
    };
    let codes = match fs::read(path) {
        Ok(bytes) => decode_input(&bytes),
        Err(e) => {
            eprintln!("ocp: cannot read {path}: {e}");
            return 1;
        }
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut session = Session::with_options(program, &codes, options, stdin.lock(), stdout.lock());
    match session.run() {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("ocp: {e}");
            1
        }
    }
}

fn main() {
    std::process::exit(ocp_main());
}
