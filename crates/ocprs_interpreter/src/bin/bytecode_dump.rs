use ocprs::program::dump::disassemble;
use ocprs_interpreter::{load_program, logger};
use std::env;

fn main() {
    let args: Vec<String> = env::args().collect();

    let Some(filename) = args.get(1) else {
        println!("Usage: ocp_dump <program.otp | program.ocp>");
        std::process::exit(0);
    };

    logger::init();
    match load_program(filename, false) {
        Ok(program) => {
            println!("=== File: {} ===", filename);
            println!(
                "{} states, {} rules, {} instructions\n",
                program.states().len(),
                program.rule_count(),
                program.instruction_count()
            );
            print!("{}", disassemble(&program));
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
