use clap::{App, Arg};
use std::fs::File;
use tinysat::formula::dimacs;
use tinysat::{SatResult, Solver};

fn main() {
    env_logger::init();

    let matches = App::new("tinysat")
        .about("DPLL satisfiability solver for DIMACS CNF files")
        .arg(
            Arg::with_name("INPUT")
                .help("input files (in DIMACS CNF)")
                .required(true)
                .multiple(true)
                .index(1),
        )
        .get_matches();

    if let Some(paths) = matches.values_of("INPUT") {
        for path in paths {
            solve_file(path);
        }
    }
}

fn solve_file(path: &str) {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("failed to open {}: {}", path, e);
            std::process::exit(1);
        }
    };

    let formula = match dimacs::parse(file) {
        Ok(formula) => formula,
        Err(e) => {
            eprintln!("{}: parse error: {}", path, e);
            std::process::exit(1);
        }
    };

    let mut solver = Solver::new(formula.clone());
    match solver.solve() {
        SatResult::Satisfiable(model) => {
            println!("sat");
            if formula.eval(&model) == Some(true) {
                println!("model validated");
            } else {
                println!("invalid model");
            }
            println!("{}", model);
        }
        SatResult::Unsatisfiable => println!("unsat"),
    }
}
