//! Command-line solver for DIMACS files

use std::env;
use std::fs;
use std::process;
use std::time::Instant;

use sat3::sat::assignment::Assignment;
use sat3::sat::dimacs::{load_from_file, parse_generic_dimacs_str, save_structures, VarNames};
use sat3::sat::legacy::export_legacy_binary;
use sat3::sat::pretty::render;
use sat3::{Outcome, Solver, SolverConfig};

fn usage(program: &str) -> ! {
    eprintln!("Usage: {program} <cnf_file> [options]");
    eprintln!("\nOptions:");
    eprintln!("  --generic              Accept clauses of any width and any variable names");
    eprintln!("  --check                Check hyper-structure invariants while building");
    eprintln!("  --pretty               Print the parsed formula");
    eprintln!("  --grid                 Print one row per octant (implies --pretty)");
    eprintln!("  --universal-names      Name variables x1, x2, ... when printing");
    eprintln!("  --export-skt <file>    Write the compact structures in the legacy binary layout");
    eprintln!("  --save-cts <prefix>    Write each compact structure to <prefix>-cts-<i>.cnf");
    process::exit(1);
}

fn certificate(assignment: &Assignment, names: Option<&VarNames>) -> String {
    let mut line = String::from("v");
    for (var, value) in assignment.iter() {
        let name = match names {
            Some(names) => match names.original_var_name(var) {
                -1 => continue,
                name => name,
            },
            None => i64::from(var),
        };
        line.push(' ');
        if !value {
            line.push('-');
        }
        line.push_str(&name.to_string());
    }
    line.push_str(" 0");
    line
}

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        usage(&args[0]);
    }

    let filename = &args[1];
    let mut config = SolverConfig::default();
    let mut generic = false;
    let mut pretty = false;
    let mut export: Option<String> = None;
    let mut save_prefix: Option<String> = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--generic" => generic = true,
            "--check" => config.check_invariants = true,
            "--pretty" => pretty = true,
            "--grid" => {
                pretty = true;
                config.pretty.grid = true;
            }
            "--universal-names" => config.pretty.universal_names = true,
            "--export-skt" => {
                if i + 1 >= args.len() {
                    usage(&args[0]);
                }
                export = Some(args[i + 1].clone());
                i += 1;
            }
            "--save-cts" => {
                if i + 1 >= args.len() {
                    usage(&args[0]);
                }
                save_prefix = Some(args[i + 1].clone());
                i += 1;
            }
            other => {
                eprintln!("Unknown option: {other}");
                usage(&args[0]);
            }
        }
        i += 1;
    }

    let loaded = if generic {
        fs::read_to_string(filename)
            .map_err(sat3::Error::from)
            .and_then(|text| parse_generic_dimacs_str(&text))
            .map(|instance| (instance.formula, Some(instance.names)))
    } else {
        load_from_file(filename).map(|formula| (formula, None))
    };
    let (formula, names) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error reading '{filename}': {e}");
            process::exit(1);
        }
    };

    println!("c {} from '{filename}'", formula);
    if pretty {
        for line in render(&formula, &config.pretty).lines() {
            println!("c {line}");
        }
    }

    let solver = Solver::new(formula).with_config(config);
    if export.is_some() || save_prefix.is_some() {
        match solver.structures() {
            Ok(structures) => {
                if let Some(path) = export.as_deref() {
                    if let Err(e) = export_legacy_binary(&structures, path) {
                        eprintln!("Error writing '{path}': {e}");
                        process::exit(1);
                    }
                    println!("c wrote {} structures to '{path}'", structures.len());
                }
                if let Some(prefix) = save_prefix.as_deref() {
                    match save_structures(&structures, prefix) {
                        Ok(paths) => {
                            println!("c saved {} structures as '{prefix}-cts-*.cnf'", paths.len())
                        }
                        Err(e) => {
                            eprintln!("Error saving structures to '{prefix}': {e}");
                            process::exit(1);
                        }
                    }
                }
            }
            Err(e) => println!("c nothing exported: {e}"),
        }
    }

    let start = Instant::now();
    let outcome = solver.run();
    let elapsed = start.elapsed();

    match outcome {
        Ok(Outcome::Satisfiable(assignment)) => {
            println!("c solved in {:.3}s", elapsed.as_secs_f64());
            println!("s SATISFIABLE");
            println!("{}", certificate(&assignment, names.as_ref()));
        }
        Ok(Outcome::Unsatisfiable) => {
            println!("c solved in {:.3}s", elapsed.as_secs_f64());
            println!("s UNSATISFIABLE");
        }
        Err(e) => {
            println!("s UNKNOWN");
            eprintln!("Error: {e}");
            process::exit(2);
        }
    }
}
