use clap::{Arg, ArgAction, Command};
use std::fs;
use std::path::Path;
use std::time::Instant;

use serene_compiler::{compile_file, trace};

fn main() {
    let matches = Command::new("serenec")
        .about("Serene compiler - lowers a tagged parse tree to Rust source")
        .arg(
            Arg::new("input")
                .help("Parse tree file (JSON) produced by the Serene parser")
                .value_name("INPUT")
                .required(true),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("out")
                .help("Write the generated program here instead of stdout")
                .value_name("FILE"),
        )
        .arg(
            Arg::new("bodies")
                .long("bodies")
                .help("Print each function's raw statement code instead of a full program")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("trace")
                .long("trace")
                .help("Enable compiler tracing on stderr")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    if matches.get_flag("trace") {
        trace::enable();
    }

    let phase_start = Instant::now();
    if trace::enabled() {
        eprintln!("[PHASE] serenec_run=start");
    }

    let exit_code = (|| {
        let Some(input) = matches.get_one::<String>("input") else {
            eprintln!("Error: no input file given");
            return 1;
        };

        let program = match compile_file(Path::new(input)) {
            Ok(program) => program,
            Err(e) => {
                eprintln!("COMPILE ERROR:\n{}", e);
                return 1;
            }
        };

        let text = if matches.get_flag("bodies") {
            program.bodies()
        } else {
            match program.to_rust() {
                Ok(text) => text,
                Err(e) => {
                    eprintln!("COMPILE ERROR:\n{}", e);
                    return 1;
                }
            }
        };

        match matches.get_one::<String>("output") {
            Some(output_path) => {
                if let Some(parent) = Path::new(output_path).parent() {
                    if let Err(e) = fs::create_dir_all(parent) {
                        eprintln!("Failed to create output directory: {}", e);
                        return 1;
                    }
                }
                if let Err(e) = fs::write(output_path, &text) {
                    eprintln!("Failed to write output: {}", e);
                    return 1;
                }
                trace::trace(&format!("wrote {}", output_path));
            }
            None => print!("{}", text),
        }
        0
    })();

    if trace::enabled() {
        eprintln!(
            "[PHASE] serenec_run=end ms={}",
            phase_start.elapsed().as_millis()
        );
    }
    std::process::exit(exit_code);
}
