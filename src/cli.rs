use envwrap::{format_errors, IniOptions, JsonOptions, SourceFormat, Wrapper};
use std::fs::File;
use std::io::{self, BufReader};
use tracing_subscriber::EnvFilter;

fn main() {
    dotenvy::dotenv().ok();
    init_logging();

    let mut args = std::env::args().skip(1);
    let (command, path) = match (args.next(), args.next()) {
        (Some(command), Some(path)) => (command, path),
        (Some(command), None) => {
            println!("missing file argument for '{}'", command);
            print_usage();
            return;
        }
        _ => {
            print_usage();
            return;
        }
    };

    let wrapper = match load(&path) {
        Ok(wrapper) => wrapper,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let result = match command.as_str() {
        "json" => wrapper.write_to_json(io::stdout(), &JsonOptions::default().with_pretty(true)),
        "ini" => wrapper.write_to_config(io::stdout(), &IniOptions::default()),
        "source" => wrapper.write_to_source_file(io::stdout(), &SourceFormat::shell()),
        "collect" => wrapper.collect().map(|items| {
            for (key, value) in items {
                println!("{}={}", key, value);
            }
        }),
        "docs" => {
            print!("{}", wrapper.docs_markdown());
            Ok(())
        }
        "check" => {
            check(&wrapper);
            Ok(())
        }
        _ => {
            println!(
                "unknown command: {}. Available: json, ini, source, collect, docs, check",
                command
            );
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn print_usage() {
    println!("Usage: util-cli [command] [file]");
    println!("Reads NAME=value declarations from [file]; values come from the environment");
    println!("Commands:");
    println!("  json    - Print the declarations as JSON");
    println!("  ini     - Print the declarations as an INI file");
    println!("  source  - Print the declarations as shell exports");
    println!("  collect - Print environment key and raw value pairs");
    println!("  docs    - Print a markdown summary of the declarations");
    println!("  check   - Resolve every variable and report failures");
}

fn init_logging() {
    let default_level = "warn";
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .try_init();
}

fn load(path: &str) -> Result<Wrapper, envwrap::EnvError> {
    let file = File::open(path)?;
    Wrapper::read_from_source_file(BufReader::new(file), &SourceFormat::default())
}

fn check(wrapper: &Wrapper) {
    match wrapper.check() {
        Ok(()) => println!("All {} variable(s) resolved successfully!", wrapper.variables().count()),
        Err(errors) => {
            eprintln!("{}", format_errors(&errors));
            std::process::exit(1);
        }
    }
}
