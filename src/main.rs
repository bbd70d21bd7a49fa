use clap::{Parser as ClapParser, Subcommand};
use ognl::cli::{self, CliError, EvalOptions, EvalResult, SourceOptions};
use std::io::{self, Read};

#[derive(ClapParser)]
#[command(name = "ognl")]
#[command(about = "OGNL - evaluate object-graph navigation expressions against JSON")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate an expression against a JSON root
    Eval {
        /// The expression to evaluate
        expression: String,

        /// JSON root (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Assign this JSON value through the expression and print the root
        #[arg(short, long)]
        set: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// Only validate syntax, don't evaluate
        #[arg(long)]
        syntax_only: bool,

        /// Fail instead of yielding null when a chain starts from null
        #[arg(long)]
        no_short_circuit: bool,

        /// Print the evaluation trace to stderr
        #[arg(long)]
        trace: bool,
    },

    /// Print the accessor source equivalent to an expression
    Source {
        /// The expression to render
        expression: String,

        /// JSON sample root (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,
    },

    /// List documentation categories
    Docs,

    /// Show documentation for a specific category
    Doc {
        /// Category name (use 'ognl docs' to list categories)
        category: String,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Eval {
            expression,
            input,
            set,
            pretty,
            syntax_only,
            no_short_circuit,
            trace,
        } => read_input(input).and_then(|input| {
            let options = EvalOptions {
                expression,
                input,
                set,
                syntax_only,
                short_circuit: !no_short_circuit,
                trace,
            };
            run_eval(&options, pretty)
        }),
        Commands::Source { expression, input } => read_input(input).and_then(|input| {
            let compiled = cli::execute_source(&SourceOptions { expression, input })?;
            println!("{}", compiled);
            Ok(())
        }),
        Commands::Docs => {
            print!("{}", cli::get_docs_overview());
            Ok(())
        }
        Commands::Doc { category } => cli::get_doc_category(&category).map(|content| {
            print!("{}", content);
        }),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

/// The explicit input, or stdin when it is piped.
fn read_input(input: Option<String>) -> Result<Option<String>, CliError> {
    match input {
        Some(s) => Ok(Some(s)),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(Some(buffer).filter(|b| !b.trim().is_empty()))
        }
        None => Ok(None),
    }
}

fn run_eval(options: &EvalOptions, pretty: bool) -> Result<(), CliError> {
    match cli::execute_eval(options)? {
        EvalResult::SyntaxValid => println!("Syntax is valid"),
        EvalResult::Success { output, trace } => {
            if let Some(trace) = trace {
                eprint!("{}", trace);
            }
            let json = if pretty {
                serde_json::to_string_pretty(&output)
            } else {
                serde_json::to_string(&output)
            }?;
            println!("{}", json);
        }
    }
    Ok(())
}
