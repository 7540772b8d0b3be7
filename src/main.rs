use anyhow::{Context, Result};
use clap::{ArgAction, CommandFactory, Parser};
use clap_complete::{generate, Shell};
use log::LevelFilter;
use std::io::{self, BufRead};
use std::path::PathBuf;
use veeline::cli::output::{self, OutputFormat};
use veeline::{center_string, split_compound, Opts};

#[derive(Parser, Debug)]
#[command(name = "veeline")]
#[command(version, about = "Identifier splitting and session options for an SQL shell", long_about = None)]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Enable debug logging
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Generate shell completion script
    #[arg(long, value_name = "SHELL")]
    completion: Option<Shell>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Split lines into compound identifiers (reads stdin when no line is given)
    Split {
        /// Lines to split
        #[arg(value_name = "LINE")]
        lines: Vec<String>,

        /// Output format (text, json)
        #[arg(short = 'o', long, default_value = "text")]
        format: OutputFormat,
    },
    /// Center text in a fixed-width field
    Center {
        text: String,

        #[arg(allow_hyphen_values = true)]
        width: isize,
    },
    /// Session options management
    Opts {
        /// Properties file (defaults to veeline.toml in the save directory)
        #[arg(long, global = true)]
        file: Option<PathBuf>,

        #[command(subcommand)]
        action: OptsCommands,
    },
}

#[derive(Parser, Debug)]
enum OptsCommands {
    /// List all options with their values
    List,
    /// Show the value of one option
    Get { name: String },
    /// Change an option and save it
    Set { name: String, value: String },
    /// Complete an option name
    Complete {
        #[arg(default_value = "")]
        prefix: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Handle shell completion generation
    if let Some(shell) = cli.completion {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "veeline", &mut io::stdout());
        return Ok(());
    }

    let colored = !cli.no_color;
    match cli.command {
        Some(Commands::Split { lines, format }) => split(lines, &format, colored),
        Some(Commands::Center { text, width }) => {
            println!("|{}|", center_string(&text, width));
            Ok(())
        }
        Some(Commands::Opts { file, action }) => handle_opts(file, action, colored),
        None => split(Vec::new(), &OutputFormat::Text, colored),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
    log::debug!("logging initialized");
}

fn split(lines: Vec<String>, format: &OutputFormat, colored: bool) -> Result<()> {
    if !lines.is_empty() {
        for line in &lines {
            output::print_split(line, &split_compound(line), colored, format)?;
        }
        return Ok(());
    }

    log::debug!("reading lines from stdin");
    for line in io::stdin().lock().lines() {
        let line = line.context("Failed to read line from stdin")?;
        output::print_split(&line, &split_compound(&line), colored, format)?;
    }
    Ok(())
}

fn handle_opts(file: Option<PathBuf>, action: OptsCommands, colored: bool) -> Result<()> {
    let path = match file.or_else(Opts::properties_file) {
        Some(path) => path,
        None => anyhow::bail!("No properties file: cannot determine the save directory"),
    };

    let mut opts = Opts::from_env();
    opts.load(&path)?;

    match action {
        OptsCommands::List => output::print_options(&opts, colored),
        OptsCommands::Get { name } => println!("{}", opts.get(&name)?),
        OptsCommands::Set { name, value } => {
            opts.set(&name, &value)?;
            opts.save(&path)?;
            output::print_option_set(&name.to_lowercase(), &opts.get(&name)?, colored);
        }
        OptsCommands::Complete { prefix } => {
            for name in Opts::complete(&prefix) {
                println!("{}", name);
            }
        }
    }
    Ok(())
}
