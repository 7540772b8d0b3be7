use crate::config::Opts;
use crate::{CompoundIdentifier, Token};
use colored::*;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonLine<'a> {
    line: &'a str,
    identifiers: &'a [CompoundIdentifier],
}

pub fn print_split(
    line: &str,
    identifiers: &[CompoundIdentifier],
    colored_output: bool,
    format: &OutputFormat,
) -> serde_json::Result<()> {
    match format {
        OutputFormat::Text => println!("{}", format_identifiers(identifiers, colored_output)),
        OutputFormat::Json => {
            let output = JsonLine { line, identifiers };
            println!("{}", serde_json::to_string(&output)?);
        }
    }
    Ok(())
}

/// Render split identifiers back into shell syntax.
///
/// Parts are re-quoted whenever splitting them unquoted would not give the
/// same part back, so the result splits to the same identifiers.
pub fn format_identifiers(identifiers: &[CompoundIdentifier], colored: bool) -> String {
    identifiers
        .iter()
        .map(|identifier| {
            identifier
                .iter()
                .map(|part| format_part(part, colored))
                .collect::<Vec<_>>()
                .join(".")
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_part(part: &Token, colored: bool) -> String {
    match part {
        None if colored => "null".dimmed().italic().to_string(),
        None => "null".to_string(),
        Some(text) if needs_quotes(text) => {
            let quoted = format!("\"{}\"", text.replace('"', "\"\""));
            if colored {
                quoted.green().to_string()
            } else {
                quoted
            }
        }
        Some(text) if colored => text.cyan().to_string(),
        Some(text) => text.clone(),
    }
}

fn needs_quotes(text: &str) -> bool {
    text.is_empty()
        || text.eq_ignore_ascii_case("null")
        || text.to_uppercase() != text
        || text
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '.' | '"' | ';'))
}

pub fn print_options(opts: &Opts, colored: bool) {
    for line in format_options(opts, colored) {
        println!("{}", line);
    }
}

/// One `name = value` line per listed option, sorted by name.
pub fn format_options(opts: &Opts, colored: bool) -> Vec<String> {
    Opts::property_names()
        .map(|name| {
            // names come from the option table, so lookup cannot fail
            let value = opts.get(&name).unwrap_or_default();
            if colored {
                format!("{} = {}", name.cyan().bold(), value)
            } else {
                format!("{} = {}", name, value)
            }
        })
        .collect()
}

pub fn print_option_set(name: &str, value: &str, colored: bool) {
    if colored {
        println!("{} {} = {}", "✓".green().bold(), name.cyan().bold(), value);
    } else {
        println!("✓ {} = {}", name, value);
    }
}
