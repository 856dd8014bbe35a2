/*!
Main binary for jsonorm.
*/

use anyhow::{Context, Result, bail};
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::generate;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use serde_json::Value;
use std::io::{self, IsTerminal, Read, Write, stdout};
use std::path::{Path, PathBuf};

use jsonorm::utils::{write_colored_result, write_paths};
use jsonorm::{Placement, Query, Session, UpdateInstruction, commands};

/// Query and edit JSON documents through dot-notation paths.
#[derive(Parser)]
#[command(name = "jorm", version, about, arg_required_else_help = true, long_about = None, disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[command(flatten)]
    verbosity: Verbosity<WarnLevel>,
}

/// Where the document comes from.
#[derive(clap::Args)]
struct Input {
    /// Path to a `.json` file. If omitted, reads from STDIN
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,
}

/// Where an edited document goes.
#[derive(clap::Args)]
struct Output {
    /// Save the edited document to this `.json` file instead of printing it
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
    /// Do not pretty-print the JSON output, instead use compact
    #[arg(long, action = ArgAction::SetTrue)]
    compact: bool,
}

/// Available subcommands for `jorm`
#[derive(Subcommand)]
enum Commands {
    /// Print the paths of all nodes matching a query, e.g.
    /// '{"keyName": "age", "type": "eval", "value": {"op": "gt", "operand": 25}}'
    Find {
        /// Condition, `{"and": [...]}`, `{"or": [...]}`, or array of conditions
        query: String,
        #[command(flatten)]
        input: Input,
        /// Print each matched value below its path
        #[arg(long, action = ArgAction::SetTrue)]
        values: bool,
        /// Only print the number of matches
        #[arg(long, action = ArgAction::SetTrue)]
        count: bool,
        /// Do not pretty-print matched values
        #[arg(long, action = ArgAction::SetTrue)]
        compact: bool,
    },
    /// Print the value at a path
    Get {
        /// Dot-notation path, e.g. `users.1.name`
        path: String,
        #[command(flatten)]
        input: Input,
        /// Do not pretty-print the value
        #[arg(long, action = ArgAction::SetTrue)]
        compact: bool,
    },
    /// Set the value at a path, creating intermediate objects
    Set {
        /// Dot-notation path
        path: String,
        /// JSON value; anything that is not valid JSON is taken as a string
        value: String,
        #[command(flatten)]
        input: Input,
        #[command(flatten)]
        output: Output,
    },
    /// Insert a value next to one or more array elements
    Insert {
        /// Path of the anchor element, e.g. `users.1`; separate several
        /// anchors with commas
        path: String,
        /// JSON value; anything that is not valid JSON is taken as a string
        value: String,
        #[command(flatten)]
        input: Input,
        /// Insert before the anchor instead of after it
        #[arg(short, long, action = ArgAction::SetTrue)]
        before: bool,
        #[command(flatten)]
        output: Output,
    },
    /// Remove the values at one or more paths, closing the gaps in arrays
    Remove {
        /// Dot-notation path; separate several paths with commas, e.g.
        /// `users.0,users.2`
        path: String,
        #[command(flatten)]
        input: Input,
        #[command(flatten)]
        output: Output,
    },
    /// Apply update instructions to the nodes at one or more paths, e.g.
    /// '[{"keyName": "o", "value": {"src": [3], "dst": [4]}}]'
    Update {
        /// Dot-notation path of the node to edit; separate several paths
        /// with commas
        path: String,
        /// JSON array of `{"keyName", "type", "value"}` instructions
        instructions: String,
        #[command(flatten)]
        input: Input,
        #[command(flatten)]
        output: Output,
    },
    /// Print the parent path of a path
    Parent {
        /// Dot-notation path
        path: String,
    },
    /// Print the depth of the input document
    Depth {
        #[command(flatten)]
        input: Input,
    },
    #[command(subcommand)]
    /// Generate additional documentation and/or completions
    Generate(GenerateCommand),
}

/// Generate shell completions and man page
#[derive(Subcommand)]
enum GenerateCommand {
    /// Generate shell completions for the given shell to stdout.
    Shell { shell: clap_complete::Shell },
    /// Generate a man page for jorm to output directory if specified, else
    /// the current directory.
    Man {
        /// The output directory to write the man pages.
        #[clap(short, long)]
        output_dir: Option<PathBuf>,
    },
}

/// Entry point for main binary.
///
/// Reads the document from FILE, or from STDIN when piped, runs the
/// subcommand, and prints the result to STDOUT. Edits print the resulting
/// document unless `--output` saves it.
fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.verbosity.log_level_filter())
        .parse_default_env()
        .init();

    let mut out = stdout().lock();
    match cli.command {
        Commands::Find { query, input, values, count, compact } => {
            let query: Query =
                query.parse().with_context(|| "Failed to parse query")?;
            let session = read_session(input.input.as_deref())?;
            let matches = session
                .find_matches(&query)
                .with_context(|| "Failed to run query")?;

            if count {
                writeln!(out, "Found matches: {}", matches.len())?;
            } else if values {
                for found in &matches {
                    write_colored_result(
                        &mut out, found.node, &found.path, !compact, true,
                    )?;
                }
            } else {
                let paths: Vec<_> = matches.iter().map(|m| &m.path).collect();
                write_paths(&mut out, &paths)?;
            }
        }
        Commands::Get { path, input, compact } => {
            let session = read_session(input.input.as_deref())?;
            let Some(value) = session.get_object(&path)? else {
                bail!("Nothing found at `{path}`");
            };
            write_colored_result(&mut out, value, "", !compact, false)?;
        }
        Commands::Set { path, value, input, output } => {
            let mut session = read_session(input.input.as_deref())?;
            session
                .set_object(&path, parse_value(&value))
                .with_context(|| format!("Failed to set `{path}`"))?;
            finish(&session, &output, &mut out)?;
        }
        Commands::Insert { path, value, input, before, output } => {
            let mut session = read_session(input.input.as_deref())?;
            session
                .insert_all(
                    &split_paths(&path),
                    &parse_value(&value),
                    Placement::from(before),
                )
                .with_context(|| format!("Failed to insert at `{path}`"))?;
            finish(&session, &output, &mut out)?;
        }
        Commands::Remove { path, input, output } => {
            let mut session = read_session(input.input.as_deref())?;
            session
                .remove_all(&split_paths(&path))
                .with_context(|| format!("Failed to remove `{path}`"))?;
            finish(&session, &output, &mut out)?;
        }
        Commands::Update { path, instructions, input, output } => {
            let raw: Value = serde_json::from_str(&instructions)
                .with_context(|| "Failed to parse update instructions")?;
            let instructions = UpdateInstruction::list_from_value(&raw)?;
            let mut session = read_session(input.input.as_deref())?;
            session
                .update_all(&split_paths(&path), &instructions)
                .with_context(|| format!("Failed to update `{path}`"))?;
            finish(&session, &output, &mut out)?;
        }
        Commands::Parent { path } => {
            writeln!(out, "{}", Session::new().get_parent(&path)?)?;
        }
        Commands::Depth { input } => {
            let session = read_session(input.input.as_deref())?;
            writeln!(out, "Depth: {}", jsonorm::depth(session.document()?))?;
        }
        Commands::Generate(cmd) => match cmd {
            GenerateCommand::Shell { shell } => {
                let mut cmd = Cli::command();
                generate(shell, &mut cmd, "jorm", &mut out);
            }
            GenerateCommand::Man { output_dir } => {
                let pages = commands::generate::generate_man_pages(
                    &Cli::command(),
                    output_dir,
                )?;
                for page in pages {
                    writeln!(out, "Generated: {}", page.display())?;
                }
            }
        },
    }

    Ok(())
}

/// Opens FILE, or parses STDIN when no file is given.
fn read_session(input: Option<&Path>) -> Result<Session> {
    if let Some(path) = input {
        return Session::open(path)
            .with_context(|| format!("Failed to load {}", path.display()));
    }
    if io::stdin().is_terminal() {
        bail!("No input: pass a FILE or pipe a JSON document to STDIN");
    }
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .with_context(|| "Failed to read STDIN")?;
    buffer.parse().with_context(|| "Failed to parse JSON")
}

/// Paths never contain commas, so one argument can carry several.
fn split_paths(raw: &str) -> Vec<&str> {
    raw.split(',').collect()
}

/// Command-line values are JSON when they parse as such, plain strings
/// otherwise, so `jorm set name Bob` works without extra quoting.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}

/// Saves the edited document, or prints it when no output file was given.
fn finish(
    session: &Session,
    output: &Output,
    out: &mut impl Write,
) -> Result<()> {
    match &output.output {
        Some(path) => {
            session
                .save(path)
                .with_context(|| format!("Failed to save {}", path.display()))?;
            log::info!("saved {}", path.display());
            Ok(())
        }
        None => write_colored_result(
            out,
            session.document()?,
            "",
            !output.compact,
            false,
        ),
    }
}
