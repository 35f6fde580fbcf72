//! Command-line front end for translating policies between the editor JSON schema
//! and XACML-style XML.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::builder::{OsStringValueParser, TypedValueParser};
use clap::{Args, Parser, Subcommand};
use log::debug;
use policy_editor_schema::TranslateOptions;

#[derive(Parser, Debug)]
#[command(name = "policy-editor-schema", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    output: OutputArgs,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone, Copy)]
struct OutputArgs {
    /// Pretty-print editor JSON output
    #[arg(long, global = true, env = "POLICY_EDITOR_PRETTY")]
    pretty: bool,

    /// Indent XML policy output
    #[arg(long, global = true, env = "POLICY_EDITOR_INDENT")]
    indent: bool,
}

impl From<OutputArgs> for TranslateOptions {
    fn from(args: OutputArgs) -> Self {
        Self {
            pretty_json: args.pretty,
            indent_xml: args.indent,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Translate an XML policy into the editor JSON schema
    #[command(visible_alias = "policy2editor")]
    Decode {
        /// XML policy to read ("-" reads stdin)
        #[arg(value_parser = path_value())]
        policy: PathBuf,
        /// Editor JSON file to write (stdout when omitted)
        #[arg(value_parser = path_value())]
        json: Option<PathBuf>,
    },

    /// Translate editor JSON into an XML policy
    #[command(visible_alias = "editor2policy")]
    Encode {
        /// Editor JSON to read ("-" reads stdin)
        #[arg(value_parser = path_value())]
        json: PathBuf,
        /// XML policy file to write (stdout when omitted)
        #[arg(value_parser = path_value())]
        policy: Option<PathBuf>,
    },

    /// Translate an XML policy into editor JSON and back into XML
    RoundTrip {
        /// XML policy to read
        #[arg(value_parser = path_value())]
        policy: PathBuf,
        /// Intermediate editor JSON file to write
        #[arg(value_parser = path_value())]
        json: PathBuf,
        /// Regenerated XML policy file to write
        #[arg(value_parser = path_value())]
        output: PathBuf,
    },
}

/// Path arguments keep empty values so they surface as missing input instead of a usage error
fn path_value() -> impl TypedValueParser<Value = PathBuf> {
    OsStringValueParser::new().map(PathBuf::from)
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    debug!("Parsed arguments: {:?}", cli);

    let options = TranslateOptions::from(cli.output);
    let result = match cli.command {
        Command::Decode { policy, json } => commands::decode(&policy, json.as_deref(), &options),
        Command::Encode { json, policy } => commands::encode(&json, policy.as_deref(), &options),
        Command::RoundTrip {
            policy,
            json,
            output,
        } => commands::round_trip(&policy, &json, &output, &options),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
