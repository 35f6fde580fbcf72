//! Subcommand implementations

use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use policy_editor_schema::{
    decode_with, editor_to_policy, encode_with, policy_to_editor, read_source,
    write_destination, TranslateOptions, TranslationError,
};

const STDIN_MARKER: &str = "-";

pub fn decode(policy: &Path, json: Option<&Path>, options: &TranslateOptions) -> Result<()> {
    match (is_stdin(policy), json) {
        (false, Some(json)) => policy_to_editor(policy, json, options)
            .context("Failed to translate policy into editor schema"),
        _ => {
            let source = read_input(policy, "policy file")?;
            let output = decode_with(&source, options)
                .context("Failed to translate policy into editor schema")?;
            write_output(json, &output)
        }
    }
}

pub fn encode(json: &Path, policy: Option<&Path>, options: &TranslateOptions) -> Result<()> {
    match (is_stdin(json), policy) {
        (false, Some(policy)) => editor_to_policy(json, policy, options)
            .context("Failed to translate editor schema into policy"),
        _ => {
            let source = read_input(json, "json file")?;
            let output = encode_with(&source, options)
                .context("Failed to translate editor schema into policy")?;
            write_output(policy, &output)
        }
    }
}

pub fn round_trip(
    policy: &Path,
    json: &Path,
    output: &Path,
    options: &TranslateOptions,
) -> Result<()> {
    policy_to_editor(policy, json, options)
        .context("Failed to translate policy into editor schema")?;
    editor_to_policy(json, output, options)
        .context("Failed to translate editor schema back into policy")?;
    info!(
        "Round trip complete: {} -> {} -> {}",
        policy.display(),
        json.display(),
        output.display()
    );
    Ok(())
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == STDIN_MARKER
}

/// Read a source path, or stdin for "-". An interactive stdin counts as no input.
fn read_input(path: &Path, what: &'static str) -> Result<Vec<u8>> {
    if !is_stdin(path) {
        return read_source(path, what).context(format!("Failed to read {}", what));
    }
    if atty::is(atty::Stream::Stdin) {
        return Err(TranslationError::MissingInput(what).into());
    }
    let mut buffer = Vec::new();
    io::stdin()
        .read_to_end(&mut buffer)
        .context("Failed to read stdin")?;
    Ok(buffer)
}

fn write_output(path: Option<&Path>, bytes: &[u8]) -> Result<()> {
    match path {
        Some(path) => write_destination(path, bytes).context("Failed to write output"),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(bytes).context("Failed to write stdout")?;
            stdout.write_all(b"\n").context("Failed to write stdout")?;
            stdout.flush().context("Failed to write stdout")
        }
    }
}
