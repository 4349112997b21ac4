use std::io::Read;
use std::path::Path;

use pg_text_query::{Validation, validate_query};

use crate::cli::CheckArgs;

pub fn run(args: CheckArgs) -> anyhow::Result<()> {
    let mut had_error = false;

    if args.files.is_empty() {
        had_error |= !report("stdin", &read_stdin()?);
    } else {
        for file in &args.files {
            let (label, content) = if file == Path::new("-") {
                ("stdin".to_string(), read_stdin()?)
            } else {
                let content = std::fs::read_to_string(file)
                    .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", file.display()))?;
                (file.display().to_string(), content)
            };
            had_error |= !report(&label, &content);
        }
    }

    if had_error {
        anyhow::bail!("sql check failed");
    }

    Ok(())
}

fn read_stdin() -> anyhow::Result<String> {
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .map_err(|e| anyhow::anyhow!("failed to read stdin: {e}"))?;
    Ok(buf)
}

/// Print the outcome for one input; returns whether it was valid.
fn report(label: &str, sql: &str) -> bool {
    match describe(validate_query(sql)) {
        Ok(line) => {
            println!("[OK] {label}: {line}");
            true
        }
        Err(line) => {
            eprintln!("[ERROR] {label}: {line}");
            false
        }
    }
}

fn describe(validation: Validation) -> Result<String, String> {
    match validation.into_result() {
        Ok(1) => Ok("1 statement".to_string()),
        Ok(n) => Ok(format!("{n} statements")),
        Err(e) => Err(match std::error::Error::source(&e) {
            Some(cause) => format!("{e}: {cause}"),
            None => e.to_string(),
        }),
    }
}
