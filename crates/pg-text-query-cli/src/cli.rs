use std::path::PathBuf;

use pg_text_query::CompletionConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    Root,
    Gen,
    Check,
    Config,
}

#[derive(Debug, Clone)]
pub enum Command {
    Help(HelpTopic),
    Gen(GenArgs),
    Check(CheckArgs),
    Config(ConfigArgs),
}

#[derive(Debug, Clone)]
pub struct GenArgs {
    pub config: Option<PathBuf>,
    pub overrides: CompletionConfig,
    pub validate: bool,
    pub prompt: String,
}

#[derive(Debug, Clone)]
pub struct CheckArgs {
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ConfigArgs {
    pub config: Option<PathBuf>,
    pub overrides: CompletionConfig,
}

pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut it = args.iter().skip(1);
    let Some(first) = it.next() else {
        return Ok(Command::Help(HelpTopic::Root));
    };

    match first.as_str() {
        "-h" | "--help" => Ok(Command::Help(HelpTopic::Root)),
        "gen" => parse_gen(it.map(|s| s.as_str())),
        "check" => parse_check(it.map(|s| s.as_str())),
        "config" => parse_config(it.map(|s| s.as_str())),
        _ => anyhow::bail!("unknown command: {first}"),
    }
}

fn parse_gen<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config: Option<PathBuf> = None;
    let mut overrides = CompletionConfig::new();
    let mut validate = false;
    let mut prompt: Vec<&str> = Vec::new();

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Gen)),
            "--validate" => validate = true,
            "--config" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--config requires a value");
                };
                config = Some(PathBuf::from(v));
            }
            _ if token.starts_with("--config=") => {
                config = Some(PathBuf::from(token.trim_start_matches("--config=")));
            }
            "--set" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--set requires KEY=VALUE");
                };
                parse_override(v, &mut overrides)?;
            }
            _ if token.starts_with("--set=") => {
                parse_override(token.trim_start_matches("--set="), &mut overrides)?;
            }
            "--" => prompt.extend(it.by_ref()),
            other if other.starts_with("--") => anyhow::bail!("unknown argument: {other}"),
            other => prompt.push(other),
        }
    }

    if prompt.is_empty() {
        anyhow::bail!("missing prompt: expected `pgtq gen <PROMPT>`");
    }

    Ok(Command::Gen(GenArgs {
        config,
        overrides,
        validate,
        prompt: prompt.join(" "),
    }))
}

fn parse_check<'a>(it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut files: Vec<PathBuf> = Vec::new();

    for token in it {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Check)),
            // `-` is stdin.
            "-" => files.push(PathBuf::from(token)),
            other if other.starts_with('-') => anyhow::bail!("unknown argument: {other}"),
            other => files.push(PathBuf::from(other)),
        }
    }

    Ok(Command::Check(CheckArgs { files }))
}

fn parse_config<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config: Option<PathBuf> = None;
    let mut overrides = CompletionConfig::new();

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Config)),
            "--config" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--config requires a value");
                };
                config = Some(PathBuf::from(v));
            }
            _ if token.starts_with("--config=") => {
                config = Some(PathBuf::from(token.trim_start_matches("--config=")));
            }
            "--set" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--set requires KEY=VALUE");
                };
                parse_override(v, &mut overrides)?;
            }
            _ if token.starts_with("--set=") => {
                parse_override(token.trim_start_matches("--set="), &mut overrides)?;
            }
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }

    Ok(Command::Config(ConfigArgs { config, overrides }))
}

/// `KEY=VALUE`; VALUE is taken as JSON when it parses, else as a string.
fn parse_override(raw: &str, overrides: &mut CompletionConfig) -> anyhow::Result<()> {
    let Some((key, value)) = raw.split_once('=') else {
        anyhow::bail!("invalid --set value (expected KEY=VALUE): {raw}");
    };
    let key = key.trim();
    if key.is_empty() {
        anyhow::bail!("invalid --set value (empty key): {raw}");
    }

    let value = serde_json::from_str::<serde_json::Value>(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    overrides.insert(key, value);
    Ok(())
}

pub fn print_help(topic: HelpTopic) {
    match topic {
        HelpTopic::Root => {
            println!(
                "\
pgtq - generate PostgreSQL queries from natural-language prompts

USAGE:
  pgtq <COMMAND> [OPTIONS]

COMMANDS:
  gen           Generate a query from a prompt
  check         Check that SQL is a non-empty, valid Postgres query
  config        Print the effective completion request parameters

ENVIRONMENT:
  OPENAI_API_KEY        API key (required by `gen`)
  OPENAI_BASE_URL       API base URL (default: https://api.openai.com/v1)
  PGTQ_OPENAI_CONFIG    Config file with a `completion_create` table (TOML or YAML)
  RUST_LOG              Log filter (default: warn)

Run `pgtq <command> --help` for more."
            );
        }
        HelpTopic::Gen => {
            println!(
                "\
USAGE:
  pgtq gen [OPTIONS] <PROMPT>...

OPTIONS:
  --validate            Fail unless the output parses as non-empty PostgreSQL
  --set <KEY=VALUE>     Override a request parameter (repeatable; VALUE may be JSON)
  --config <FILE>       Config file path (overrides PGTQ_OPENAI_CONFIG)
  -h, --help            Print help"
            );
        }
        HelpTopic::Check => {
            println!(
                "\
USAGE:
  pgtq check [FILE]...

Reads stdin when no files (or `-`) are given. Exits non-zero if any input
does not parse or parses to nothing (empty or only a comment).

OPTIONS:
  -h, --help            Print help"
            );
        }
        HelpTopic::Config => {
            println!(
                "\
USAGE:
  pgtq config [OPTIONS]

OPTIONS:
  --set <KEY=VALUE>     Override a request parameter (repeatable; VALUE may be JSON)
  --config <FILE>       Config file path (overrides PGTQ_OPENAI_CONFIG)
  -h, --help            Print help"
            );
        }
    }
}
