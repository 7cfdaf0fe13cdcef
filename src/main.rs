mod debug_report;

use patina::Highlighter;
use std::io::{self, IsTerminal, Read};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    let highlighter = Highlighter::with_builtins();

    if config.list {
        for name in highlighter.languages() {
            println!("{name}");
        }
        return;
    }

    match &config.language {
        Some(language) => match highlighter.highlight_verbose(&config.source, language) {
            Ok(run) => debug_report::print_run(
                &config.source,
                &run.language,
                &run.result,
                Some(&run.metrics),
                config.color,
            ),
            Err(err) => {
                eprintln!("error: {err}");
                std::process::exit(2);
            }
        },
        None => match highlighter.highlight_auto(&config.source, None) {
            Ok(detected) => debug_report::print_run(
                &config.source,
                &format!("{} (auto, relevance {})", detected.language, detected.relevance),
                &detected.result,
                None,
                config.color,
            ),
            Err(err) => {
                eprintln!("error: {err}");
                std::process::exit(2);
            }
        },
    }
}

struct CliConfig {
    source: String,
    language: Option<String>,
    list: bool,
    color: bool,
}

fn parse_args() -> Result<CliConfig, String> {
    let mut source: Option<String> = None;
    let mut language: Option<String> = None;
    let mut list = false;
    let mut color = io::stdout().is_terminal();
    let mut args = std::env::args().skip(1).peekable();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                println!("{}", help_text());
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("patina {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--list" => list = true,
            "--color" => color = true,
            "--no-color" => color = false,
            "--language" | "-l" => {
                let value = args.next().ok_or_else(|| "error: --language expects a value".to_string())?;
                language = Some(value);
            }
            "--input" | "-i" => {
                let value = args.next().ok_or_else(|| "error: --input expects a value".to_string())?;
                if source.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                source = Some(value);
            }
            "--" => {
                let rest = args.collect::<Vec<_>>().join(" ");
                if !rest.trim().is_empty() {
                    if source.is_some() {
                        return Err("error: input provided multiple times".to_string());
                    }
                    source = Some(rest);
                }
                break;
            }
            _ if arg.starts_with("--language=") => {
                language = Some(arg.trim_start_matches("--language=").to_string());
            }
            _ if arg.starts_with("--input=") => {
                if source.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                source = Some(arg.trim_start_matches("--input=").to_string());
            }
            _ if arg.starts_with('-') => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => {
                let rest = std::iter::once(arg).chain(args).collect::<Vec<_>>().join(" ");
                if source.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                source = Some(rest);
                break;
            }
        }
    }

    let source = match source {
        Some(value) => value,
        None if list => String::new(),
        None => read_stdin_input()?,
    };

    if source.trim().is_empty() && !list {
        return Err(format!("error: no input provided\n\n{}", help_text()));
    }

    Ok(CliConfig { source, language, list, color })
}

fn read_stdin_input() -> Result<String, String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(|err| format!("error: failed to read stdin: {err}"))?;
    Ok(buffer)
}

fn help_text() -> String {
    format!(
        "patina {version}

Rule-driven syntax highlighting engine CLI.

Usage:
  patina [OPTIONS] [--] <source...>
  patina [OPTIONS] --input <text>

Options:
  -i, --input <text>       Source text to highlight. If omitted, reads
                           remaining args or stdin when no args are provided.
  -l, --language <name>    Language to highlight with. If omitted, the
                           language is auto-detected among all built-ins.
  --list                   List registered languages and exit.
  --color                  Force ANSI color output.
  --no-color               Disable ANSI color output.
  -h, --help               Show this help message.
  -V, --version            Print version information.

Exit codes:
  0  Success.
  1  Internal error.
  2  Invalid arguments, unknown language, or missing input.
",
        version = env!("CARGO_PKG_VERSION"),
    )
}
