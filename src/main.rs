use chrono::NaiveDateTime;
use chrono_tz::Tz;
use datetoken::Datetoken;
use std::io::{self, Read};

fn main() {
    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    let mut builder = Datetoken::new().token(&config.token);
    if let Some(at) = config.at {
        builder = builder.at(at);
    }
    if let Some(tz) = config.tz {
        builder = builder.on(tz);
    }

    let result = if config.utc { builder.to_utc_date() } else { builder.to_date() };
    match result {
        Ok(then) => println!("{}", then.format("%Y-%m-%d %H:%M:%S %Z")),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

struct CliConfig {
    token: String,
    at: Option<NaiveDateTime>,
    tz: Option<Tz>,
    utc: bool,
}

fn parse_args() -> Result<CliConfig, String> {
    let mut token: Option<String> = None;
    let mut at: Option<NaiveDateTime> = None;
    let mut tz: Option<Tz> = None;
    let mut utc = false;
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("datetoken {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--utc" => utc = true,
            "--at" => {
                let value = args.next().ok_or_else(|| "error: --at expects a value".to_string())?;
                at = Some(parse_at(&value)?);
            }
            "--tz" => {
                let value = args.next().ok_or_else(|| "error: --tz expects a value".to_string())?;
                tz = Some(parse_tz(&value)?);
            }
            _ if arg.starts_with("--at=") => {
                at = Some(parse_at(arg.trim_start_matches("--at="))?);
            }
            _ if arg.starts_with("--tz=") => {
                tz = Some(parse_tz(arg.trim_start_matches("--tz="))?);
            }
            _ if arg.starts_with("--") => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => {
                // A leading single '-' can start a token ("-1d/d"), so
                // anything that is not a known option is the token.
                token = merge_token(token, &arg)?;
            }
        }
    }

    let token = match token {
        Some(value) => value,
        None => read_stdin_token()?,
    };

    if token.trim().is_empty() {
        return Err(format!("error: no token provided\n\n{}", help_text()));
    }

    Ok(CliConfig { token, at, tz, utc })
}

fn merge_token(existing: Option<String>, arg: &str) -> Result<Option<String>, String> {
    if existing.is_some() {
        return Err("error: token provided multiple times".to_string());
    }
    Ok(Some(arg.to_string()))
}

fn read_stdin_token() -> Result<String, String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(|err| format!("error: failed to read stdin: {err}"))?;
    Ok(buffer.trim().to_string())
}

fn parse_at(value: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .map_err(|_| format!("error: invalid --at '{value}' (expected YYYY-MM-DDTHH:MM:SS)"))
}

fn parse_tz(value: &str) -> Result<Tz, String> {
    value.parse::<Tz>().map_err(|_| format!("error: invalid --tz '{value}' (expected an IANA zone name)"))
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "datetoken {version}

Evaluate a relative-date token against a reference instant.

Usage:
  datetoken [OPTIONS] <token>
  echo 'now-1d/d' | datetoken [OPTIONS]

Options:
  --at <timestamp>    Reference instant in YYYY-MM-DDTHH:MM:SS, assumed UTC.
                      Default: the current instant.
  --tz <zone>         IANA zone the result (and snap boundaries) should use,
                      e.g. Europe/Madrid.
  --utc               Print the result converted back to UTC.
  -h, --help          Show this help message.
  -V, --version       Print version information.

Exit codes:
  0  Success.
  1  Invalid token or timezone.
  2  Invalid arguments or missing token.
",
        version = env!("CARGO_PKG_VERSION")
    )
}
