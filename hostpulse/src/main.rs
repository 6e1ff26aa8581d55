//! Entry point for the hostpulse TUI. Parses args, resolves the profile and runs the App.

mod app;
mod ui;

use std::env;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::time::Duration;

use anyhow::Context;
use app::App;
use hostpulse::config::ClientConfig;
use hostpulse::profiles::{
    load_profiles, save_profiles, ProfileEntry, ProfileRequest, ProfilesFile, ResolveProfile,
};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "[--api URL|-a URL] [--profile NAME|-P NAME] [--save] [--retry-ms N] [--history-cap N] [--log-file PATH] [--dry-run] [ws://HOST:PORT/ws/metrics]";

#[derive(Debug, Default, PartialEq)]
struct ParsedArgs {
    url: Option<String>,
    api_url: Option<String>,
    profile: Option<String>,
    save: bool,
    dry_run: bool,
    retry_ms: Option<u64>,
    history_cap: Option<usize>,
    log_file: Option<String>,
}

fn parse_num<T: std::str::FromStr>(flag: &str, v: Option<String>) -> Result<T, String> {
    v.as_deref()
        .and_then(|s| s.parse::<T>().ok())
        .ok_or_else(|| format!("{flag} expects a number"))
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<ParsedArgs, String> {
    let mut it = args.into_iter();
    let prog = it.next().unwrap_or_else(|| "hostpulse".into());
    let mut out = ParsedArgs::default();

    while let Some(arg) = it.next() {
        // --flag=value form
        let (flag, inline) = match arg.split_once('=') {
            Some((f, v)) if f.starts_with("--") => (f.to_string(), Some(v.to_string())),
            _ => (arg.clone(), None),
        };
        let mut value = || inline.clone().or_else(|| it.next());
        match flag.as_str() {
            "-h" | "--help" => return Err(format!("Usage: {prog} {USAGE}")),
            "--api" | "-a" => out.api_url = value(),
            "--profile" | "-P" => out.profile = value(),
            "--log-file" => out.log_file = value(),
            "--retry-ms" => out.retry_ms = Some(parse_num("--retry-ms", value())?),
            "--history-cap" => out.history_cap = Some(parse_num("--history-cap", value())?),
            "--save" => out.save = true,
            "--dry-run" => out.dry_run = true,
            _ if out.url.is_none() && !arg.starts_with('-') => out.url = Some(arg),
            _ => return Err(format!("Unexpected argument {arg:?}. Usage: {prog} {USAGE}")),
        }
    }
    Ok(out)
}

fn init_logging(log_file: Option<&str>) -> io::Result<()> {
    let filter =
        EnvFilter::try_from_env("HOSTPULSE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    // The TUI owns the terminal; logs go to a file or nowhere.
    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::sink)
                .try_init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let parsed = match parse_args(env::args()) {
        Ok(v) => v,
        Err(msg) => {
            eprintln!("{msg}");
            return Ok(());
        }
    };
    init_logging(parsed.log_file.as_deref()).context("opening log file")?;

    let mut profiles = load_profiles();
    let req = ProfileRequest {
        profile_name: parsed.profile.clone(),
        url: parsed.url.clone(),
        api_url: parsed.api_url.clone(),
    };
    let entry = match req.resolve(&profiles) {
        ResolveProfile::Direct(entry) => {
            if let Some(name) = parsed.profile.as_ref() {
                remember_profile(&mut profiles, name, &entry, parsed.save);
            }
            entry
        }
        ResolveProfile::Loaded(entry) => entry,
        ResolveProfile::PromptSelect(names) => match prompt_select(&profiles, &names) {
            Some(entry) => entry,
            None => return Ok(()),
        },
        ResolveProfile::PromptCreate(name) => {
            eprintln!("Profile '{name}' does not exist yet.");
            let url = prompt_string("Enter URL (ws://HOST:PORT/ws/metrics or wss://...): ")?;
            if url.trim().is_empty() {
                return Ok(());
            }
            let api = prompt_string("Enter API base URL (or leave blank to derive): ")?;
            let entry = ProfileEntry {
                url: url.trim().to_string(),
                api_url: Some(api.trim().to_string()).filter(|s| !s.is_empty()),
            };
            profiles.profiles.insert(name, entry.clone());
            let _ = save_profiles(&profiles);
            entry
        }
        ResolveProfile::None => {
            eprintln!("No URL provided and no profiles to select.");
            return Ok(());
        }
    };

    let mut config = ClientConfig::new(&entry.url, entry.api_url.as_deref())?;
    if let Some(ms) = parsed.retry_ms {
        config.retry_delay = Duration::from_millis(ms.max(1));
    }
    config.history_cap = parsed.history_cap;

    if parsed.dry_run {
        println!("push: {}", config.push_url);
        println!("api:  {}", config.api_url);
        println!("retry: {:?}", config.retry_delay);
        return Ok(());
    }

    let mut app = App::new(config)?;
    app.run().await
}

/// Persist `entry` under `name`: new names are saved right away, changed
/// ones only with `--save` or after confirmation.
fn remember_profile(profiles: &mut ProfilesFile, name: &str, entry: &ProfileEntry, save: bool) {
    let overwrite = match profiles.profiles.get(name) {
        None => true,
        Some(existing) if existing == entry => false,
        Some(_) => save || prompt_yes_no(&format!("Overwrite existing profile '{name}'? [y/N]: ")),
    };
    if overwrite {
        profiles.profiles.insert(name.to_string(), entry.clone());
        let _ = save_profiles(profiles);
    }
}

fn prompt_select(profiles: &ProfilesFile, names: &[String]) -> Option<ProfileEntry> {
    eprintln!("Select profile:");
    for (i, n) in names.iter().enumerate() {
        eprintln!("  {}. {}", i + 1, n);
    }
    let line = prompt_string("Enter number (or blank to abort): ").ok()?;
    let idx = line.trim().parse::<usize>().ok()?;
    let name = names.get(idx.checked_sub(1)?)?;
    profiles.profiles.get(name).cloned()
}

fn prompt_yes_no(prompt: &str) -> bool {
    prompt_string(prompt)
        .map(|line| matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
        .unwrap_or(false)
}

fn prompt_string(prompt: &str) -> io::Result<String> {
    eprint!("{prompt}");
    let _ = io::stderr().flush();
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        std::iter::once("hostpulse")
            .chain(v.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn long_short_and_assign_forms() {
        let p = parse_args(args(&[
            "-P",
            "prod",
            "--api=http://h:8000",
            "--retry-ms",
            "500",
            "ws://h:8000/ws/metrics",
        ]))
        .unwrap();
        assert_eq!(p.profile.as_deref(), Some("prod"));
        assert_eq!(p.api_url.as_deref(), Some("http://h:8000"));
        assert_eq!(p.retry_ms, Some(500));
        assert_eq!(p.url.as_deref(), Some("ws://h:8000/ws/metrics"));
    }

    #[test]
    fn flags_and_errors() {
        let p = parse_args(args(&["--save", "--dry-run", "--history-cap=100"])).unwrap();
        assert!(p.save && p.dry_run);
        assert_eq!(p.history_cap, Some(100));
        assert!(parse_args(args(&["--retry-ms", "soon"])).is_err());
        assert!(parse_args(args(&["ws://a/ws", "ws://b/ws"])).is_err());
        assert!(parse_args(args(&["--help"])).unwrap_err().contains("Usage:"));
    }
}
