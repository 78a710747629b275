mod services;

use std::env;
use std::io::Read;
use std::path::PathBuf;

use crate::services::codeblock::{self, AbstainReason, Assessment};
use crate::services::config;
use crate::services::token_scan;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_help() {
    println!("codeblock-sentry {} - reminds Discord users to format their Python code", VERSION);
    println!();
    println!("USAGE:");
    println!("    codeblock-sentry [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help              Print help information");
    println!("    -v, --version           Print version information");
    println!("    --serve <TOKEN> [--config <PATH>]");
    println!("                            Start the Discord bot");
    println!("                            --config defaults to ~/.codeblock-sentry/config.json");
    println!("    --check [PATH]          Run the detection pipeline on a file (or stdin)");
    println!("                            and print the guidance the bot would send");
}

fn print_version() {
    println!("codeblock-sentry {}", VERSION);
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

fn handle_check(path: Option<&str>) {
    let content = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error: cannot read {}: {}", p, e);
                std::process::exit(1);
            }
        },
        None => {
            let mut buf = String::new();
            if let Err(e) = std::io::stdin().read_to_string(&mut buf) {
                eprintln!("Error: cannot read stdin: {}", e);
                std::process::exit(1);
            }
            buf
        }
    };

    if content.lines().count() <= 3 {
        println!("Note: the bot ignores messages with 3 lines or fewer.");
    }
    if token_scan::find_token(&content) {
        println!("Note: the text contains something that looks like a bot token; the bot stays silent.");
    }

    match codeblock::assess(&content) {
        Assessment::Guidance(text) => {
            println!("Verdict: guidance");
            println!();
            println!("{}", text);
        }
        Assessment::Abstain(reason) => {
            let why = match reason {
                AbstainReason::NothingRecovered => "no unformatted code found",
                AbstainReason::NotCode => "not valid Python",
                AbstainReason::OnlyExpressions => "only bare expressions",
            };
            println!("Verdict: no guidance ({})", why);
        }
    }
}

fn handle_serve(token: String, config_path: Option<PathBuf>) {
    let Some(path) = config_path.or_else(config::default_config_path) else {
        eprintln!("Error: cannot determine home directory; pass --config <PATH>");
        return;
    };
    let config = match config::load_config(&path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return;
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create Tokio runtime: {}", e);
            return;
        }
    };

    let title = format!("  codeblock-sentry v{}  |  Discord Bot  ", VERSION);
    let width = title.chars().count();
    println!();
    println!("  ┌{}┐", "─".repeat(width));
    println!("  │{}│", title);
    println!("  └{}┘", "─".repeat(width));
    println!();
    println!("  ▸ Config            : {}", path.display());
    println!("  ▸ Cooldown channels : {}", config.cooldown_channels.len());
    println!("  ▸ Whitelisted       : {}", config.whitelist_channels.len());
    println!("  ▸ Help categories   : {}", config.help_categories.len());
    if config.debug {
        println!("  ▸ Debug mode        : cooldowns disabled");
    }
    println!("  ▸ Status            : Connecting...");
    println!();

    rt.block_on(services::discord::run_bot(&token, config));
}

fn main() {
    init_logging();
    let args: Vec<String> = env::args().collect();

    let Some(first) = args.get(1) else {
        // No arguments provided
        print_help();
        return;
    };

    match first.as_str() {
        "-h" | "--help" => print_help(),
        "-v" | "--version" => print_version(),
        "--check" => handle_check(args.get(2).map(String::as_str)),
        "--serve" => {
            if args.len() < 3 || args[2].starts_with('-') {
                eprintln!("Error: --serve requires a token argument");
                eprintln!("Usage: codeblock-sentry --serve <TOKEN> [--config <PATH>]");
                return;
            }
            let token = args[2].clone();
            let mut config_path: Option<PathBuf> = None;
            let mut j = 3;
            while j < args.len() {
                match args[j].as_str() {
                    "--config" => {
                        if j + 1 < args.len() {
                            config_path = Some(PathBuf::from(&args[j + 1]));
                            j += 2;
                        } else {
                            eprintln!("Error: --config requires a path");
                            return;
                        }
                    }
                    _ => { j += 1; }
                }
            }
            handle_serve(token, config_path);
        }
        arg => {
            eprintln!("Unknown option: {}", arg);
            eprintln!("Use --help for usage information");
        }
    }
}
