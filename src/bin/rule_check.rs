//! rule-check
//!
//! Evaluates a JSON rule file against URLs, so a rule set can be checked
//! before it is wired into an extension.

use std::path::PathBuf;
use std::process::ExitCode;

use reload_trigger::{Rule, RuleSet, TabDescriptor, TriggerResult, UrlPattern};

/// Command line configuration
struct Config {
    /// JSON file holding an array of rule specs
    rules_path: PathBuf,
    /// Reject invalid patterns instead of treating them as never-matching
    strict: bool,
    /// URLs to evaluate
    urls: Vec<String>,
}

fn print_usage() {
    println!("rule-check - evaluate reload-trigger rules against URLs");
    println!();
    println!("USAGE:");
    println!("    rule-check --rules <FILE> [--strict] <URL>...");
    println!();
    println!("OPTIONS:");
    println!("    -r, --rules <FILE>    JSON array of rule specs");
    println!("    -s, --strict          Fail on invalid URL patterns");
    println!("    -h, --help            Print help information");
}

fn parse_args() -> Result<Config, String> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut rules_path = None;
    let mut strict = false;
    let mut urls = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--rules" | "-r" => {
                let path = args.get(i + 1).ok_or("--rules requires a value")?;
                rules_path = Some(PathBuf::from(path));
                i += 2;
            }
            "--strict" | "-s" => {
                strict = true;
                i += 1;
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            arg if arg.starts_with('-') => {
                return Err(format!("unknown argument: {arg}"));
            }
            url => {
                urls.push(url.to_string());
                i += 1;
            }
        }
    }

    let rules_path = rules_path.ok_or("--rules is required")?;
    if urls.is_empty() {
        return Err("at least one URL is required".to_string());
    }

    Ok(Config {
        rules_path,
        strict,
        urls,
    })
}

fn load_rules(config: &Config) -> TriggerResult<RuleSet> {
    let rules = RuleSet::from_json_file(&config.rules_path)?;

    if config.strict {
        for rule in rules.rules() {
            if let Rule::UrlPattern(pattern) = rule {
                if !pattern.is_valid() {
                    // Recompile to surface the reason the pattern was rejected.
                    UrlPattern::compile(pattern.as_str())?;
                }
            }
        }
    }

    Ok(rules)
}

fn main() -> ExitCode {
    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            eprintln!("run with --help for usage");
            return ExitCode::from(2);
        }
    };

    let rules = match load_rules(&config) {
        Ok(rules) => rules,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(2);
        }
    };

    println!("{} rule(s) from {}", rules.len(), config.rules_path.display());
    for rule in rules.rules() {
        println!("  {rule}");
    }

    let mut all_matched = true;
    for url in &config.urls {
        let matched = rules.validate(&TabDescriptor::new(url.as_str()));
        all_matched &= matched;
        println!("{}  {url}", if matched { "match   " } else { "no match" });
    }

    if all_matched {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
