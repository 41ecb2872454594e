//! Rules command - inspect and manage the extraction rule-set.

use std::fs;
use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;

use schet_core::{FieldKind, RuleSet};

/// Arguments for the rules command.
#[derive(Args)]
pub struct RulesArgs {
    #[command(subcommand)]
    command: RulesCommand,
}

#[derive(Subcommand)]
enum RulesCommand {
    /// Show the active rule-set
    Show {
        /// Rule-set file (default: built-in Russian rules)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Write the built-in rule-set to a file for editing
    Init(InitArgs),

    /// Check that every pattern in a rule-set file compiles
    Validate {
        /// Rule-set file to check
        file: PathBuf,
    },
}

#[derive(Args)]
struct InitArgs {
    /// Output path for the rule-set file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite existing file
    #[arg(long)]
    force: bool,
}

pub async fn run(args: RulesArgs) -> anyhow::Result<()> {
    match args.command {
        RulesCommand::Show { file } => show_rules(file),
        RulesCommand::Init(init_args) => init_rules(init_args),
        RulesCommand::Validate { file } => validate_rules(&file),
    }
}

fn default_rules_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("schet")
        .join("rules.json")
}

fn show_rules(file: Option<PathBuf>) -> anyhow::Result<()> {
    let rules = match file {
        Some(path) => RuleSet::from_file(&path)?,
        None => {
            println!(
                "{} No rule-set file given, showing built-in rules.",
                style("ℹ").blue()
            );
            RuleSet::default_rules()
        }
    };

    println!("{}", serde_json::to_string_pretty(&rules)?);

    Ok(())
}

fn init_rules(args: InitArgs) -> anyhow::Result<()> {
    let output_path = args.output.unwrap_or_else(default_rules_path);

    if output_path.exists() && !args.force {
        anyhow::bail!(
            "Rule-set file already exists at {}. Use --force to overwrite.",
            output_path.display()
        );
    }

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }

    RuleSet::default_rules().save(&output_path)?;

    println!(
        "{} Created rule-set file at {}",
        style("✓").green(),
        output_path.display()
    );

    Ok(())
}

fn validate_rules(file: &PathBuf) -> anyhow::Result<()> {
    let rules = RuleSet::from_file(file)?;

    let mut bad = 0usize;
    let mut total = 0usize;
    for kind in FieldKind::ALL {
        for rule in rules.rules(kind) {
            total += 1;
            if let Err(e) = regex::Regex::new(&rule.pattern) {
                bad += 1;
                eprintln!(
                    "{} {} / {:?}: {}",
                    style("✗").red(),
                    kind.as_str(),
                    rule.description,
                    e
                );
            }
        }
    }

    if bad > 0 {
        anyhow::bail!("{bad} of {total} patterns do not compile");
    }

    println!("{} All {} patterns compile", style("✓").green(), total);

    Ok(())
}
