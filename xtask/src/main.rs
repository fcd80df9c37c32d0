use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::process::Command;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "x")]
#[command(about = "Development automation for palfb")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Formatting, lints and the full test suite, stopping at the first failure
    Ci,
    /// rustfmt and clippy only
    Lint {
        /// Rewrite sources instead of reporting
        #[arg(long)]
        fix: bool,
    },
    /// Run the headless test suite
    Test {
        /// Only tests whose name contains this string
        filter: Option<String>,
        /// Also run the doc tests
        #[arg(long)]
        doc: bool,
    },
    /// Run the blit benchmarks
    Bench {
        /// Only benchmarks whose name contains this string
        filter: Option<String>,
    },
    /// Open the palette-cycling demo window
    Demo {
        #[arg(long)]
        release: bool,
    },
}

/// One cargo invocation of a pipeline
struct Step {
    label: &'static str,
    args: Vec<String>,
}

impl Step {
    fn new(label: &'static str, args: &[&str]) -> Self {
        Self {
            label,
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    fn run(&self) -> Result<Duration> {
        let start = Instant::now();
        let status = Command::new("cargo")
            .args(&self.args)
            .status()
            .with_context(|| format!("could not start `cargo {}`", self.args.join(" ")))?;
        if !status.success() {
            bail!("{} failed ({})", self.label, status);
        }
        Ok(start.elapsed())
    }
}

fn main() -> Result<()> {
    match Cli::parse().command {
        Commands::Ci => pipeline("ci", ci_steps()),
        Commands::Lint { fix } => pipeline("lint", lint_steps(fix)),
        Commands::Test { filter, doc } => pipeline("test", test_steps(filter, doc)),
        Commands::Bench { filter } => {
            let mut step = Step::new("benchmarks", &["bench", "--bench", "blit_bench"]);
            if let Some(filter) = filter {
                step = step.arg("--").arg(filter);
            }
            pipeline("bench", vec![step])
        }
        Commands::Demo { release } => {
            println!("{} close the window to exit", "ℹ".blue());
            let mut step = Step::new("demo", &["run", "--bin", "palfb-demo"]);
            if release {
                step = step.arg("--release");
            }
            pipeline("demo", vec![step])
        }
    }
}

fn lint_steps(fix: bool) -> Vec<Step> {
    if fix {
        vec![
            Step::new("rustfmt", &["fmt", "--all"]),
            Step::new(
                "clippy --fix",
                &["clippy", "--workspace", "--all-targets", "--fix", "--allow-dirty"],
            ),
        ]
    } else {
        vec![
            Step::new("rustfmt", &["fmt", "--all", "--", "--check"]),
            Step::new(
                "clippy",
                &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
            ),
        ]
    }
}

fn test_steps(filter: Option<String>, doc: bool) -> Vec<Step> {
    // The integration tests only use the headless backend, so no display is needed
    let mut unit = Step::new("lib + integration tests", &["test", "--lib", "--tests"]);
    if let Some(filter) = filter {
        unit = unit.arg(filter);
    }
    let mut steps = vec![unit];
    if doc {
        steps.push(Step::new("doc tests", &["test", "--doc"]));
    }
    steps
}

fn ci_steps() -> Vec<Step> {
    let mut steps = lint_steps(false);
    steps.push(Step::new("benches compile", &["bench", "--no-run"]));
    steps.extend(test_steps(None, true));
    steps
}

/// Run `steps` in order and print a timing summary
fn pipeline(name: &str, steps: Vec<Step>) -> Result<()> {
    println!("{}", format!("=== x {} ===", name).bold().blue());
    let mut timings = Vec::with_capacity(steps.len());

    for step in &steps {
        println!("{} {}", "→".blue(), step.label.bold());
        match step.run() {
            Ok(elapsed) => timings.push((step.label, elapsed)),
            Err(err) => {
                println!("{} {}", "✗".red().bold(), step.label);
                return Err(err);
            }
        }
    }

    let total: Duration = timings.iter().map(|(_, t)| *t).sum();
    for (label, elapsed) in &timings {
        println!("  {} {:<28} {:>7.2}s", "✓".green(), label, elapsed.as_secs_f64());
    }
    println!("{} {:.2}s", "done in".green().bold(), total.as_secs_f64());
    Ok(())
}
