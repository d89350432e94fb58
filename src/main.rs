//! luassist: insert missing requires into a Lua system and keep the shared
//! registration file in sync with the hooks it defines.
//!
//! The patched source is printed to stdout. The registration file is only
//! rewritten when an entry was actually added.

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::Args;
use colored::Colorize;
use dialoguer::Confirm;
use luassist::pipeline::{self, Patch, PatchReport};
use luassist::registry::HookStatus;
use std::io::Write;

fn main() -> Result<()> {
    let args = Args::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if args.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let settings = args.settings();
    let patch = pipeline::run(&args.src_file, &settings)?;

    if args.check {
        if args.json {
            println!("{}", serde_json::to_string_pretty(&patch.report)?);
        } else {
            print_report(&patch.report);
        }
        return Ok(());
    }

    // Rendered before the registration file is touched; only the write
    // itself can still fail after the commit.
    let output = patch.source.to_text();
    commit_registration(&patch, args.interactive)?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn commit_registration(patch: &Patch, interactive: bool) -> Result<()> {
    let Some(reg) = patch.registration.as_ref().filter(|r| r.outcome.changed) else {
        return Ok(());
    };

    if interactive {
        for hook in &reg.outcome.hooks {
            if hook.status == HookStatus::Inserted {
                eprintln!(
                    "  {} {}",
                    "+".green(),
                    format!("{} -> {}", patch.report.module.as_deref().unwrap_or("?"), hook.hook)
                        .green()
                );
            }
        }
        let confirmed = Confirm::new()
            .with_prompt(format!("Update {}?", reg.path.display()))
            .default(true)
            .interact()?;
        if !confirmed {
            eprintln!("{} Registration file left unchanged", "info:".blue().bold());
            return Ok(());
        }
    }

    patch.write_registration()?;
    eprintln!("{} Updated {}", "info:".blue().bold(), reg.path.display());
    Ok(())
}

fn print_report(report: &PatchReport) {
    let imports = &report.imports;
    if imports.inserted.is_empty() {
        println!("{} No imports missing", "ok:".green().bold());
    } else {
        println!(
            "\n{} {} import(s) for {}:\n",
            "Would insert".yellow().bold(),
            imports.inserted.len(),
            report.source.display()
        );
        for insertion in &imports.inserted {
            println!(
                "  {} {}",
                format!("{}:", insertion.line + 1).dimmed(),
                insertion.text.trim_end().green()
            );
        }
    }

    for rejection in &imports.rejected {
        println!(
            "  {} {} {}",
            "warn:".yellow().bold(),
            rejection.identifier.red(),
            format!("({})", rejection.reason).dimmed()
        );
    }

    let Some(module) = &report.module else {
        return;
    };
    let Some(registration) = &report.registration else {
        return;
    };
    let file = report
        .registration_file
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    println!();
    for hook in &registration.hooks {
        let status = match hook.status {
            HookStatus::Inserted => "would register".yellow(),
            HookStatus::AlreadyRegistered => "registered".green(),
            HookStatus::SectionMissing => "no section".dimmed(),
        };
        println!("  {} {} {}", format!("{module}/{}", hook.hook).bold(), status, file.dimmed());
    }
}
