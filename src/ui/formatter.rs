//! Pure formatting functions for UI output.
//!
//! This module contains all display/formatting logic separated from user interaction.
//! Colours come from `console`, which drops them when output is not a terminal.

use console::style;

use crate::boundary::BoundaryWarning;
use crate::cli::orchestration::{CurrentRelease, ReleaseOutcome, ReleasePlan};

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Display a boundary warning to the user.
pub fn display_boundary_warning(warning: &BoundaryWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), warning);
}

/// Display the proposed release (previous tag, new tag, where it goes).
pub fn display_release_plan(plan: &ReleasePlan) {
    match plan.previous_tag.as_deref() {
        Some(previous) => {
            println!("\n{}", style("Proposed Release:").bold());
            println!("  From: {}", style(previous).red());
            println!("  To:   {} ({} bump)", style(&plan.tag).green(), plan.bump);
        }
        None => {
            println!("\n{}", style("Initial Release:").bold());
            println!("  New tag: {}", style(&plan.tag).green());
        }
    }
    println!("  Branch: {}  Remote: {}", plan.branch, plan.remote);
}

/// Display the steps a release would run without running them.
pub fn display_dry_run(plan: &ReleasePlan, source_url: &str, artifacts: &[std::path::PathBuf]) {
    display_status("Dry run, nothing will be changed:");
    let artifact_list: Vec<String> = artifacts.iter().map(|p| p.display().to_string()).collect();

    let steps = [
        format!("Clone {} into a temporary directory", source_url),
        format!("Copy {}", artifact_list.join(", ")),
        format!("Set pyproject version to {}", plan.version),
        format!("Point README download URLs at {}", plan.tag),
        format!("Commit and tag {}", plan.tag),
        format!("Push {} and {} to {}", plan.branch, plan.tag, plan.remote),
        "Remove the temporary clone".to_string(),
    ];

    for (i, step) in steps.iter().enumerate() {
        println!("  Step {}: {}", i + 1, step);
    }
}

/// Display the latest release and the candidate next tags.
pub fn display_current_release(current: Option<&CurrentRelease>) {
    match current {
        Some(current) => {
            println!("{} {}", style("Latest release:").bold(), current.tag);
            for (kind, tag) in &current.candidates {
                println!("  {:<6} -> {}", kind.name(), tag);
            }
        }
        None => println!("{}", style("No release tag found").bold()),
    }
}

/// Display a short summary of a finished release.
pub fn display_outcome(outcome: &ReleaseOutcome) {
    let short = &outcome.commit[..outcome.commit.len().min(7)];
    if !outcome.copied.is_empty() {
        let copied: Vec<String> = outcome
            .copied
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        display_success(&format!("Copied {}", copied.join(", ")));
    }
    display_success(&format!(
        "Committed {} file(s) as {}",
        outcome.committed.len(),
        short
    ));
    display_success(&format!(
        "Updated {} download URL(s) in README",
        outcome.readme_replacements
    ));

    if outcome.pushed {
        println!(
            "\n{} Successfully released {}\n",
            style("✓").green(),
            outcome.tag
        );
    } else {
        println!(
            "\n{} Release {} created locally\n",
            style("✓").green(),
            outcome.tag
        );
    }
}

/// Display manual push instruction for a release.
///
/// # Arguments
/// * `branch` - The branch holding the release commit
/// * `tag` - The tag that was created locally
/// * `remote` - The remote name (e.g., "origin")
pub fn display_manual_push_instruction(branch: &str, tag: &str, remote: &str) {
    println!(
        "\n{} To publish this release later, run:\n  {}",
        style("→").yellow(),
        style(format!("git push {} {} {}", remote, branch, tag)).cyan()
    );
}
