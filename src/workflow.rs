use crate::agents::{FileOutcome, FileUpdater, VersionControlAgent, VersionSource, VersionToken};
use crate::config::{Target, UpdaterConfig};
use crate::error::Result;
use crate::utils::PathValidator;
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Run-wide switches coming from the command line.
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    pub token: Option<String>,
    pub dry_run: bool,
    pub json: bool,
    pub verbose: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TargetReport {
    pub path: PathBuf,
    pub pattern: String,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateReport {
    pub version: String,
    pub source: VersionSource,
    pub dry_run: bool,
    pub updated: usize,
    pub targets: Vec<TargetReport>,
}

impl UpdateReport {
    pub fn warnings(&self) -> usize {
        self.count(|outcome| matches!(outcome, FileOutcome::PatternNotFound))
    }

    pub fn failures(&self) -> usize {
        self.count(|outcome| matches!(outcome, FileOutcome::Failed { .. }))
    }

    fn count(&self, predicate: impl Fn(&FileOutcome) -> bool) -> usize {
        self.targets
            .iter()
            .filter(|target| predicate(&target.outcome))
            .count()
    }
}

/// Execute the version bump: validate the project, load targets, resolve the
/// token once and rewrite every target.
///
/// Per-file problems never make this fail; only setup errors (bad project
/// directory, bad config, bad token override) do.
pub fn execute_update<P: AsRef<Path>>(
    project_path: P,
    config_path: Option<&Path>,
    options: &UpdateOptions,
) -> Result<UpdateReport> {
    let project_dir = PathValidator::validate_project_path(project_path)?;

    let config = match config_path {
        Some(path) => UpdaterConfig::load(path)?,
        None => UpdaterConfig::default(),
    };

    let token = resolve_token(&VersionControlAgent::new(&project_dir), options)?;

    let report = run_update(&project_dir, &config, &token, options);

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(report)
}

/// The override wins; otherwise ask git once, falling back to a timestamp.
fn resolve_token(agent: &VersionControlAgent, options: &UpdateOptions) -> Result<VersionToken> {
    if let Some(value) = options.token.as_deref() {
        return VersionToken::from_override(value);
    }

    let (token, git_error) = agent.resolve_version();
    if let Some(err) = git_error {
        if options.verbose && !options.json {
            println!("{}", format!("   git unavailable: {err}").dimmed());
        }
    }
    Ok(token)
}

/// Rewrite every configured target under `project_dir` with `token`.
pub fn run_update(
    project_dir: &Path,
    config: &UpdaterConfig,
    token: &VersionToken,
    options: &UpdateOptions,
) -> UpdateReport {
    let text = !options.json;

    if text {
        println!(
            "\n{} {} {}\n",
            "[+] Updating cache version to:".cyan().bold(),
            token.value.bold(),
            format!("({})", token.source).dimmed()
        );
    }

    let updater = FileUpdater::new().dry_run(options.dry_run);
    let mut targets = Vec::with_capacity(config.targets.len());
    let mut updated = 0;

    for target in &config.targets {
        let outcome = process_target(project_dir, target, token, &updater);

        if text {
            print_outcome(target, &outcome, token, options);
        }
        if outcome.is_updated() {
            updated += 1;
        }

        targets.push(TargetReport {
            path: target.path.clone(),
            pattern: target.pattern.clone(),
            outcome,
        });
    }

    let report = UpdateReport {
        version: token.value.clone(),
        source: token.source,
        dry_run: options.dry_run,
        updated,
        targets,
    };

    if text {
        print_summary(&report, options.verbose);
    }

    report
}

fn process_target(
    project_dir: &Path,
    target: &Target,
    token: &VersionToken,
    updater: &FileUpdater,
) -> FileOutcome {
    let file_path = project_dir.join(&target.path);
    if !file_path.exists() {
        return FileOutcome::Skipped;
    }

    match PathValidator::validate_target_file(&file_path, project_dir) {
        Ok(resolved) => updater.update_file(&resolved, &target.pattern, &token.value),
        Err(err) => FileOutcome::Failed {
            message: err.to_string(),
        },
    }
}

fn print_outcome(
    target: &Target,
    outcome: &FileOutcome,
    token: &VersionToken,
    options: &UpdateOptions,
) {
    let path = target.path.display();

    match outcome {
        FileOutcome::Updated { replacements } => {
            let verb = if options.dry_run {
                "Would update"
            } else {
                "Updated"
            };
            println!(
                "{} {}: {} -> v={}",
                "[OK]".green().bold(),
                verb,
                path,
                token.value
            );
            if options.verbose {
                println!(
                    "{}",
                    format!("   {} occurrence(s) of {} changed", replacements, target.pattern).dimmed()
                );
            }
        }
        FileOutcome::PatternNotFound => {
            println!("{} Pattern not found in: {}", "[WARN]".yellow().bold(), path);
        }
        FileOutcome::Failed { message } => {
            println!(
                "{} Failed to process {}: {}",
                "[ERROR]".red().bold(),
                path,
                message
            );
        }
        FileOutcome::Skipped => {
            if options.verbose {
                println!("{}", format!("   Skipped missing file: {path}").dimmed());
            }
        }
    }
}

fn print_summary(report: &UpdateReport, verbose: bool) {
    let label = if report.dry_run {
        "[SUCCESS] Dry run:"
    } else {
        "[SUCCESS]"
    };
    let verb = if report.dry_run { "Would update" } else { "Updated" };

    println!("\n{} {} {} file(s)", label.green().bold(), verb, report.updated);
    if verbose {
        println!(
            "{}",
            format!(
                "   {} warning(s), {} error(s)",
                report.warnings(),
                report.failures()
            )
            .dimmed()
        );
    }

    if !report.dry_run {
        println!(
            "{} Now commit changes: git add . && git commit -m \"chore: bump version to {}\"",
            "[INFO]".cyan().bold(),
            report.version
        );
    }
}
