/*!
# Batch Driver

Runs the rewrite engine over many serialized compilation units at once.
Each unit is rewritten on the blocking pool by its own engine, so units
share nothing; results are written out in input order once all are done.
*/

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use loglift_core::tracer::{RewriteOutcome, TransformationSummary};
use loglift_core::{CompilationUnit, LogliftConfig, LogliftError, RewriteEngine, ToSource};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Serialized units are read from files with this extension.
pub const UNIT_EXTENSION: &str = "json";

/// What to write for each rewritten unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmitFormat {
    /// Rendered Java source
    #[default]
    Source,
    /// The rewritten unit, serialized back to JSON
    Json,
}

impl EmitFormat {
    fn extension(&self) -> &'static str {
        match self {
            EmitFormat::Source => "java",
            EmitFormat::Json => "json",
        }
    }
}

impl FromStr for EmitFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "source" | "java" => Ok(EmitFormat::Source),
            "json" => Ok(EmitFormat::Json),
            other => Err(anyhow!("unknown emit format {other:?}, expected source or json")),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DriverOptions {
    pub config: LogliftConfig,
    pub emit: EmitFormat,
    /// Output directory; stdout when absent
    pub output: Option<PathBuf>,
}

/// How one input file fared.
#[derive(Debug, Clone, PartialEq)]
pub enum FileStatus {
    Changed { rewrites: u64 },
    Unchanged,
    /// Still changing after the cycle budget; nothing was written.
    NonConvergent { cycles: usize },
    Failed(String),
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStatus::Changed { rewrites } => write!(f, "changed ({rewrites} rewrites)"),
            FileStatus::Unchanged => f.write_str("unchanged"),
            FileStatus::NonConvergent { cycles } => write!(f, "did not converge after {cycles} cycles"),
            FileStatus::Failed(error) => write!(f, "failed: {error}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileReport {
    pub path: PathBuf,
    pub status: FileStatus,
    /// Where the result was written, if it went to a file
    pub written_to: Option<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
    pub summary: TransformationSummary,
}

impl BatchReport {
    /// Every file converged and was processed.
    pub fn success(&self) -> bool {
        self.summary.success()
    }
}

/// A unit file and the path its output takes under the output directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct UnitInput {
    pub path: PathBuf,
    /// Relative to the directory argument the file was found under; just the
    /// file name for files named directly.
    pub relative: PathBuf,
}

impl UnitInput {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let relative = path.file_name().map(PathBuf::from).unwrap_or_else(|| path.clone());
        Self { path, relative }
    }
}

/// Expand `paths` into unit files: files are taken as given, directories are
/// searched recursively for `.json` files. The result is sorted by path.
pub fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<UnitInput>> {
    let mut inputs = Vec::new();
    for path in paths {
        if path.is_dir() {
            collect_dir(path, path, &mut inputs)?;
        } else if path.is_file() {
            inputs.push(UnitInput::file(path.clone()));
        } else {
            bail!("input {} does not exist", path.display());
        }
    }
    inputs.sort();
    inputs.dedup_by(|a, b| a.path == b.path);
    Ok(inputs)
}

fn collect_dir(root: &Path, dir: &Path, inputs: &mut Vec<UnitInput>) -> Result<()> {
    let entries = std::fs::read_dir(dir).with_context(|| format!("Failed to read directory {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            collect_dir(root, &path, inputs)?;
        } else if path.extension().is_some_and(|ext| ext == UNIT_EXTENSION) {
            let relative = path.strip_prefix(root).map(Path::to_path_buf).unwrap_or_else(|_| path.clone());
            inputs.push(UnitInput { path, relative });
        }
    }
    Ok(())
}

/// Fail when two inputs would be written to the same output file.
fn check_output_collisions(inputs: &[UnitInput], dir: &Path, format: EmitFormat) -> Result<()> {
    let mut targets: HashMap<PathBuf, &Path> = HashMap::new();
    for input in inputs {
        let target = output_path(dir, &input.relative, format);
        if let Some(previous) = targets.insert(target.clone(), &input.path) {
            bail!(
                "{} and {} would both be written to {}",
                previous.display(),
                input.path.display(),
                target.display()
            );
        }
    }
    Ok(())
}

pub fn load_unit(path: &Path) -> Result<CompilationUnit> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let mut unit: CompilationUnit =
        serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))?;
    if unit.source_path.is_none() {
        unit.source_path = Some(path.display().to_string());
    }
    Ok(unit)
}

/// Load and rewrite one unit with a fresh engine.
pub fn rewrite_file(path: &Path, config: &LogliftConfig) -> Result<RewriteOutcome> {
    let unit = load_unit(path)?;
    let mut engine = RewriteEngine::from_config(config)?;
    let outcome = engine.transform_unit(&unit)?;
    for stats in engine.stats().values().filter(|stats| stats.applications > 0) {
        debug!(
            file = %path.display(),
            rule = %stats.rule_name,
            applications = stats.applications,
            transformations = stats.transformations,
            success_rate = stats.success_rate(),
            average_us = stats.average_time_us(),
            "Rule statistics"
        );
    }
    Ok(outcome)
}

pub fn render(unit: &CompilationUnit, format: EmitFormat) -> Result<String> {
    match format {
        EmitFormat::Source => Ok(unit.to_source()),
        EmitFormat::Json => Ok(serde_json::to_string_pretty(unit)?),
    }
}

/// Rewrite every input, then write the results.
///
/// A unit that fails or does not converge is reported and skipped; the rest
/// of the batch still runs.
pub async fn run(inputs: Vec<UnitInput>, options: &DriverOptions) -> Result<BatchReport> {
    options.config.validate()?;
    // Reject unknown rules once, before any task starts.
    let engine = RewriteEngine::from_config(&options.config)?;
    debug!(rules = ?engine.rule_names(), target = %options.config.target, "Rules configured");
    if let Some(output) = &options.output {
        check_output_collisions(&inputs, output, options.emit)?;
        std::fs::create_dir_all(output)
            .with_context(|| format!("Failed to create output directory {}", output.display()))?;
    }

    let mut tasks = JoinSet::new();
    for (index, input) in inputs.into_iter().enumerate() {
        let config = options.config.clone();
        tasks.spawn_blocking(move || {
            let result = rewrite_file(&input.path, &config);
            (index, input, result)
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        results.push(joined.context("Rewrite task panicked")?);
    }
    results.sort_by_key(|(index, _, _)| *index);

    let mut report = BatchReport::default();
    for (_, input, result) in results {
        let file = match result {
            Ok(outcome) => {
                report.summary.merge(outcome.summary.clone());
                emit(&input, &outcome, options)?
            }
            Err(error) => failed(&input.path, error, &mut report.summary),
        };
        report.files.push(file);
    }

    info!(
        files = report.files.len(),
        changed = report.summary.units_changed,
        rewrites = report.summary.rewrites,
        errors = report.summary.errors.len(),
        "Batch finished"
    );
    Ok(report)
}

fn emit(input: &UnitInput, outcome: &RewriteOutcome, options: &DriverOptions) -> Result<FileReport> {
    let path = &input.path;
    let status = if outcome.summary.units_changed > 0 {
        FileStatus::Changed {
            rewrites: outcome.summary.rewrites,
        }
    } else {
        FileStatus::Unchanged
    };
    let rendered = render(&outcome.unit, options.emit)?;

    let written_to = match &options.output {
        Some(dir) => {
            let target = output_path(dir, &input.relative, options.emit);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory {}", parent.display()))?;
            }
            std::fs::write(&target, rendered).with_context(|| format!("Failed to write {}", target.display()))?;
            debug!(input = %path.display(), output = %target.display(), "Wrote unit");
            Some(target)
        }
        None => {
            println!("// {}", path.display());
            println!("{rendered}");
            None
        }
    };

    Ok(FileReport {
        path: path.clone(),
        status,
        written_to,
    })
}

fn failed(path: &Path, error: anyhow::Error, summary: &mut TransformationSummary) -> FileReport {
    let status = match error.downcast_ref::<LogliftError>() {
        Some(LogliftError::NonConvergence { cycles, .. }) => {
            warn!(file = %path.display(), cycles, "Unit did not converge, left unchanged");
            FileStatus::NonConvergent { cycles: *cycles }
        }
        _ => {
            warn!(file = %path.display(), error = %format!("{error:#}"), "Failed to rewrite unit");
            FileStatus::Failed(format!("{error:#}"))
        }
    };
    summary.errors.push(format!("{}: {status}", path.display()));
    FileReport {
        path: path.to_path_buf(),
        status,
        written_to: None,
    }
}

/// `<output>/<relative path>` with the format's extension.
fn output_path(dir: &Path, relative: &Path, format: EmitFormat) -> PathBuf {
    let mut target = dir.join(relative);
    target.set_extension(format.extension());
    target
}
