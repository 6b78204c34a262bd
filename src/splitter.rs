//! # Split Run
//!
//! One run over one `DbContext` file, in two phases like a patch: everything is planned and
//! validated in memory first (blocks, units, embed targets, the rewritten document), and
//! only then is anything written. A missing embed target therefore aborts the run with
//! the filesystem untouched. Write failures during the second phase abort immediately and
//! leave earlier writes in place.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::backup;
use crate::config::SplitOptions;
use crate::document::{Document, line_ending_of};
use crate::error::SplitError;
use crate::locator::{BlockDescriptor, BlockLocator};
use crate::rewriter;
use crate::scanner::brace_balance;
use crate::unit::{self, Destination, GeneratedUnit, UnitContext};

/// A file the run will write, with its final contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedWrite {
    pub path: PathBuf,
    pub destination: Destination,
    pub contents: String,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub document_path: PathBuf,
    /// One entry per located block, in document order.
    pub units: Vec<GeneratedUnit>,
    /// Files written, or that would be written in a dry run, in first-planned order.
    pub writes: Vec<PlannedWrite>,
    pub backups: Vec<PathBuf>,
    pub original: String,
    /// `None` when no blocks were found and the document is left alone.
    pub rewritten: Option<String>,
    pub warnings: Vec<String>,
    pub dry_run: bool,
}

impl RunReport {
    pub fn block_count(&self) -> usize {
        self.units.len()
    }
}

pub fn split(source: &Path, options: &SplitOptions) -> Result<RunReport, SplitError> {
    let document = Document::load(source)?;
    let config = &options.config;

    let locator = BlockLocator::new(&config.receiver).map_err(|e| SplitError::Config {
        path: document.path.clone(),
        message: format!("invalid receiver '{}': {e}", config.receiver),
    })?;
    let blocks = locator.locate(&document.text);

    let mut report = RunReport {
        document_path: document.path.clone(),
        original: document.text.clone(),
        dry_run: options.dry_run,
        ..Default::default()
    };

    if blocks.is_empty() {
        info!(file = %document.file_name(), "no entity definitions found");
        return Ok(report);
    }
    info!(count = blocks.len(), "located entity blocks");

    report.warnings = check_balance(&blocks);

    let output_dir = match &options.output_dir {
        Some(dir) => std::path::absolute(dir).map_err(|source| SplitError::Read {
            path: dir.clone(),
            source,
        })?,
        None => document.directory().to_path_buf(),
    };
    let context_namespace = document.namespace();
    let namespace = options.namespace.as_deref().unwrap_or(context_namespace);
    let ctx = UnitContext {
        config,
        usings: document.usings(),
        context_namespace,
        namespace,
        line_ending: document.line_ending(),
    };

    // --- Phase 1: plan ---
    let (units, writes) = plan_units(&blocks, &ctx, &output_dir)?;
    let replacement_plan = rewriter::plan(&blocks, config, ctx.line_ending);
    if replacement_plan.is_empty() {
        warn!("no replacements planned for the located blocks");
    }
    debug!(
        replacements = replacement_plan.len(),
        mode = ?config.reference_mode,
        "planned DbContext rewrite"
    );
    let rewritten = replacement_plan.apply(&document.text);

    report.units = units;
    report.writes = writes;
    report.rewritten = Some(rewritten);

    if options.dry_run {
        return Ok(report);
    }

    // --- Phase 2: execute ---
    fs::create_dir_all(&output_dir).map_err(|source| SplitError::Write {
        path: output_dir.clone(),
        source,
    })?;

    if config.backup {
        let timestamp = backup::timestamp(chrono::Local::now());
        report
            .backups
            .push(backup::create_backup(&document.path, &timestamp)?);
        for write in &report.writes {
            if write.destination == Destination::Embedded {
                report
                    .backups
                    .push(backup::create_backup(&write.path, &timestamp)?);
            }
        }
    }

    for write in &report.writes {
        fs::write(&write.path, &write.contents).map_err(|source| SplitError::Write {
            path: write.path.clone(),
            source,
        })?;
        debug!(path = %write.path.display(), "wrote unit");
    }

    if let Some(rewritten) = &report.rewritten {
        fs::write(&document.path, rewritten).map_err(|source| SplitError::Write {
            path: document.path.clone(),
            source,
        })?;
        info!(path = %document.path.display(), "rewrote DbContext");
    }

    Ok(report)
}

/// Builds every unit and the final contents of every file they land in.
///
/// Several blocks can land in one file: embedded units for types sharing a simple name are
/// appended one after another, and a standalone path planned twice keeps the last unit.
fn plan_units(
    blocks: &[BlockDescriptor],
    ctx: &UnitContext,
    output_dir: &Path,
) -> Result<(Vec<GeneratedUnit>, Vec<PlannedWrite>), SplitError> {
    let mut units = Vec::with_capacity(blocks.len());
    let mut writes: Vec<PlannedWrite> = Vec::new();
    let mut index_by_path: HashMap<PathBuf, usize> = HashMap::new();

    for block in blocks {
        let mut unit = if ctx.config.embed {
            unit::embedded(block, ctx, output_dir)
        } else {
            unit::standalone(block, ctx, output_dir)
        };

        let contents = match unit.destination {
            Destination::Standalone => unit.contents.clone(),
            Destination::Embedded => {
                let existing = match index_by_path.get(&unit.path) {
                    Some(&i) => writes[i].contents.clone(),
                    None => read_embed_target(&unit)?,
                };
                // The entity file keeps its own line-ending convention.
                let target_ctx = UnitContext {
                    line_ending: line_ending_of(&existing),
                    ..ctx.clone()
                };
                unit = unit::embedded(block, &target_ctx, output_dir);
                unit::embed_into(
                    &existing,
                    &unit.contents,
                    &ctx.fixed_usings(),
                    target_ctx.line_ending,
                )
            }
        };

        match index_by_path.get(&unit.path) {
            Some(&i) => {
                if unit.destination == Destination::Standalone {
                    warn!(
                        path = %unit.path.display(),
                        type_name = %unit.type_name,
                        "several blocks map to the same unit; the last one wins"
                    );
                }
                writes[i].contents = contents;
            }
            None => {
                index_by_path.insert(unit.path.clone(), writes.len());
                writes.push(PlannedWrite {
                    path: unit.path.clone(),
                    destination: unit.destination,
                    contents,
                });
            }
        }
        units.push(unit);
    }

    Ok((units, writes))
}

fn read_embed_target(unit: &GeneratedUnit) -> Result<String, SplitError> {
    if !unit.path.is_file() {
        return Err(SplitError::MissingEmbedTarget {
            type_name: unit.type_name.clone(),
            path: unit.path.clone(),
        });
    }
    fs::read_to_string(&unit.path).map_err(|source| SplitError::Read {
        path: unit.path.clone(),
        source,
    })
}

/// Warns about bodies whose braces do not balance, a sign the block was cut in the wrong place.
fn check_balance(blocks: &[BlockDescriptor]) -> Vec<String> {
    blocks
        .iter()
        .filter_map(|block| {
            let balance = brace_balance(&block.inner_statements);
            (balance != 0).then(|| {
                let message = format!(
                    "Unbalanced braces ({balance:+}) in the body of Entity<{}> at byte {}",
                    block.type_name, block.outer.start
                );
                warn!("{message}");
                message
            })
        })
        .collect()
}
