//! # Generated Units
//!
//! Builds the `IEntityTypeConfiguration<T>` class for one located block, either as a
//! standalone file or as a fragment to append to the entity's own file.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::indent;
use crate::locator::BlockDescriptor;

static USING_LINE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^using\s+[^;]*;").expect("Invalid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// A new `{Type}{suffix}` file.
    Standalone,
    /// Appended to the existing `{Type}` file.
    Embedded,
}

/// Everything about the source document a unit needs, resolved once per run.
#[derive(Debug, Clone)]
pub struct UnitContext<'a> {
    pub config: &'a Config,
    /// `using` directives copied from the `DbContext` header.
    pub usings: Vec<&'a str>,
    /// Namespace of the `DbContext`, imported so entity types resolve.
    pub context_namespace: &'a str,
    /// Namespace that wraps standalone units.
    pub namespace: &'a str,
    pub line_ending: &'a str,
}

impl UnitContext<'_> {
    fn indent(&self, depth: usize) -> String {
        self.config.indent_unit.repeat(depth)
    }

    /// The imports every unit needs beyond what the `DbContext` already had.
    pub fn fixed_usings(&self) -> Vec<String> {
        let mut usings = self.config.extra_usings.clone();
        if !self.context_namespace.is_empty() {
            usings.push(self.context_namespace_using());
        }
        usings
    }

    fn context_namespace_using(&self) -> String {
        format!("using {};", self.context_namespace)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedUnit {
    pub class_name: String,
    /// The type as written in the block, possibly qualified.
    pub type_name: String,
    pub path: PathBuf,
    pub destination: Destination,
    /// Full contents of a standalone file, or the fragment appended in embedded mode.
    pub contents: String,
}

pub fn class_name(block: &BlockDescriptor, config: &Config) -> String {
    format!("{}{}", block.simple_name(), config.suffix)
}

/// Path of the standalone file for `block`. Same type and suffix always give the same path.
pub fn standalone_path(block: &BlockDescriptor, config: &Config, output_dir: &Path) -> PathBuf {
    output_dir.join(format!("{}.{}", class_name(block, config), config.extension))
}

/// Path of the entity's own file, the target in embedded mode.
pub fn embed_target_path(block: &BlockDescriptor, config: &Config, output_dir: &Path) -> PathBuf {
    output_dir.join(format!("{}.{}", block.simple_name(), config.extension))
}

/// The configuration class with its outermost line indented `depth` levels.
fn class_declaration(block: &BlockDescriptor, ctx: &UnitContext, depth: usize) -> String {
    let name = class_name(block, ctx.config);
    let type_name = &block.type_name;
    let statements =
        indent::reindent(&block.inner_statements, &ctx.indent(depth + 2), ctx.line_ending);

    let mut lines = vec![
        format!(
            "{}public class {name} : IEntityTypeConfiguration<{type_name}>",
            ctx.indent(depth)
        ),
        format!("{}{{", ctx.indent(depth)),
        format!(
            "{}public void Configure(EntityTypeBuilder<{type_name}> {})",
            ctx.indent(depth + 1),
            block.parameter_name
        ),
        format!("{}{{", ctx.indent(depth + 1)),
    ];
    if !statements.is_empty() {
        lines.push(statements);
    }
    lines.push(format!("{}}}", ctx.indent(depth + 1)));
    lines.push(format!("{}}}", ctx.indent(depth)));
    lines.join(ctx.line_ending)
}

pub fn standalone(block: &BlockDescriptor, ctx: &UnitContext, output_dir: &Path) -> GeneratedUnit {
    let eol = ctx.line_ending;
    let mut usings: Vec<String> = ctx.usings.iter().map(|u| u.to_string()).collect();
    for using in ctx.fixed_usings() {
        // A unit in the context's own namespace sees its types without an import.
        let own_namespace =
            ctx.namespace == ctx.context_namespace && using == ctx.context_namespace_using();
        if !own_namespace && !usings.contains(&using) {
            usings.push(using);
        }
    }

    let mut contents = String::new();
    for using in &usings {
        contents.push_str(using);
        contents.push_str(eol);
    }
    if !usings.is_empty() {
        contents.push_str(eol);
    }

    if ctx.namespace.is_empty() {
        contents.push_str(&class_declaration(block, ctx, 0));
    } else {
        contents.push_str(&format!("namespace {}{eol}{{{eol}", ctx.namespace));
        contents.push_str(&class_declaration(block, ctx, 1));
        contents.push_str(&format!("{eol}}}"));
    }
    contents.push_str(eol);

    GeneratedUnit {
        class_name: class_name(block, ctx.config),
        type_name: block.type_name.clone(),
        path: standalone_path(block, ctx.config, output_dir),
        destination: Destination::Standalone,
        contents,
    }
}

/// The class to append to the entity's file, declared at the top nesting level.
pub fn embedded(block: &BlockDescriptor, ctx: &UnitContext, output_dir: &Path) -> GeneratedUnit {
    GeneratedUnit {
        class_name: class_name(block, ctx.config),
        type_name: block.type_name.clone(),
        path: embed_target_path(block, ctx.config, output_dir),
        destination: Destination::Embedded,
        contents: class_declaration(block, ctx, 0),
    }
}

/// Adds `usings` after the last `using` line of `existing` (skipping ones already there)
/// and appends `fragment` at the end of the file.
pub fn embed_into(existing: &str, fragment: &str, usings: &[String], line_ending: &str) -> String {
    let missing: Vec<&String> = usings
        .iter()
        .filter(|using| !existing.lines().any(|line| line.trim() == using.as_str()))
        .collect();

    let mut contents = match USING_LINE_REGEX.find_iter(existing).last() {
        Some(last) => {
            let mut contents = existing[..last.end()].to_string();
            for using in &missing {
                contents.push_str(line_ending);
                contents.push_str(using);
            }
            contents.push_str(&existing[last.end()..]);
            contents
        }
        None => {
            let mut contents = String::new();
            for using in &missing {
                contents.push_str(using);
                contents.push_str(line_ending);
            }
            if !missing.is_empty() && !existing.is_empty() {
                contents.push_str(line_ending);
            }
            contents.push_str(existing);
            contents
        }
    };

    if !contents.is_empty() && !contents.ends_with('\n') {
        contents.push_str(line_ending);
    }
    contents.push_str(line_ending);
    contents.push_str(fragment);
    contents.push_str(line_ending);
    contents
}
