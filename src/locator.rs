//! # Block Locator
//!
//! Finds every `modelBuilder.Entity<T>(p => { ... });` block in a document.
//!
//! A regex only finds candidate start tokens. Everything after the `<` is walked with the
//! structural [`Scanner`], so the body ends at the brace that actually matches its opening
//! brace. A same-shaped block nested inside another block's body is part of the enclosing
//! block's statements, and a following sibling block is never swallowed.

use fancy_regex::Regex;
use std::ops::Range;
use tracing::{debug, warn};

use crate::document::line_start;
use crate::scanner::Scanner;

/// One located block. All ranges are byte offsets into the original document text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDescriptor {
    /// From the receiver token through the terminating `;`.
    pub outer: Range<usize>,
    /// `outer` widened over the whitespace that precedes it on its own line, including
    /// that line's leading line break. Removing it removes the whole statement line.
    pub removal: Range<usize>,
    /// The text between `removal.start` and `outer.start`: the call site's line break and
    /// indentation, reused when a reference statement takes the block's place.
    pub call_site_prefix: String,
    /// The type argument as written, possibly qualified.
    pub type_name: String,
    /// The lambda parameter, reused verbatim in the generated signature.
    pub parameter_name: String,
    /// Raw text between the body braces.
    pub inner_statements: String,
}

impl BlockDescriptor {
    /// The trailing segment of the type name, used for file and class names.
    ///
    /// `Models.Order` becomes `Order`, `global::Shop.Order` becomes `Order` and generic
    /// arguments are dropped (`Audited<Order>` becomes `Audited`).
    pub fn simple_name(&self) -> &str {
        let head = self
            .type_name
            .split('<')
            .next()
            .unwrap_or(&self.type_name)
            .trim();
        head.rsplit(['.', ':']).next().unwrap_or(head)
    }

    /// Indentation of the call site, without the line break.
    pub fn call_site_indent(&self) -> &str {
        self.call_site_prefix.trim_start_matches(['\r', '\n'])
    }

    pub fn outer_text<'a>(&self, document: &'a str) -> &'a str {
        &document[self.outer.clone()]
    }
}

pub struct BlockLocator {
    start_pattern: Regex,
}

impl BlockLocator {
    /// Builds a locator for blocks hanging off `receiver` (normally `modelBuilder`).
    pub fn new(receiver: &str) -> anyhow::Result<Self> {
        let pattern = format!(
            r"(?<!\w){}\s*\.\s*Entity\s*<",
            fancy_regex::escape(receiver)
        );
        Ok(Self {
            start_pattern: Regex::new(&pattern)?,
        })
    }

    /// Returns every block in document order.
    pub fn locate(&self, text: &str) -> Vec<BlockDescriptor> {
        let mut blocks = Vec::new();
        let mut search_from = 0;

        while search_from < text.len() {
            let candidate = match self.start_pattern.find_from_pos(text, search_from) {
                Ok(Some(m)) => m,
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, offset = search_from, "block search aborted");
                    break;
                }
            };

            // The match always ends on the `<` of the type argument.
            let angle = candidate.end() - 1;
            match parse_block(text, candidate.start(), angle) {
                Some(block) => {
                    debug!(
                        type_name = %block.type_name,
                        parameter = %block.parameter_name,
                        start = block.outer.start,
                        end = block.outer.end,
                        "located block"
                    );
                    search_from = block.outer.end;
                    blocks.push(block);
                }
                None => {
                    debug!(offset = candidate.start(), "candidate does not have block shape");
                    search_from = candidate.end();
                }
            }
        }

        blocks
    }
}

fn parse_block(text: &str, start: usize, angle: usize) -> Option<BlockDescriptor> {
    let mut scanner = Scanner::new(text, angle);

    let close_angle = scanner.find_matching(b'<', b'>')?;
    let type_name = text[angle + 1..close_angle].trim();
    if type_name.is_empty() {
        return None;
    }

    scanner.skip_trivia();
    if !scanner.eat("(") {
        return None;
    }
    scanner.skip_trivia();
    let parameter_name = if scanner.eat("(") {
        scanner.skip_trivia();
        let name = scanner.identifier()?;
        scanner.skip_trivia();
        if !scanner.eat(")") {
            return None;
        }
        name
    } else {
        scanner.identifier()?
    };

    scanner.skip_trivia();
    if !scanner.eat("=>") {
        return None;
    }
    scanner.skip_trivia();
    let open_brace = scanner.position();
    let close_brace = scanner.find_matching(b'{', b'}')?;

    scanner.skip_trivia();
    if !scanner.eat(")") {
        return None;
    }
    scanner.skip_trivia();
    if !scanner.eat(";") {
        return None;
    }
    let end = scanner.position();

    let removal_start = removal_start(text, start);

    Some(BlockDescriptor {
        outer: start..end,
        removal: removal_start..end,
        call_site_prefix: text[removal_start..start].to_string(),
        type_name: type_name.to_string(),
        parameter_name: parameter_name.to_string(),
        inner_statements: text[open_brace + 1..close_brace].to_string(),
    })
}

/// Where removal of a block starting at `start` begins: the preceding line break if only
/// spaces and tabs sit between it and the block, `start` otherwise.
fn removal_start(text: &str, start: usize) -> usize {
    let line = line_start(text, start);
    if !text[line..start].chars().all(|c| c == ' ' || c == '\t') {
        return start;
    }
    if line == 0 {
        return 0;
    }
    let mut removal = line - 1;
    if removal > 0 && text.as_bytes()[removal - 1] == b'\r' {
        removal -= 1;
    }
    removal
}
