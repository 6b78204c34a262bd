//! # Document Rewriter
//!
//! Turns located blocks into a `ReplacementPlan` and applies it to the `DbContext` text.
//! Replacements are keyed by the byte ranges captured during the scan, never by searching
//! for the block's text again, so two blocks with identical text are still told apart.

use std::ops::Range;

use crate::config::{Config, ReferenceMode};
use crate::locator::BlockDescriptor;
use crate::unit;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub span: Range<usize>,
    pub text: String,
}

/// Ordered, non-overlapping replacements against one original document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplacementPlan {
    replacements: Vec<Replacement>,
}

impl ReplacementPlan {
    pub fn push(&mut self, span: Range<usize>, text: String) {
        self.replacements.push(Replacement { span, text });
    }

    pub fn len(&self) -> usize {
        self.replacements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replacements.is_empty()
    }

    /// Applies every replacement to `document`, last span first, so earlier offsets stay valid.
    pub fn apply(&self, document: &str) -> String {
        let mut ordered: Vec<&Replacement> = self.replacements.iter().collect();
        ordered.sort_by_key(|r| std::cmp::Reverse(r.span.start));
        debug_assert!(
            ordered.windows(2).all(|w| w[1].span.end <= w[0].span.start),
            "overlapping replacements"
        );

        let mut result = document.to_string();
        for replacement in ordered {
            result.replace_range(replacement.span.clone(), &replacement.text);
        }
        result
    }
}

/// `modelBuilder.ApplyConfiguration(new OrderConfiguration());`
pub fn reference_statement(block: &BlockDescriptor, config: &Config) -> String {
    format!(
        "{}.ApplyConfiguration(new {}());",
        config.receiver,
        unit::class_name(block, config)
    )
}

/// One replacement per block, in document order.
pub fn plan(blocks: &[BlockDescriptor], config: &Config, line_ending: &str) -> ReplacementPlan {
    let mut plan = ReplacementPlan::default();

    match config.reference_mode {
        ReferenceMode::Inline => {
            for block in blocks {
                let text = format!(
                    "{}{}",
                    block.call_site_prefix,
                    reference_statement(block, config)
                );
                plan.push(block.removal.clone(), text);
            }
        }
        ReferenceMode::None => {
            for block in blocks {
                plan.push(block.removal.clone(), String::new());
            }
        }
        ReferenceMode::Aggregate => {
            let Some(first) = blocks.first() else {
                return plan;
            };
            let separator = format!("{line_ending}{}", first.call_site_indent());
            let statements: Vec<String> = blocks
                .iter()
                .map(|block| reference_statement(block, config))
                .collect();
            plan.push(
                first.removal.clone(),
                format!("{}{}", first.call_site_prefix, statements.join(&separator)),
            );
            for block in &blocks[1..] {
                plan.push(block.removal.clone(), String::new());
            }
        }
    }

    plan
}
