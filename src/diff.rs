use console::style;
use similar::{DiffTag, TextDiff};

const CONTEXT_LINES: usize = 2;

/// Colorized line diff between two versions of a file, for `--dry-run` previews.
///
/// Each line is prefixed with its 1-based line number in the old (`-`, ` `) or new (`+`)
/// text. Hunks are separated by `...`. A line whose only change is whitespace is shown once,
/// uncolored.
pub fn generate_custom_diff(old: &str, new: &str) -> String {
    if old == new {
        return "No changes detected.".to_string();
    }

    let old_lines: Vec<&str> = old.lines().collect();
    let new_lines: Vec<&str> = new.lines().collect();
    let diff = TextDiff::from_slices(&old_lines, &new_lines);

    let mut diff_lines = Vec::new();

    for (hunk_idx, group) in diff.grouped_ops(CONTEXT_LINES).iter().enumerate() {
        if hunk_idx > 0 {
            diff_lines.push("...".to_string());
        }

        for op in group {
            let (old_range, new_range) = (op.old_range(), op.new_range());
            match op.tag() {
                DiffTag::Replace => {
                    if old_range.len() == 1 && new_range.len() == 1 {
                        let old_line = old_lines[old_range.start];
                        let new_line = new_lines[new_range.start];
                        let old_normalized: String = old_line.split_whitespace().collect();
                        let new_normalized: String = new_line.split_whitespace().collect();

                        if old_normalized == new_normalized {
                            diff_lines.push(format!("  {:>4}: {new_line}", new_range.start + 1));
                            continue;
                        }
                    }

                    for i in old_range {
                        diff_lines.push(
                            style(format!("- {:>4}: {}", i + 1, old_lines[i]))
                                .red()
                                .to_string(),
                        );
                    }
                    for i in new_range {
                        diff_lines.push(
                            style(format!("+ {:>4}: {}", i + 1, new_lines[i]))
                                .green()
                                .to_string(),
                        );
                    }
                }
                DiffTag::Delete => {
                    for i in old_range {
                        diff_lines.push(
                            style(format!("- {:>4}: {}", i + 1, old_lines[i]))
                                .red()
                                .to_string(),
                        );
                    }
                }
                DiffTag::Insert => {
                    for i in new_range {
                        diff_lines.push(
                            style(format!("+ {:>4}: {}", i + 1, new_lines[i]))
                                .green()
                                .to_string(),
                        );
                    }
                }
                DiffTag::Equal => {
                    for i in old_range {
                        diff_lines.push(format!("  {:>4}: {}", i + 1, old_lines[i]));
                    }
                }
            }
        }
    }
    diff_lines.join("\n")
}
