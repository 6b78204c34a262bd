//! Textual re-indentation of captured block bodies.
//!
//! This is not parser aware: the indentation of the first statement line is taken as the
//! body's base prefix, and exactly that prefix is swapped for the target one at the start
//! of every line. Lines that do not start with it are kept as they are.

/// Leading spaces and tabs of the first line that has any content.
pub fn detect_prefix(statements: &str) -> &str {
    statements
        .lines()
        .find(|line| !line.trim().is_empty())
        .map(|line| {
            let width = line
                .find(|c: char| c != ' ' && c != '\t')
                .unwrap_or(line.len());
            &line[..width]
        })
        .unwrap_or("")
}

/// Re-indents `statements` to `new_prefix` and joins the lines with `line_ending`.
///
/// Blank lines before the first and after the last statement are dropped. Every kept line
/// is otherwise copied byte for byte: trailing whitespace can sit inside a multi-line
/// verbatim string. An all-blank body yields an empty string.
pub fn reindent(statements: &str, new_prefix: &str, line_ending: &str) -> String {
    let base = detect_prefix(statements);
    let lines: Vec<&str> = statements.lines().collect();
    let is_blank = |line: &&str| line.trim().is_empty();

    let Some(first) = lines.iter().position(|line| !is_blank(line)) else {
        return String::new();
    };
    let last = lines
        .iter()
        .rposition(|line| !is_blank(line))
        .unwrap_or(first);

    lines[first..=last]
        .iter()
        .map(|line| match line.strip_prefix(base) {
            Some(rest) if !is_blank(line) => format!("{new_prefix}{rest}"),
            _ => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join(line_ending)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_prefix_skips_leading_blank_lines() {
        let body = "\n   \n        b.HasKey(x => x.Id);\n    ";
        assert_eq!(detect_prefix(body), "        ");
        assert_eq!(detect_prefix(""), "");
        assert_eq!(detect_prefix("\tfoo();"), "\t");
    }

    #[test]
    fn test_reindent_replaces_base_prefix() {
        let body = "\n                entity.HasKey(e => e.Id);\n\n                entity.Property(e => e.Name)\n                    .IsRequired();\n            ";
        let result = reindent(body, "            ", "\n");
        assert_eq!(
            result,
            "            entity.HasKey(e => e.Id);\n\n            entity.Property(e => e.Name)\n                .IsRequired();"
        );
    }

    #[test]
    fn test_reindent_leaves_shallower_lines_alone() {
        let body = "\n        a();\n    b();\n        c();\n";
        let result = reindent(body, "  ", "\n");
        assert_eq!(result, "  a();\n    b();\n  c();");
    }

    #[test]
    fn test_reindent_every_base_line_gets_new_prefix() {
        let body = "\r\n\t\tfirst();\r\n\t\t\tdeeper();\r\n\tshallow();\r\n\t\tlast();\r\n\t";
        let result = reindent(body, "____", "\r\n");
        for line in result.split("\r\n") {
            if line.starts_with("\tshallow") {
                continue;
            }
            assert!(line.starts_with("____"), "line not re-indented: {line:?}");
        }
        assert!(result.contains("\tshallow();"));
        assert!(result.contains("____\tdeeper();"));
    }

    #[test]
    fn test_reindent_single_line_body() {
        assert_eq!(reindent(" e.HasNoKey(); ", "    ", "\n"), "    e.HasNoKey(); ");
    }

    #[test]
    fn test_reindent_keeps_trailing_whitespace() {
        let body = "\n        a(@\"x   \n  y\");\n    b();   \n";
        let result = reindent(body, "  ", "\n");
        assert_eq!(result, "  a(@\"x   \n  y\");\n    b();   ");
    }

    #[test]
    fn test_reindent_blank_body() {
        assert_eq!(reindent("\n   \n  ", "    ", "\n"), "");
        assert_eq!(reindent("", "    ", "\n"), "");
    }
}
