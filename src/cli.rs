use clap::Parser;
use std::path::PathBuf;

use crate::config::{Config, ReferenceMode, SplitOptions};

/// Splits the `modelBuilder.Entity<T>(...)` blocks of a DbContext into
/// `IEntityTypeConfiguration<T>` classes.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the DbContext file
    #[arg(short = 'c', long = "dbcontext")]
    pub dbcontext: PathBuf,

    /// Output directory for the generated configuration files (default: next to the DbContext)
    #[arg(short = 'o', long = "outdir")]
    pub outdir: Option<PathBuf>,

    /// Namespace for the generated configuration classes (default: the DbContext's namespace)
    #[arg(short = 'n', long)]
    pub namespace: Option<String>,

    /// Suffix for the generated configuration classes (default: Configuration)
    #[arg(short = 's', long)]
    pub suffix: Option<String>,

    /// Append each configuration class to the entity's existing file instead of a new file
    #[arg(short = 'e', long)]
    pub embed: bool,

    /// Remove the blocks without inserting ApplyConfiguration calls
    #[arg(long, conflicts_with = "aggregate")]
    pub no_reference: bool,

    /// Insert all ApplyConfiguration calls together where the first block was
    #[arg(long)]
    pub aggregate: bool,

    /// Don't keep a copy of the original DbContext file
    #[arg(short = 'B', long)]
    pub no_backup: bool,

    /// Show what would be written without touching any file
    #[arg(long)]
    pub dry_run: bool,

    /// Configuration file (default: $XDG_CONFIG_HOME/dbcontext-splitter/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Applies the command-line overrides on top of the loaded configuration.
    pub fn into_options(self, mut config: Config) -> SplitOptions {
        if let Some(suffix) = self.suffix.filter(|s| !s.is_empty()) {
            config.suffix = suffix;
        }
        if self.embed {
            config.embed = true;
        }
        if self.no_backup {
            config.backup = false;
        }
        if self.no_reference {
            config.reference_mode = ReferenceMode::None;
        } else if self.aggregate {
            config.reference_mode = ReferenceMode::Aggregate;
        }

        SplitOptions {
            config,
            output_dir: self.outdir,
            namespace: self.namespace,
            dry_run: self.dry_run,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "dbcontext-splitter",
            "-c",
            "Ctx.cs",
            "-s",
            "Map",
            "-e",
            "-B",
            "--no-reference",
            "-n",
            "Shop.Maps",
        ]);
        let options = cli.into_options(Config::default());
        assert_eq!(options.config.suffix, "Map");
        assert!(options.config.embed);
        assert!(!options.config.backup);
        assert_eq!(options.config.reference_mode, ReferenceMode::None);
        assert_eq!(options.namespace.as_deref(), Some("Shop.Maps"));
        assert_eq!(options.output_dir, None);
    }

    #[test]
    fn test_config_values_survive_without_flags() {
        let cli = Cli::parse_from(["dbcontext-splitter", "--dbcontext", "Ctx.cs", "--dry-run"]);
        let config = Config {
            suffix: "Setup".to_string(),
            reference_mode: ReferenceMode::Aggregate,
            ..Default::default()
        };
        let options = cli.into_options(config);
        assert_eq!(options.config.suffix, "Setup");
        assert_eq!(options.config.reference_mode, ReferenceMode::Aggregate);
        assert!(options.dry_run);
    }

    #[test]
    fn test_dbcontext_is_required() {
        assert!(Cli::try_parse_from(["dbcontext-splitter"]).is_err());
    }

    #[test]
    fn test_no_reference_conflicts_with_aggregate() {
        let result = Cli::try_parse_from([
            "dbcontext-splitter",
            "-c",
            "Ctx.cs",
            "--no-reference",
            "--aggregate",
        ]);
        assert!(result.is_err());
    }
}
