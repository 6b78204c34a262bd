use anyhow::Result;
use dbcontext_splitter::config::{Config, ReferenceMode, SplitOptions};
use dbcontext_splitter::{SplitError, split};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

const SHOP_CONTEXT: &str = "using System;
using Microsoft.EntityFrameworkCore;
using Shop.Models;

namespace Shop.Data
{
    public class ShopContext : DbContext
    {
        protected override void OnModelCreating(ModelBuilder modelBuilder)
        {
            modelBuilder.Entity<Order>(b =>
            {
                b.HasKey(x => x.Id);
            });
        }
    }
}
";

const THREE_ENTITIES: &str = "namespace Shop.Data;

public class ShopContext : DbContext
{
    protected override void OnModelCreating(ModelBuilder modelBuilder)
    {
        modelBuilder.Entity<Order>(entity =>
        {
            entity.HasKey(e => e.Id);
            entity.Property(e => e.Total)
                .HasPrecision(18, 2);
        });

        modelBuilder.Entity<Models.Customer>(entity =>
        {
            entity.ToTable(\"Customers\");
        });

        modelBuilder.Entity<Product>(p =>
        {
            // configured by convention
        });
    }
}
";

fn setup(content: &str) -> Result<(TempDir, PathBuf)> {
    let temp_dir = tempdir()?;
    let source = temp_dir.path().join("ShopContext.cs");
    fs::write(&source, content)?;
    Ok((temp_dir, source))
}

fn options(config: Config) -> SplitOptions {
    SplitOptions::new(config)
}

fn dir_entries(dir: &Path) -> Result<Vec<String>> {
    let mut names: Vec<String> = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<std::io::Result<_>>()?;
    names.sort();
    Ok(names)
}

#[test]
fn test_single_entity_standalone_with_backup() -> Result<()> {
    let (temp_dir, source) = setup(SHOP_CONTEXT)?;

    let report = split(&source, &options(Config::default()))?;

    assert_eq!(report.block_count(), 1);
    let unit_path = temp_dir.path().join("OrderConfiguration.cs");
    let unit = fs::read_to_string(&unit_path)?;
    assert_eq!(
        unit,
        "using System;
using Microsoft.EntityFrameworkCore;
using Shop.Models;
using Microsoft.EntityFrameworkCore.Metadata.Builders;

namespace Shop.Data
{
    public class OrderConfiguration : IEntityTypeConfiguration<Order>
    {
        public void Configure(EntityTypeBuilder<Order> b)
        {
            b.HasKey(x => x.Id);
        }
    }
}
"
    );

    let rewritten = fs::read_to_string(&source)?;
    assert!(!rewritten.contains("modelBuilder.Entity<Order>"));
    assert!(rewritten.contains(
        "        {\n            modelBuilder.ApplyConfiguration(new OrderConfiguration());\n        }"
    ));

    assert_eq!(report.backups.len(), 1);
    let backup_name = report.backups[0]
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned();
    let backup_pattern = Regex::new(r"^ShopContext\.cs\.\d{14}\.bak$")?;
    assert!(backup_pattern.is_match(&backup_name), "{backup_name}");
    assert_eq!(fs::read_to_string(&report.backups[0])?, SHOP_CONTEXT);

    Ok(())
}

#[test]
fn test_suppression_without_backup() -> Result<()> {
    let (temp_dir, source) = setup(SHOP_CONTEXT)?;
    let config = Config {
        reference_mode: ReferenceMode::None,
        backup: false,
        ..Default::default()
    };

    let report = split(&source, &options(config))?;

    let rewritten = fs::read_to_string(&source)?;
    assert!(!rewritten.contains("Entity<"));
    assert!(!rewritten.contains("ApplyConfiguration"));
    assert!(rewritten.contains("OnModelCreating(ModelBuilder modelBuilder)\n        {\n        }"));
    assert!(report.backups.is_empty());
    assert_eq!(
        dir_entries(temp_dir.path())?,
        vec!["OrderConfiguration.cs", "ShopContext.cs"]
    );
    Ok(())
}

#[test]
fn test_completeness_and_document_order() -> Result<()> {
    let (temp_dir, source) = setup(THREE_ENTITIES)?;
    let out_dir = temp_dir.path().join("Configurations");
    let mut options = options(Config {
        backup: false,
        ..Default::default()
    });
    options.output_dir = Some(out_dir.clone());
    options.namespace = Some("Shop.Data.Configurations".to_string());

    let report = split(&source, &options)?;

    let class_names: Vec<&str> = report.units.iter().map(|u| u.class_name.as_str()).collect();
    assert_eq!(
        class_names,
        vec!["OrderConfiguration", "CustomerConfiguration", "ProductConfiguration"]
    );
    assert_eq!(
        dir_entries(&out_dir)?,
        vec![
            "CustomerConfiguration.cs",
            "OrderConfiguration.cs",
            "ProductConfiguration.cs"
        ]
    );

    let order = fs::read_to_string(out_dir.join("OrderConfiguration.cs"))?;
    assert!(order.contains("namespace Shop.Data.Configurations\n{"));
    assert!(order.contains("using Shop.Data;"));
    assert!(order.contains(
        "            entity.HasKey(e => e.Id);\n            entity.Property(e => e.Total)\n                .HasPrecision(18, 2);\n"
    ));

    let customer = fs::read_to_string(out_dir.join("CustomerConfiguration.cs"))?;
    assert!(customer.contains("IEntityTypeConfiguration<Models.Customer>"));
    assert!(customer.contains("EntityTypeBuilder<Models.Customer> entity"));

    let product = fs::read_to_string(out_dir.join("ProductConfiguration.cs"))?;
    assert!(product.contains("            // configured by convention\n"));

    let rewritten = fs::read_to_string(&source)?;
    let order_at = rewritten.find("new OrderConfiguration()").unwrap();
    let customer_at = rewritten.find("new CustomerConfiguration()").unwrap();
    let product_at = rewritten.find("new ProductConfiguration()").unwrap();
    assert!(order_at < customer_at && customer_at < product_at);
    assert_eq!(rewritten.matches("ApplyConfiguration").count(), 3);
    Ok(())
}

#[test]
fn test_aggregate_mode_groups_references() -> Result<()> {
    let (_temp_dir, source) = setup(THREE_ENTITIES)?;
    let config = Config {
        reference_mode: ReferenceMode::Aggregate,
        backup: false,
        ..Default::default()
    };

    split(&source, &options(config))?;

    let rewritten = fs::read_to_string(&source)?;
    assert!(rewritten.contains(
        "        modelBuilder.ApplyConfiguration(new OrderConfiguration());
        modelBuilder.ApplyConfiguration(new CustomerConfiguration());
        modelBuilder.ApplyConfiguration(new ProductConfiguration());"
    ));
    Ok(())
}

#[test]
fn test_no_match_leaves_filesystem_untouched() -> Result<()> {
    let content = "public class EmptyContext : DbContext { }\n";
    let (temp_dir, source) = setup(content)?;
    let mut options = options(Config::default());
    options.output_dir = Some(temp_dir.path().join("out"));

    let report = split(&source, &options)?;

    assert_eq!(report.block_count(), 0);
    assert!(report.rewritten.is_none());
    assert!(report.backups.is_empty());
    assert_eq!(dir_entries(temp_dir.path())?, vec!["ShopContext.cs"]);
    assert_eq!(fs::read_to_string(&source)?, content);
    Ok(())
}

#[test]
fn test_missing_source_fails_before_creating_output() -> Result<()> {
    let temp_dir = tempdir()?;
    let out_dir = temp_dir.path().join("out");
    let mut options = options(Config::default());
    options.output_dir = Some(out_dir.clone());

    let err = split(&temp_dir.path().join("Missing.cs"), &options).unwrap_err();

    assert!(matches!(err, SplitError::SourceNotFound(_)));
    assert_eq!(err.exit_code(), 3);
    assert!(!out_dir.exists());
    Ok(())
}

#[test]
fn test_embedded_mode_missing_target_is_fatal() -> Result<()> {
    let (temp_dir, source) = setup(SHOP_CONTEXT)?;
    let config = Config {
        embed: true,
        ..Default::default()
    };

    let err = split(&source, &options(config)).unwrap_err();

    match &err {
        SplitError::MissingEmbedTarget { type_name, path } => {
            assert_eq!(type_name, "Order");
            assert_eq!(path, &temp_dir.path().join("Order.cs"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(fs::read_to_string(&source)?, SHOP_CONTEXT);
    assert_eq!(dir_entries(temp_dir.path())?, vec!["ShopContext.cs"]);
    Ok(())
}

#[test]
fn test_embedded_mode_appends_to_entity_file() -> Result<()> {
    let (temp_dir, source) = setup(SHOP_CONTEXT)?;
    let entity_path = temp_dir.path().join("Order.cs");
    let entity = "using System;\n\nnamespace Shop.Models;\n\npublic class Order\n{\n    public int Id { get; set; }\n}\n";
    fs::write(&entity_path, entity)?;
    let config = Config {
        embed: true,
        ..Default::default()
    };

    let report = split(&source, &options(config))?;

    let updated = fs::read_to_string(&entity_path)?;
    assert_eq!(
        updated,
        "using System;
using Microsoft.EntityFrameworkCore.Metadata.Builders;
using Shop.Data;

namespace Shop.Models;

public class Order
{
    public int Id { get; set; }
}

public class OrderConfiguration : IEntityTypeConfiguration<Order>
{
    public void Configure(EntityTypeBuilder<Order> b)
    {
        b.HasKey(x => x.Id);
    }
}
"
    );

    assert_eq!(report.backups.len(), 2);
    assert!(
        report.backups[1]
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("Order.cs.")
    );
    assert_eq!(fs::read_to_string(&report.backups[1])?, entity);
    assert!(!temp_dir.path().join("OrderConfiguration.cs").exists());
    assert!(
        fs::read_to_string(&source)?.contains("modelBuilder.ApplyConfiguration(new OrderConfiguration());")
    );
    Ok(())
}

#[test]
fn test_rerun_overwrites_same_artifact() -> Result<()> {
    let (temp_dir, source) = setup(SHOP_CONTEXT)?;
    let config = Config {
        backup: false,
        ..Default::default()
    };

    let first = split(&source, &options(config.clone()))?;
    fs::write(&source, SHOP_CONTEXT)?;
    let second = split(&source, &options(config))?;

    assert_eq!(first.writes[0].path, second.writes[0].path);
    assert_eq!(first.writes[0].contents, second.writes[0].contents);
    assert_eq!(
        dir_entries(temp_dir.path())?,
        vec!["OrderConfiguration.cs", "ShopContext.cs"]
    );
    Ok(())
}

#[test]
fn test_crlf_document_keeps_line_endings() -> Result<()> {
    let crlf = SHOP_CONTEXT.replace('\n', "\r\n");
    let (temp_dir, source) = setup(&crlf)?;
    let config = Config {
        backup: false,
        ..Default::default()
    };

    split(&source, &options(config))?;

    let unit = fs::read_to_string(temp_dir.path().join("OrderConfiguration.cs"))?;
    assert!(!unit.replace("\r\n", "").contains('\n'));
    assert!(unit.contains("\r\n            b.HasKey(x => x.Id);\r\n"));

    let rewritten = fs::read_to_string(&source)?;
    assert!(!rewritten.replace("\r\n", "").contains('\n'));
    assert!(rewritten.contains("\r\n            modelBuilder.ApplyConfiguration(new OrderConfiguration());\r\n"));
    Ok(())
}
