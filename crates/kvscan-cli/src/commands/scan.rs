use std::sync::Arc;

use anyhow::Result;
use kvscan_config::{Config, ScanConfig};
use kvscan_core::ScanMode;
use kvscan_engine::{ScanOptions, Scanner};
use kvscan_security::Redactor;
use kvscan_storage::{SqliteSource, StorageError};

use crate::cli::ScanArgs;
use crate::report::{ArtifactStatus, ExportView, Format, ReportWriter, text};

pub async fn handle(args: ScanArgs, config: Config) -> Result<()> {
    let config = if args.keyword.is_empty() {
        config
    } else {
        config.with_custom_keywords(args.keyword.clone())
    };

    // An invalid taxonomy is fatal before the store is touched
    let taxonomy = Arc::new(config.taxonomy()?);
    let options = scan_options(&args, &config.scan);

    let Some(path) = super::find_store(args.store) else {
        super::print_store_not_found();
        return Ok(());
    };

    let source = match SqliteSource::open(&path).await {
        Ok(source) => source,
        Err(StorageError::NotFound(path)) => {
            println!("Store not found: {}", path.display());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let report = Scanner::new(taxonomy.clone(), options).scan(&source).await?;
    source.close().await;

    let include_sensitive = args.include_sensitive || config.export.include_sensitive;
    let redactor = Redactor::new(taxonomy.tiers());
    let view = ExportView::new(&report, &redactor, include_sensitive);

    print!("{}", text::render(&view));

    if report.is_empty() {
        println!("\nNo matches found.");
        return Ok(());
    }
    if args.no_export {
        return Ok(());
    }

    let mut formats = if args.format.is_empty() {
        Format::from_names(&config.export.formats)
    } else {
        args.format
    };
    if formats.is_empty() {
        formats = Format::ALL.to_vec();
    }
    let output_dir = args.output.unwrap_or(config.export.output_dir);

    let summary = ReportWriter::new(output_dir, formats).write(&view)?;

    println!("\nReports in {}:", summary.dir.display());
    for artifact in &summary.artifacts {
        match &artifact.status {
            ArtifactStatus::Written => println!("  ✓ {}", artifact.path.display()),
            ArtifactStatus::Failed(reason) => {
                println!("  ✗ {}: {}", artifact.format.file_name(), reason)
            }
        }
    }
    if !include_sensitive && summary.redacted_fields > 0 {
        println!("  {} high-sensitivity fields masked", summary.redacted_fields);
    }
    if summary.failed() > 0 {
        tracing::warn!(
            "{} of {} reports could not be written",
            summary.failed(),
            summary.artifacts.len()
        );
    }

    Ok(())
}

fn scan_options(args: &ScanArgs, config: &ScanConfig) -> ScanOptions {
    let (mode, cap, analyze_patterns) = if args.quick {
        (
            ScanMode::Quick,
            args.max_results.unwrap_or(config.quick_max_results),
            false,
        )
    } else {
        (
            ScanMode::Full,
            args.max_results.unwrap_or(config.max_results),
            config.analyze_patterns,
        )
    };

    ScanOptions {
        batch_size: args.batch_size.unwrap_or(config.batch_size).max(1),
        // 0 means no cap
        max_results: (cap > 0).then_some(cap),
        mode,
        top_keywords: config.top_keywords,
        analyze_patterns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    use crate::cli::{Cli, Commands};

    fn parse(args: &[&str]) -> ScanArgs {
        let mut argv = vec!["kvscan", "scan"];
        argv.extend_from_slice(args);
        match Cli::parse_from(argv).command {
            Commands::Scan(args) => args,
            _ => panic!("expected scan"),
        }
    }

    #[test]
    fn test_full_mode_defaults() {
        let options = scan_options(&parse(&[]), &ScanConfig::default());

        assert_eq!(options.mode, ScanMode::Full);
        assert_eq!(options.max_results, None);
        assert_eq!(options.batch_size, 500);
        assert!(options.analyze_patterns);
    }

    #[test]
    fn test_quick_mode_caps_and_skips_patterns() {
        let options = scan_options(&parse(&["--quick"]), &ScanConfig::default());

        assert_eq!(options.mode, ScanMode::Quick);
        assert_eq!(options.max_results, Some(1000));
        assert!(!options.analyze_patterns);
    }

    #[test]
    fn test_flags_override_config() {
        let args = parse(&["--batch-size", "0", "--max-results", "25", "-k", "cursor,agent"]);
        let options = scan_options(&args, &ScanConfig::default());

        assert_eq!(options.batch_size, 1);
        assert_eq!(options.max_results, Some(25));
        assert_eq!(args.keyword, vec!["cursor", "agent"]);
    }
}
