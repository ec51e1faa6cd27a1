//! Human-readable summaries printed by the CLI

use crate::storage::CacheMetadata;
use crate::sync::{IndexOutcome, IndexReport, PullOutcome, PullSource, PushReport, RemoteDocset};
use std::fmt::Write;

/// Prints the result of an `index` run
pub fn print_index_outcome(outcome: &IndexOutcome) {
    match outcome {
        IndexOutcome::CacheHit {
            metadata,
            installed,
        } => {
            println!("=== Cache Hit ===\n");
            print_metadata(metadata);
            println!("\n✓ Installed to: {}", installed.display());
        }
        IndexOutcome::RemoteServed {
            metadata,
            installed,
        } => {
            println!("=== Served From Shared Cache ===\n");
            print_metadata(metadata);
            println!("\n✓ Installed to: {}", installed.display());
        }
        IndexOutcome::Indexed {
            metadata,
            installed,
            report,
        } => {
            println!("=== Index Summary ===\n");
            print_report(report);
            println!("  Model: {}", metadata.model);
            println!("\n✓ Installed to: {}", installed.display());
        }
        IndexOutcome::Empty { report } => {
            println!("=== Index Summary ===\n");
            print_report(report);
            println!("\n✗ No documentation pages were saved");
        }
    }
}

fn print_report(report: &IndexReport) {
    println!("Docset:");
    println!("  Name: {}", report.doc_name);
    println!("  Id: {}", report.doc_id);
    println!(
        "  Path prefix: {}",
        report.path_prefix.as_deref().unwrap_or("(entire origin)")
    );
    println!();

    println!("Crawl:");
    println!("  Pages discovered: {}", report.pages_discovered);
    println!("  Fetch failures: {}", report.fetch_failures);
    if report.timed_out {
        println!("  Time budget exhausted: yes");
    }
    println!();

    println!("Conversion:");
    println!("  Docs written: {}", report.docs_written);
    println!("  Non-doc pages: {}", report.non_doc);
    println!("  Failed pages: {}", report.failed_pages);
    if let Some(prefix) = &report.suggested_prefix {
        println!("  Suggested prefix for next time: {}", prefix);
    }
    if report.uploaded {
        println!("  Uploaded to shared cache: yes");
    }
}

fn print_metadata(meta: &CacheMetadata) {
    println!("Docset:");
    println!("  Name: {}", meta.doc_name);
    println!("  Id: {}", meta.doc_id);
    println!("  Source: {}", meta.source_url);
    if let Some(prefix) = &meta.path_prefix {
        println!("  Path prefix: {}", prefix);
    }
    println!("  Created: {}", meta.created_at.to_rfc3339());
    println!("  Pages indexed: {}", meta.pages_indexed);
    println!("  Docs stored: {}", meta.docs_stored);
}

/// Prints the result of a `pull`
pub fn print_pull_outcome(outcome: &PullOutcome) {
    let source = match outcome.source {
        PullSource::Local => "local cache",
        PullSource::Remote => "shared cache",
    };
    println!("=== Pulled From {} ===\n", source);
    print_metadata(&outcome.metadata);
    println!(
        "\n✓ Installed {} files to: {}",
        outcome.files,
        outcome.installed.display()
    );
}

/// Prints the result of a `push`
pub fn print_push_report(report: &PushReport) {
    println!("=== Push Summary ===\n");
    println!("  Pushed: {}", report.pushed.len());
    for name in &report.pushed {
        println!("    - {}", name);
    }
    println!("  Skipped: {}", report.skipped);
    println!("  Failed: {}", report.failed);
}

/// Prints local docsets, or a hint when there are none
pub fn print_local_docsets(entries: &[CacheMetadata]) {
    if entries.is_empty() {
        println!("No cached docsets");
        return;
    }
    print!("{}", format_local_table(entries));
}

/// Prints remote docsets, or a hint when there are none
pub fn print_remote_docsets(docsets: &[RemoteDocset]) {
    if docsets.is_empty() {
        println!("No remote docsets found");
        return;
    }
    print!("{}", format_remote_table(docsets));
}

/// One line per local docset: id, name, docs, creation date, source
pub fn format_local_table(entries: &[CacheMetadata]) -> String {
    let rows: Vec<[String; 5]> = entries
        .iter()
        .map(|m| {
            [
                m.doc_id.clone(),
                m.doc_name.clone(),
                m.docs_stored.to_string(),
                m.created_at.format("%Y-%m-%d %H:%M").to_string(),
                m.source_url.clone(),
            ]
        })
        .collect();
    format_table(["ID", "NAME", "DOCS", "CREATED", "SOURCE"], &rows)
}

/// One line per remote docset: id, name, docs, creation date, source
pub fn format_remote_table(docsets: &[RemoteDocset]) -> String {
    let rows: Vec<[String; 5]> = docsets
        .iter()
        .map(|d| {
            [
                d.id.clone(),
                d.name.clone(),
                d.docs_stored.to_string(),
                d.created_at.format("%Y-%m-%d %H:%M").to_string(),
                d.source_url.clone(),
            ]
        })
        .collect();
    format_table(["ID", "NAME", "DOCS", "CREATED", "SOURCE"], &rows)
}

fn format_table(header: [&str; 5], rows: &[[String; 5]]) -> String {
    let mut widths = header.map(str::len);
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header: Vec<String> = header.iter().map(|h| h.to_string()).collect();
    write_row(&mut out, &widths, &header);
    for row in rows {
        write_row(&mut out, &widths, row);
    }
    out
}

fn write_row(out: &mut String, widths: &[usize; 5], cells: &[String]) {
    let mut line = String::new();
    for (i, (cell, width)) in cells.iter().zip(widths).enumerate() {
        if i + 1 == cells.len() {
            line.push_str(cell);
        } else {
            let _ = write!(line, "{:<width$}  ", cell, width = *width);
        }
    }
    let _ = writeln!(out, "{}", line.trim_end());
}
