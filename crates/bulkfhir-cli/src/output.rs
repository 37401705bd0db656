//! Terminal and file output.

use std::fs::File;
use std::path::Path;

use anyhow::Context;
use bulkfhir_reshape::ReshapeReport;
use colored::Colorize;

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn print_warning(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

/// Writes each table to `<out>/<Type>.csv`, or dumps everything to stdout
/// when no output directory is given. Per-type failures become warnings
/// either way.
pub fn write_report(report: &ReshapeReport, out: Option<&Path>) -> anyhow::Result<()> {
    for failure in &report.failures {
        print_warning(&format!(
            "{}: {}",
            failure.resource_type.bold(),
            failure.error
        ));
    }

    match out {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;

            for (resource_type, table) in &report.tables {
                let path = dir.join(format!("{resource_type}.csv"));
                let file = File::create(&path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                table
                    .write_csv(file)
                    .with_context(|| format!("Failed to write {}", path.display()))?;

                print_success(&format!(
                    "{} ({} rows, {} columns) -> {}",
                    resource_type.bold(),
                    table.len(),
                    table.columns().len(),
                    path.display()
                ));
            }
        }
        None => {
            for (resource_type, table) in &report.tables {
                println!("{} {}", "==".cyan(), resource_type.cyan().bold());
                print!("{}", table.to_csv_string()?);
                println!();
            }
        }
    }

    Ok(())
}
