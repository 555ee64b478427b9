use std::fmt::Write;
use std::path::Path;

use launchpad_migrate::MigrationStatus;

/// Print a human readable migration summary.
pub fn print_status(status: &MigrationStatus, ledger_path: &Path) {
    print!("{}", render_status(status, ledger_path));
}

fn render_status(status: &MigrationStatus, ledger_path: &Path) -> String {
    let pending = status.pending().count();
    let applied = status.descriptors.len() - pending;
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "Environment: {}", status.environment);
    let _ = writeln!(out, "Ledger:      {}", ledger_path.display());
    let _ = writeln!(out);

    if status.descriptors.is_empty() {
        let _ = writeln!(out, "No migrations found.");
    } else {
        let width = status
            .descriptors
            .iter()
            .map(|d| d.id.len())
            .max()
            .unwrap_or(0);
        for d in &status.descriptors {
            let state = if d.applied { "applied" } else { "pending" };
            let _ = writeln!(out, "  {:<width$}  {:<12}  {state}", d.id, d.kind.as_str());
        }
    }

    if !status.orphaned.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Recorded but missing on disk:");
        for id in &status.orphaned {
            let _ = writeln!(out, "  {id}");
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{applied} applied, {pending} pending");
    out
}
