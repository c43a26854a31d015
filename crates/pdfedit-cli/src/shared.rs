use std::fs;
use std::path::Path;

use pdfedit::Report;

/// Read an input file with user-friendly error messages.
///
/// Returns `Err(1)` with a message printed to stderr if the file is missing
/// or unreadable.
pub fn read_input(file: &Path) -> Result<Vec<u8>, i32> {
    if !file.exists() {
        eprintln!("Error: file not found: {}", file.display());
        return Err(1);
    }
    fs::read(file).map_err(|e| {
        eprintln!("Error: failed to read {}: {e}", file.display());
        1
    })
}

/// Write output bytes, reporting failures on stderr.
pub fn write_output(file: &Path, bytes: &[u8]) -> Result<(), i32> {
    fs::write(file, bytes).map_err(|e| {
        eprintln!("Error: failed to write {}: {e}", file.display());
        1
    })
}

/// Print skipped items to stderr. A clean report prints nothing.
pub fn print_report(what: &str, report: &Report) {
    if report.is_clean() {
        return;
    }
    eprintln!("Warning: {what}: {report}");
}
