use std::path::Path;

use pdfedit::{DocumentReconstructor, DocumentRecord, LopdfWriter, ReconstructOptions};

use crate::shared::{print_report, read_input, write_output};

pub fn run(record: &Path, output: &Path, no_compress: bool) -> Result<(), i32> {
    let bytes = read_input(record)?;
    let json = String::from_utf8(bytes).map_err(|_| {
        eprintln!("Error: {} is not UTF-8", record.display());
        1
    })?;
    let record = DocumentRecord::from_json(&json).map_err(|e| {
        eprintln!("Error: invalid record: {e}");
        1
    })?;

    let options = ReconstructOptions {
        compress: !no_compress,
        ..ReconstructOptions::default()
    };
    let reconstruction = DocumentReconstructor::<LopdfWriter>::new(options)
        .reconstruct(record)
        .map_err(|e| {
            eprintln!("Error: failed to reconstruct: {e}");
            1
        })?;
    print_report("reconstruction", &reconstruction.report);
    write_output(output, &reconstruction.bytes)
}
