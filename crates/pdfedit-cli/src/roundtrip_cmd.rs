use std::path::Path;

use pdfedit::Editor;
use tracing::info;

use crate::shared::{print_report, read_input, write_output};

pub fn run(file: &Path, output: &Path) -> Result<(), i32> {
    let bytes = read_input(file)?;
    let editor = Editor::new();

    let extraction = editor.extract(&bytes).map_err(|e| {
        eprintln!("Error: failed to extract {}: {e}", file.display());
        1
    })?;
    print_report("extraction", &extraction.report);

    let elements = extraction.document.element_count();
    let reconstruction = editor.reconstruct(extraction.document.into()).map_err(|e| {
        eprintln!("Error: failed to reconstruct: {e}");
        1
    })?;
    print_report("reconstruction", &reconstruction.report);
    info!(
        elements,
        bytes_in = bytes.len(),
        bytes_out = reconstruction.bytes.len(),
        "round trip finished"
    );
    write_output(output, &reconstruction.bytes)
}
