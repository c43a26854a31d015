use std::path::Path;

use pdfedit::{DocumentExtractor, ExtractOptions, LopdfEngine};

use crate::shared::{print_report, read_input, write_output};

pub fn run(
    file: &Path,
    output: Option<&Path>,
    pretty: bool,
    no_images: bool,
    max_pages: Option<usize>,
) -> Result<(), i32> {
    let bytes = read_input(file)?;
    let options = ExtractOptions {
        extract_images: !no_images,
        max_pages,
        ..ExtractOptions::default()
    };
    let extraction = DocumentExtractor::<LopdfEngine>::new(options)
        .extract(&bytes)
        .map_err(|e| {
            eprintln!("Error: failed to extract {}: {e}", file.display());
            1
        })?;
    print_report("extraction", &extraction.report);

    let json = if pretty {
        serde_json::to_string_pretty(&extraction.document)
    } else {
        serde_json::to_string(&extraction.document)
    }
    .map_err(|e| {
        eprintln!("Error: failed to encode JSON: {e}");
        1
    })?;

    match output {
        Some(path) => write_output(path, json.as_bytes()),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}
