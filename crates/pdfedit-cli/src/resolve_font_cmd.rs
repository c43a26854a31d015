use pdfedit::FontResolver;

/// Print the family and face a font name is drawn with.
pub fn run(name: &str, bold: bool, italic: bool) -> Result<(), i32> {
    println!("{}", describe(name, bold, italic));
    Ok(())
}

fn describe(name: &str, bold: bool, italic: bool) -> String {
    let resolved = FontResolver::new().resolve(name, 0.0, bold, italic);
    let family = match resolved.base {
        pdfedit::BaseFont::Sans => "sans",
        pdfedit::BaseFont::Serif => "serif",
        pdfedit::BaseFont::Monospace => "monospace",
        pdfedit::BaseFont::Symbol => "symbol",
        pdfedit::BaseFont::Dingbats => "dingbats",
    };
    format!("{name}\t{family}\t{}", resolved.face)
}
