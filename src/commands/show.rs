use crate::pdf::PdfDocument;
use crate::target::Target;
use anyhow::Result;
use std::path::Path;

pub fn run<P: AsRef<Path>>(path: P) -> Result<()> {
    let doc = PdfDocument::open(&path)?;
    let outline = doc.outline()?;

    if outline.is_empty() {
        println!("No table of contents found.");
        return Ok(());
    }

    for entry in outline.entries() {
        let indent = "  ".repeat(entry.level as usize - 1);
        let page_str = match entry.target {
            Target::Unresolved => String::new(),
            target => format!(" (p. {})", target),
        };
        println!("{}{}{}", indent, entry.title, page_str);
    }

    println!(
        "\n{} entr{} across {} page(s).",
        outline.len(),
        if outline.len() == 1 { "y" } else { "ies" },
        doc.page_count()
    );

    Ok(())
}
