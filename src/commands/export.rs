use crate::config::Config;
use crate::json;
use crate::pdf::PdfDocument;
use anyhow::Result;
use std::path::Path;

pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(
    path: P,
    output: Option<Q>,
    config: &Config,
) -> Result<()> {
    let outline = PdfDocument::open(&path)?.outline()?;

    match output {
        Some(output) => {
            json::export_file(&output, &outline, config.json.pretty)?;
            eprintln!(
                "Exported {} entries to {}",
                outline.len(),
                output.as_ref().display()
            );
        }
        None => println!("{}", json::export(&outline, config.json.pretty)?),
    }

    Ok(())
}
