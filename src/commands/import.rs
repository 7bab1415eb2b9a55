use crate::json;
use crate::pdf::{save_outline, save_outline_as};
use anyhow::Result;
use std::path::Path;

pub fn run<P: AsRef<Path>, Q: AsRef<Path>, R: AsRef<Path>>(
    path: P,
    json_path: Q,
    output: Option<R>,
) -> Result<()> {
    let outline = json::import_file(&json_path)?;

    let (summary, written) = match &output {
        Some(output) => (
            save_outline_as(&path, output, &outline)?,
            output.as_ref(),
        ),
        None => (save_outline(&path, &outline)?, path.as_ref()),
    };

    println!(
        "Wrote {} entries to {}",
        summary.entries,
        written.display()
    );
    if summary.without_destination > 0 {
        println!(
            "{} entr{} without a page in this document were saved without a destination.",
            summary.without_destination,
            if summary.without_destination == 1 { "y" } else { "ies" }
        );
    }

    Ok(())
}
