use crate::config::Config;
use crate::pdf::PdfDocument;
use crate::ui::app::EditorApp;
use anyhow::Result;
use std::path::Path;

pub fn run<P: AsRef<Path>>(path: P, config: Config) -> Result<()> {
    let doc = PdfDocument::open(&path)?;
    let mut app = EditorApp::new(doc, config)?;
    app.run()
}
