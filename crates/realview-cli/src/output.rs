//! Result files: one pretty JSON document, or one JSON line per property.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use realview_core::PropertyResult;

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    Ok(())
}

pub fn write_json(path: &Path, result: &PropertyResult) -> anyhow::Result<()> {
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(result)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}

/// Appends results as JSON lines to a freshly created file.
pub struct JsonLinesWriter {
    out: BufWriter<File>,
}

impl JsonLinesWriter {
    pub fn create(path: &Path) -> anyhow::Result<Self> {
        ensure_parent(path)?;
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        Ok(Self {
            out: BufWriter::new(file),
        })
    }

    /// Lines are flushed as they are written so finished properties survive
    /// a later failure.
    pub fn write(&mut self, result: &PropertyResult) -> anyhow::Result<()> {
        serde_json::to_writer(&mut self.out, result)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}
