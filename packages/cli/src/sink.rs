use std::{io, path::PathBuf};

use sinta::{CategoryBatch, RecordSink};

/// Writes each category batch to `<out_dir>/<file_stem>.csv`, replacing any previous file.
/// The header row is written even when the batch is empty.
pub struct CsvSink {
    out_dir: PathBuf,
    written: Vec<PathBuf>,
}

impl CsvSink {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            written: Vec::new(),
        }
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl RecordSink for CsvSink {
    fn accept(&mut self, batch: &CategoryBatch) -> io::Result<()> {
        std::fs::create_dir_all(&self.out_dir)?;
        let path = self
            .out_dir
            .join(format!("{}.csv", batch.category.file_stem()));
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(batch.category.fields())?;
        for record in &batch.records {
            writer.write_record(record.values())?;
        }
        writer.flush()?;
        tracing::info!(
            category = %batch.category,
            records = batch.records.len(),
            path = %path.display(),
            "Saved"
        );
        self.written.push(path);
        Ok(())
    }
}
