use std::{fs::File, io, path::PathBuf};

use crate::{portfolio::render::RenderTable, util::os::mk_writable_dir};

use super::model::{Error, OutputType, ReportWriter};

/// Writes each table to its own csv file in out_dir.
pub struct CsvWriter {
    out_dir: PathBuf,
}

impl CsvWriter {
    pub fn new(out_dir: &str) -> Result<CsvWriter, io::Error> {
        let dir_path = PathBuf::from(out_dir);
        mk_writable_dir(&dir_path)?;
        Ok(CsvWriter { out_dir: dir_path })
    }
}

impl ReportWriter for CsvWriter {
    fn print_render_table(
        &mut self,
        out_type: OutputType,
        name: &str,
        table_model: &RenderTable,
    ) -> Result<(), Error> {
        let file_path = self.out_dir.join(format!("{}.csv", out_type.slug(name)));
        let fp = File::create(&file_path)
            .map_err(|e| format!("Failed to create {}: {}", file_path.display(), e))?;

        let mut csv_w = csv::WriterBuilder::new().flexible(true).from_writer(fp);

        csv_w.write_record(&table_model.header).map_err(|e| e.to_string())?;
        for row in &table_model.rows {
            csv_w.write_record(row).map_err(|e| e.to_string())?;
        }
        if !table_model.footer.is_empty() {
            csv_w.write_record(&table_model.footer).map_err(|e| e.to_string())?;
        }

        let n_cols = table_model.header.len().max(1);
        for line in table_model.errors.iter().map(|e| format!("[!] {e}"))
            .chain(table_model.notes.iter().cloned())
        {
            let mut note_record = vec![String::new(); n_cols];
            note_record[0] = line;
            csv_w.write_record(note_record).map_err(|e| e.to_string())?;
        }

        csv_w.flush().map_err(|e| e.to_string())?;
        tracing::debug!("Wrote {}", file_path.display());
        Ok(())
    }
}
