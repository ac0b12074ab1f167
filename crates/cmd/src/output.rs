//! Report sinks for the command line: text tables, JSON lines, CSV

use std::io::Write;

use arrow::util::pretty::pretty_format_batches;
use arrow_csv::WriterBuilder;
use pipeline::{ReportSink, Row, rows_to_batch};
use serde::Serialize;

use crate::common::OutputFormat;

pub struct TableSink<W: Write> {
    out: W,
}

impl<W: Write> ReportSink for TableSink<W> {
    fn draw(&mut self, name: &str, rows: &[Row]) -> pipeline::Result<()> {
        writeln!(self.out, "{name}")?;
        if rows.is_empty() {
            writeln!(self.out, "No results found.")?;
        } else {
            let batch = rows_to_batch(rows)?;
            let formatted = pretty_format_batches(&[batch])?;
            writeln!(self.out, "{formatted}")?;
        }
        writeln!(self.out)?;
        Ok(())
    }
}

pub struct JsonSink<W: Write> {
    out: W,
}

#[derive(Serialize)]
struct Section<'a> {
    name: &'a str,
    rows: &'a [Row],
}

impl<W: Write> ReportSink for JsonSink<W> {
    fn draw(&mut self, name: &str, rows: &[Row]) -> pipeline::Result<()> {
        serde_json::to_writer(&mut self.out, &Section { name, rows })?;
        writeln!(self.out)?;
        Ok(())
    }
}

pub struct CsvSink<W: Write> {
    out: W,
    sections: usize,
}

impl<W: Write> ReportSink for CsvSink<W> {
    fn draw(&mut self, name: &str, rows: &[Row]) -> pipeline::Result<()> {
        if self.sections > 0 {
            writeln!(self.out)?;
        }
        self.sections += 1;
        writeln!(self.out, "# {name}")?;
        if rows.is_empty() {
            return Ok(());
        }
        let batch = rows_to_batch(rows)?;
        let mut writer = WriterBuilder::new().with_header(true).build(&mut self.out);
        writer.write(&batch)?;
        Ok(())
    }
}

/// Sink writing `format` to `out`
pub fn sink_for<'a, W: Write + 'a>(format: OutputFormat, out: W) -> Box<dyn ReportSink + 'a> {
    match format {
        OutputFormat::Table => Box::new(TableSink { out }),
        OutputFormat::Json => Box::new(JsonSink { out }),
        OutputFormat::Csv => Box::new(CsvSink { out, sections: 0 }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<Row> {
        vec![
            Row::new().with("payment_type", 1_i64).with("count", 3_u64).with("avg_tip", 2.5),
            Row::new()
                .with("payment_type", Option::<i64>::None)
                .with("count", 1_u64)
                .with("avg_tip", 0.5),
        ]
    }

    fn render(format: OutputFormat) -> anyhow::Result<String> {
        let mut buf = Vec::new();
        {
            let mut sink = sink_for(format, &mut buf);
            sink.draw("payment_type", &rows())?;
            sink.draw("continent", &[])?;
        }
        Ok(String::from_utf8(buf)?)
    }

    #[test]
    fn test_table_output() -> anyhow::Result<()> {
        let text = render(OutputFormat::Table)?;
        assert!(text.starts_with("payment_type\n+"));
        assert!(text.contains("| payment_type | count | avg_tip |"));
        assert!(text.contains("continent\nNo results found."));
        Ok(())
    }

    #[test]
    fn test_json_lines() -> anyhow::Result<()> {
        let text = render(OutputFormat::Json)?;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                r#"{"name":"payment_type","rows":[{"payment_type":1,"count":3,"avg_tip":2.5},{"payment_type":null,"count":1,"avg_tip":0.5}]}"#,
                r#"{"name":"continent","rows":[]}"#,
            ]
        );
        Ok(())
    }

    #[test]
    fn test_csv_sections() -> anyhow::Result<()> {
        let text = render(OutputFormat::Csv)?;
        assert_eq!(
            text,
            "# payment_type\npayment_type,count,avg_tip\n1,3,2.5\n,1,0.5\n\n# continent\n"
        );
        Ok(())
    }
}
