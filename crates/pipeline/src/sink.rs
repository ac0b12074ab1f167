use crate::analysis::AnalysisReport;
use crate::error::Result;
use crate::rows::Row;

/// Rendering collaborator: receives one named result set at a time
pub trait ReportSink {
    fn draw(&mut self, name: &str, rows: &[Row]) -> Result<()>;
}

/// Send every result in `report` to `sink`, in run order, keeping at most
/// `limit` rows of each
pub fn draw_report(report: &AnalysisReport, sink: &mut dyn ReportSink, limit: Option<usize>) -> Result<()> {
    for result in &report.results {
        let shown = limit.map_or(result.rows.len(), |n| n.min(result.rows.len()));
        sink.draw(result.dimension.name(), &result.rows[..shown])?;
    }
    Ok(())
}
