//! Where metrics snapshots go

use std::fmt;
use std::io::Write;

use becas_allocation::{PeriodMetrics, StrategyKind};
use becas_common::Result;

/// Point of the scenario a snapshot was taken at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Before any grant
    Baseline,
    /// After a single allocation with the given strategy
    OneShot(StrategyKind),
    /// Right after the period's allocation
    Allocated(usize),
    AfterExam(usize),
    AfterIncome(usize),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Baseline => f.write_str("baseline"),
            Stage::OneShot(kind) => write!(f, "one-shot {kind}"),
            Stage::Allocated(period) => write!(f, "period {period} allocated"),
            Stage::AfterExam(period) => write!(f, "period {period} after exam"),
            Stage::AfterIncome(period) => write!(f, "period {period} after income"),
        }
    }
}

/// Consumer of metrics snapshots
pub trait RecordSink {
    fn record(&mut self, stage: Stage, metrics: &PeriodMetrics) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// One comma-separated line per snapshot
pub struct CsvSink<W: Write> {
    writer: W,
    lines: usize,
}

impl<W: Write> CsvSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, lines: 0 }
    }

    /// Lines written so far
    pub fn lines(&self) -> usize {
        self.lines
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for CsvSink<W> {
    fn record(&mut self, _stage: Stage, metrics: &PeriodMetrics) -> Result<()> {
        writeln!(self.writer, "{}", metrics.to_csv_line())?;
        self.lines += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Keeps every snapshot in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<(Stage, PeriodMetrics)>,
}

impl RecordSink for MemorySink {
    fn record(&mut self, stage: Stage, metrics: &PeriodMetrics) -> Result<()> {
        self.records.push((stage, metrics.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(correlation: Option<f64>) -> PeriodMetrics {
        PeriodMetrics {
            coverage_sufficiency: (0.25, 0.75),
            coverage_floor: (0.1, 0.9),
            gini_total: 0.3,
            count_sufficient: 750,
            count_poor: 100,
            correlation,
            mean_total: 10_000.0,
            std_dev_total: 2_000.0,
        }
    }

    #[test]
    fn test_csv_lines() {
        let mut sink = CsvSink::new(Vec::new());
        sink.record(Stage::Baseline, &metrics(Some(0.5))).unwrap();
        sink.record(Stage::Allocated(0), &metrics(None)).unwrap();
        sink.flush().unwrap();
        assert_eq!(sink.lines(), 2);

        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "0.250000, 0.750000, 0.100000, 0.900000, 0.300000, 750, 100, 0.500000"
        );
        assert!(lines[1].ends_with(", NaN"));
    }

    #[test]
    fn test_stage_labels() {
        assert_eq!(Stage::OneShot(StrategyKind::Push).to_string(), "one-shot push");
        assert_eq!(Stage::AfterExam(3).to_string(), "period 3 after exam");
    }
}
