use std::collections::HashMap;
use std::time::Instant;

/// Cross-cutting logger for reel job events.
///
/// Keeps the use case free of any particular output mechanism so the CLI,
/// tests and future front ends can observe a job without changing it.
pub trait PipelineLogger {
    /// Report caption rendering progress.
    fn progress(&mut self, current: usize, total: usize);

    /// Record how long a named job stage took.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. segment count, caption font size).
    fn metric(&mut self, name: &str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-job summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// CLI logger: forwards messages to `log`, keeps per-stage timings and
/// metrics, and prints a summary when the job ends.
pub struct StdoutPipelineLogger {
    timings: HashMap<String, Vec<f64>>,
    metrics: HashMap<String, Vec<f64>>,
    start_time: Instant,
    total_captions: usize,
    messages: Vec<String>,
}

impl StdoutPipelineLogger {
    pub fn new() -> Self {
        Self {
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            total_captions: 0,
            messages: Vec::new(),
        }
    }

    /// Returns the formatted summary string, or `None` if no data recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut lines = vec![format!(
            "Reel summary ({} captions, {:.1}s total):",
            self.total_captions,
            elapsed_ms / 1000.0
        )];

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let total_ms: f64 = self.timings[stage].iter().sum();
            let pct = if elapsed_ms > 0.0 {
                total_ms / elapsed_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!("  {stage:10}: {total_ms:8.0}ms  ({pct:4.1}%)"));
        }

        let mut metric_names: Vec<_> = self.metrics.keys().collect();
        metric_names.sort();
        for name in metric_names {
            let values = &self.metrics[name];
            let avg = values.iter().sum::<f64>() / values.len().max(1) as f64;
            lines.push(format!("  {name}: avg {avg:.1}"));
        }

        if let Some(seconds) = self.metrics_for("output_seconds").and_then(|v| v.last()) {
            if elapsed_ms > 0.0 {
                let factor = seconds / (elapsed_ms / 1000.0);
                lines.push(format!("  Speed: {factor:.2}x realtime"));
            }
        }

        Some(lines.join("\n"))
    }

    /// Returns the timing data for a given stage.
    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    /// Returns the metric data for a given name.
    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.total_captions = total;
        if total > 0 {
            log::info!("Rendering captions: {current}/{total}");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    fn info(&mut self, message: &str) {
        self.messages.push(message.to_string());
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_logger_all_methods_are_noop() {
        let mut logger = NullPipelineLogger;
        logger.progress(1, 10);
        logger.timing("transcribe", 5.0);
        logger.metric("segments", 3.0);
        logger.info("hello");
        logger.summary();
    }

    #[test]
    fn test_timing_records_values() {
        let mut logger = StdoutPipelineLogger::new();
        logger.timing("render", 20.0);
        logger.timing("render", 30.0);
        logger.timing("compose", 5.0);

        assert_eq!(logger.timings_for("render").unwrap(), &[20.0, 30.0]);
        assert_eq!(logger.timings_for("compose").unwrap(), &[5.0]);
        assert!(logger.timings_for("align").is_none());
    }

    #[test]
    fn test_summary_lists_stages_and_metrics() {
        let mut logger = StdoutPipelineLogger::new();
        logger.progress(3, 3);
        logger.timing("transcribe", 900.0);
        logger.timing("render", 120.0);
        logger.metric("caption_font_size", 120.0);
        logger.metric("caption_font_size", 90.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("Reel summary (3 captions"));
        assert!(summary.contains("transcribe"));
        assert!(summary.contains("render"));
        assert!(summary.contains("caption_font_size: avg 105.0"));
    }

    #[test]
    fn test_summary_reports_speed_when_output_length_known() {
        let mut logger = StdoutPipelineLogger::new();
        logger.metric("output_seconds", 12.0);
        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("realtime"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        assert!(StdoutPipelineLogger::default().summary_string().is_none());
    }

    #[test]
    fn test_progress_tracks_caption_total() {
        let mut logger = StdoutPipelineLogger::new();
        for i in 1..=7 {
            logger.progress(i, 7);
        }
        assert_eq!(logger.total_captions, 7);
    }

    #[test]
    fn test_info_stores_messages() {
        let mut logger = StdoutPipelineLogger::new();
        logger.info("Caption font: DejaVuSans-Bold.ttf");
        assert_eq!(logger.messages, vec!["Caption font: DejaVuSans-Bold.ttf"]);
    }
}
