//! Weekly activity and wellbeing summary.
//!
//! Aggregates the last week of interaction records into per-mode counts and
//! average wellbeing metrics, then renders them with bar gauges and a
//! rule-based assessment. Aggregation is a pure function over records so the
//! numbers are testable without a terminal.

use crate::store::LogRecord;
use colored::Colorize;
use std::io::Write;

/// Width of a rendered metric gauge, in segments.
const GAUGE_WIDTH: usize = 20;

/// Aggregated view of a record window.
#[derive(Debug, Clone, Default)]
pub struct WeeklySummary {
    /// Total records in the window.
    pub total: usize,
    /// Mode name and count, most active first.
    pub mode_counts: Vec<(String, usize)>,
    /// Average focus over records that carry it.
    pub avg_focus: Option<f64>,
    /// Average clarity over records that carry it.
    pub avg_clarity: Option<f64>,
    /// Average stress over records that carry it.
    pub avg_stress: Option<f64>,
}

/// Aggregate a window of records.
#[must_use]
pub fn summarize(records: &[LogRecord]) -> WeeklySummary {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for record in records {
        match counts.iter_mut().find(|(mode, _)| *mode == record.mode) {
            Some((_, n)) => *n += 1,
            None => counts.push((record.mode.clone(), 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let average = |pick: fn(&LogRecord) -> Option<u8>| -> Option<f64> {
        let values: Vec<f64> = records.iter().filter_map(pick).map(f64::from).collect();
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    };

    WeeklySummary {
        total: records.len(),
        mode_counts: counts,
        avg_focus: average(|r| r.focus),
        avg_clarity: average(|r| r.clarity),
        avg_stress: average(|r| r.stress),
    }
}

/// Render a 0-10 value as a filled bar.
#[must_use]
pub fn gauge(value: f64) -> String {
    let filled = ((value / 10.0) * GAUGE_WIDTH as f64).round() as usize;
    let filled = filled.min(GAUGE_WIDTH);
    format!("{}{}", "█".repeat(filled), "░".repeat(GAUGE_WIDTH - filled))
}

/// Verbal assessment of a focus/clarity score (higher is better).
#[must_use]
pub fn assessment(value: f64) -> &'static str {
    if value >= 8.0 {
        "Excellent"
    } else if value >= 6.0 {
        "Good"
    } else if value >= 4.0 {
        "Fair"
    } else {
        "Needs improvement"
    }
}

/// Verbal assessment of a stress score (lower is better).
#[must_use]
pub fn stress_assessment(value: f64) -> &'static str {
    if value < 4.0 {
        "Excellent - low stress"
    } else if value < 6.0 {
        "Good - manageable stress"
    } else {
        "Caution - high stress"
    }
}

/// Rule-based closing recommendation.
#[must_use]
pub fn recommendation(summary: &WeeklySummary) -> String {
    match (summary.avg_stress, summary.avg_focus) {
        (Some(stress), _) if stress > 7.0 => {
            "Focus on stress reduction this week. Consider mindfulness or breaks.".to_string()
        }
        (_, Some(focus)) if focus < 5.0 => {
            "Boost focus by eliminating distractions and time-blocking.".to_string()
        }
        _ => "Maintain the current routine - push toward your goals.".to_string(),
    }
}

/// Render the weekly report.
pub fn render<W: Write>(records: &[LogRecord], out: &mut W) -> std::io::Result<()> {
    if records.is_empty() {
        writeln!(out, "No logs from the past week.")?;
        return Ok(());
    }

    let summary = summarize(records);

    writeln!(out, "\n{}", " WEEKLY SUMMARY".bold().cyan())?;
    writeln!(out, "{}", "=".repeat(40).cyan())?;
    writeln!(out, "Total interactions: {}", summary.total)?;

    writeln!(out, "\n{}", "Cognitive health".bold())?;
    let mut any_metric = false;
    if let Some(focus) = summary.avg_focus {
        writeln!(out, "Focus   {focus:>4.1}/10 {} {}", gauge(focus), assessment(focus))?;
        any_metric = true;
    }
    if let Some(clarity) = summary.avg_clarity {
        writeln!(
            out,
            "Clarity {clarity:>4.1}/10 {} {}",
            gauge(clarity),
            assessment(clarity)
        )?;
        any_metric = true;
    }
    if let Some(stress) = summary.avg_stress {
        writeln!(
            out,
            "Stress  {stress:>4.1}/10 {} {}",
            gauge(stress),
            stress_assessment(stress)
        )?;
        any_metric = true;
    }
    if !any_metric {
        writeln!(out, "No journal entries this week - no metrics to report.")?;
    }

    writeln!(out, "\n{}", "Activity breakdown".bold())?;
    for (mode, count) in &summary.mode_counts {
        let percent = (*count as f64 / summary.total as f64) * 100.0;
        writeln!(out, "- {mode}: {count} ({percent:.0}%)")?;
    }

    writeln!(out, "\n{}", "Recent activity".bold())?;
    for record in records.iter().rev().take(5) {
        let when = record.timestamp.format("%m/%d %H:%M");
        let preview: String = record.prompt.chars().take(40).collect();
        let ellipsis = if record.prompt.chars().count() > 40 {
            "..."
        } else {
            ""
        };
        writeln!(out, "{when}  {:<12} {preview}{ellipsis}", record.mode)?;
    }

    writeln!(out, "\n{}", "Recommendation".bold())?;
    writeln!(out, "{}", recommendation(&summary))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(mode: &str) -> LogRecord {
        LogRecord::new(mode, format!("{mode} prompt"), "response")
    }

    #[test]
    fn test_summarize_counts_and_sorts_modes() {
        let records = vec![
            record("plan"),
            record("journal"),
            record("plan"),
            record("plan"),
            record("code"),
        ];
        let summary = summarize(&records);
        assert_eq!(summary.total, 5);
        assert_eq!(summary.mode_counts[0], ("plan".to_string(), 3));
        // Ties sort by name
        assert_eq!(summary.mode_counts[1], ("code".to_string(), 1));
        assert_eq!(summary.mode_counts[2], ("journal".to_string(), 1));
    }

    #[test]
    fn test_summarize_averages_only_present_metrics() {
        let records = vec![
            record("journal").with_metrics(Some(8), Some(6), Some(2)),
            record("journal").with_metrics(Some(4), None, Some(4)),
            record("plan"),
        ];
        let summary = summarize(&records);
        assert_eq!(summary.avg_focus, Some(6.0));
        assert_eq!(summary.avg_clarity, Some(6.0));
        assert_eq!(summary.avg_stress, Some(3.0));
    }

    #[test]
    fn test_summarize_no_metrics() {
        let summary = summarize(&[record("plan")]);
        assert_eq!(summary.avg_focus, None);
        assert_eq!(summary.avg_stress, None);
    }

    #[test]
    fn test_gauge_bounds() {
        assert_eq!(gauge(0.0), "░".repeat(20));
        assert_eq!(gauge(10.0), "█".repeat(20));
        assert_eq!(gauge(5.0).chars().filter(|c| *c == '█').count(), 10);
        // Out-of-range values saturate instead of panicking
        assert_eq!(gauge(15.0), "█".repeat(20));
    }

    #[test]
    fn test_assessment_boundaries() {
        assert_eq!(assessment(8.0), "Excellent");
        assert_eq!(assessment(6.0), "Good");
        assert_eq!(assessment(4.0), "Fair");
        assert_eq!(assessment(3.9), "Needs improvement");

        assert_eq!(stress_assessment(3.9), "Excellent - low stress");
        assert_eq!(stress_assessment(5.0), "Good - manageable stress");
        assert_eq!(stress_assessment(7.0), "Caution - high stress");
    }

    #[test]
    fn test_recommendation_prefers_stress_warning() {
        let summary = WeeklySummary {
            avg_stress: Some(8.0),
            avg_focus: Some(3.0),
            ..Default::default()
        };
        assert!(recommendation(&summary).contains("stress"));

        let summary = WeeklySummary {
            avg_stress: Some(2.0),
            avg_focus: Some(3.0),
            ..Default::default()
        };
        assert!(recommendation(&summary).contains("focus"));
    }

    #[test]
    fn test_render_empty_window() {
        let mut out = Vec::new();
        render(&[], &mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("No logs"));
    }

    #[test]
    fn test_render_full_report() {
        let records = vec![
            record("plan"),
            record("journal").with_metrics(Some(7), Some(7), Some(3)),
        ];
        let mut out = Vec::new();
        render(&records, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Total interactions: 2"));
        assert!(text.contains("Focus"));
        assert!(text.contains("plan: 1"));
        assert!(text.contains("Recommendation"));
    }
}
