//! Console output formatter for response envelopes

use colored::Colorize;
use parley_domain::{
    BenchmarkReport, DialogueState, ModeratorAnalysis, ModeratorOutcome, OutputFormat,
    ResponseEnvelope, ResponseMetadata, SideNotes, StageResponse,
};

/// Formats response envelopes for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Render in the requested format
    pub fn render(envelope: &ResponseEnvelope, format: OutputFormat) -> String {
        match format {
            OutputFormat::Full => Self::format(envelope),
            OutputFormat::Answer => Self::format_answer_only(envelope),
            OutputFormat::Json => Self::format_json(envelope),
        }
    }

    /// Format the answer with all per-mode metadata
    pub fn format(envelope: &ResponseEnvelope) -> String {
        let mut output = String::new();

        output.push_str(&Self::header(&format!("parley: {}", envelope.mode)));
        output.push('\n');

        if let Some(complexity) = &envelope.complexity {
            output.push_str(&format!(
                "{} {:.1} (length {:.1}, multi-part {:.1}, steps {:.1}, code {:.1}, keywords {:.2})\n",
                "Complexity:".cyan().bold(),
                complexity.total.value(),
                complexity.length,
                complexity.multi_part,
                complexity.enumerated_steps,
                complexity.code_blocks,
                complexity.domain_keywords
            ));
        }

        match &envelope.metadata {
            ResponseMetadata::Simple {
                stage,
                context_sources,
            } => {
                output.push_str(&Self::section_header("Answer"));
                output.push_str(&Self::stage_line(stage));
                output.push_str(&Self::context_sources(context_sources));
            }
            ResponseMetadata::TwoStage {
                stages,
                context_sources,
            } => {
                output.push_str(&Self::section_header("Stages"));
                for stage in stages {
                    output.push_str(&Self::stage_line(stage));
                }
                output.push_str(&Self::context_sources(context_sources));
            }
            ResponseMetadata::Dialogue {
                dialogue,
                moderator,
            } => {
                output.push_str(&Self::dialogue(dialogue));
                output.push_str(&Self::moderator(moderator));
            }
            ResponseMetadata::Benchmark {
                report,
                context_sources,
            } => {
                output.push_str(&Self::benchmark(report));
                output.push_str(&Self::context_sources(context_sources));
            }
        }

        output.push_str(&Self::section_header("Final Answer"));
        output.push_str(&format!("\n{}\n", envelope.answer));

        if !envelope.failures.is_empty() {
            output.push_str(&Self::section_header("Absorbed Failures"));
            for failure in &envelope.failures {
                output.push_str(&format!("  {} {}\n", "x".red(), failure));
            }
        }

        output.push_str(&format!(
            "\n{}\n",
            format!(
                "elapsed {}ms, processing {}ms",
                envelope.elapsed_ms, envelope.processing_ms
            )
            .dimmed()
        ));
        output.push_str(&Self::footer());
        output
    }

    /// Format as JSON (camelCase envelope)
    pub fn format_json(envelope: &ResponseEnvelope) -> String {
        serde_json::to_string_pretty(envelope).unwrap_or_else(|_| "{}".to_string())
    }

    /// Primary answer only, with a one-line warning when degraded
    pub fn format_answer_only(envelope: &ResponseEnvelope) -> String {
        let mut output = envelope.answer.clone();
        if envelope.is_degraded() {
            output.push_str(&format!(
                "\n\n{}",
                format!(
                    "({} component failure(s); use -o full for details)",
                    envelope.failures.len()
                )
                .yellow()
            ));
        }
        output
    }

    // ==================== Sections ====================

    fn stage_line(stage: &StageResponse) -> String {
        let mut line = format!(
            "  {} {} ",
            format!("[{}]", stage.stage).yellow().bold(),
            stage.selection.model()
        );
        line.push_str(&format!("({}", stage.selection.tier()));
        if let Some(requested) = stage.selection.requested_tier() {
            line.push_str(&format!(", fallback from {}", requested));
        }
        line.push_str(&format!(
            ") {}ms, {} tokens",
            stage.latency_ms,
            stage.usage.total()
        ));
        if let Some(error) = &stage.error {
            line.push_str(&format!(" {}", format!("failed: {}", error).red()));
        }
        line.push('\n');
        line
    }

    fn context_sources(sources: &[String]) -> String {
        if sources.is_empty() {
            return String::new();
        }
        let mut output = format!("\n{}\n", "Context sources:".cyan().bold());
        for source in sources {
            output.push_str(&format!("  * {}\n", source));
        }
        output
    }

    fn dialogue(dialogue: &DialogueState) -> String {
        let mut output = Self::section_header(&format!("{} transcript", dialogue.kind()));
        output.push_str(&format!(
            "{} {}\n",
            "Participants:".cyan().bold(),
            dialogue
                .participants()
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ));

        for turn in dialogue.turns() {
            let title = format!(
                "── Turn {} (round {}) {} [{}] ──",
                turn.sequence,
                turn.round,
                turn.speaker,
                turn.role.as_str()
            );
            if turn.success {
                output.push_str(&format!("\n{}\n{}\n", title.yellow().bold(), turn.response));
            } else {
                output.push_str(&format!(
                    "\n{}\nError: {}\n",
                    title.red().bold(),
                    turn.error.as_deref().unwrap_or("Unknown")
                ));
            }
        }

        if let Some(reason) = dialogue.termination() {
            output.push_str(&format!("\n{} {}\n", "Terminated:".cyan().bold(), reason.as_str()));
        }
        if let Some(synthesis) = dialogue.synthesis() {
            output.push_str(&format!(
                "{} {}{}\n",
                "Synthesized by:".cyan().bold(),
                synthesis.model,
                if synthesis.success { "" } else { " (local fallback)" }
            ));
        }
        output
    }

    fn moderator(outcome: &ModeratorOutcome) -> String {
        match outcome {
            ModeratorOutcome::Skipped => String::new(),
            ModeratorOutcome::Unavailable { reason } => format!(
                "{}{}\n",
                Self::section_header("Moderator"),
                format!("Unavailable: {}", reason).yellow()
            ),
            ModeratorOutcome::Produced { analysis } => Self::analysis(analysis),
        }
    }

    fn analysis(analysis: &ModeratorAnalysis) -> String {
        let mut output = Self::section_header("Moderator Analysis");
        if let Some(selection) = &analysis.moderator {
            output.push_str(&format!("{} {}\n", "Moderator:".dimmed(), selection));
        }

        output.push_str(&Self::side_notes("Strengths", &analysis.strengths));
        output.push_str(&Self::side_notes("Weaknesses", &analysis.weaknesses));
        output.push_str(&Self::bullets("Fallacies", &analysis.fallacies));
        output.push_str(&Self::bullets("Rhetoric", &analysis.rhetorical_notes));
        output.push_str(&Self::bullets("Gaps", &analysis.gaps));
        output.push_str(&Self::bullets("Notes", &analysis.notes));

        match &analysis.verdict {
            Some(verdict) => output.push_str(&format!(
                "\n{} {} {}\n",
                "Verdict:".green().bold(),
                verdict.winner.as_str().to_uppercase(),
                verdict.rationale
            )),
            None => output.push_str(&format!("\n{}\n", "No verdict given".dimmed())),
        }

        let mut steps = format!("{} reasoning steps", analysis.reasoning_steps);
        if analysis.hit_iteration_cap {
            steps.push_str(" (stopped at iteration cap)");
        }
        output.push_str(&format!("{}\n", steps.dimmed()));
        output
    }

    fn side_notes(title: &str, notes: &SideNotes) -> String {
        if notes.is_empty() {
            return String::new();
        }
        let mut output = format!("\n{}\n", format!("{}:", title).cyan().bold());
        for (label, items) in [("pro", &notes.pro), ("con", &notes.con), ("", &notes.general)] {
            for item in items {
                if label.is_empty() {
                    output.push_str(&format!("  * {}\n", item));
                } else {
                    output.push_str(&format!("  * [{}] {}\n", label, item));
                }
            }
        }
        output
    }

    fn bullets(title: &str, items: &[String]) -> String {
        if items.is_empty() {
            return String::new();
        }
        let mut output = format!("\n{}\n", format!("{}:", title).cyan().bold());
        for item in items {
            output.push_str(&format!("  * {}\n", item));
        }
        output
    }

    fn benchmark(report: &BenchmarkReport) -> String {
        let summary = &report.summary;
        let mut output = Self::section_header("Benchmark");

        output.push_str(&format!(
            "{:<24} {:<9} {:>9} {:>8} {:>10}\n",
            "model", "tier", "latency", "tokens", "cost"
        ));
        for result in &report.results {
            let row = format!(
                "{:<24} {:<9} {:>7}ms {:>8} {:>10.4}",
                result.model.to_string(),
                result.tier.as_str(),
                result.latency_ms,
                result.usage.total(),
                result.estimated_cost
            );
            if result.success {
                output.push_str(&format!("{}\n", row));
            } else {
                output.push_str(&format!(
                    "{} {}\n",
                    row.red(),
                    result.error.as_deref().unwrap_or("failed")
                ));
            }
        }

        output.push_str(&format!(
            "\n{} {} succeeded, {} failed; avg {:.0}ms, median {:.0}ms; {} tokens, cost {:.4}\n",
            "Summary:".cyan().bold(),
            summary.succeeded,
            summary.failed,
            summary.average_latency_ms,
            summary.median_latency_ms,
            summary.total_usage.total(),
            summary.total_estimated_cost
        ));
        if summary.policy != summary.requested_policy {
            output.push_str(&format!(
                "{}\n",
                format!(
                    "Requested {} execution ran {} (shared resource)",
                    summary.requested_policy, summary.policy
                )
                .yellow()
            ));
        }
        if let Some(fastest) = &summary.fastest_model {
            output.push_str(&format!("{} {}\n", "Fastest:".green().bold(), fastest));
        }
        output
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("{}\n", "=".repeat(60).cyan())
    }
}
