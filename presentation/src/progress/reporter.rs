//! Progress reporting while a query is dispatched

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use parley_application::ports::progress::{Phase, ProgressNotifier};
use parley_domain::{BenchmarkResult, ExecutionPolicy, Model, TerminationReason, Turn};
use std::sync::Mutex;

/// Reports progress with indicatif bars, one per phase
pub struct ProgressReporter {
    multi: MultiProgress,
    phase_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            phase_bar: Mutex::new(None),
        }
    }

    fn phase_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn phase_display_name(phase: Phase) -> &'static str {
        match phase {
            Phase::Retrieval => "Retrieving context",
            Phase::Answer => "Answering",
            Phase::Draft => "Stage 1: Draft",
            Phase::Refine => "Stage 2: Refine",
            Phase::Dialogue => "Dialogue",
            Phase::Synthesis => "Synthesis",
            Phase::Moderator => "Moderator",
            Phase::Benchmark => "Benchmark",
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.phase_bar.lock()
            && let Some(pb) = guard.as_ref()
        {
            f(pb);
        }
    }

    fn mark(success: bool) -> colored::ColoredString {
        if success { "v".green() } else { "x".red() }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressNotifier for ProgressReporter {
    fn on_phase_start(&self, phase: Phase, total_tasks: usize) {
        let pb = self.multi.add(ProgressBar::new(total_tasks as u64));
        pb.set_style(Self::phase_style());
        pb.set_prefix(Self::phase_display_name(phase).to_string());
        pb.set_message("Starting...");

        if let Ok(mut guard) = self.phase_bar.lock() {
            *guard = Some(pb);
        }
    }

    fn on_task_complete(&self, phase: Phase, model: &Model, success: bool) {
        // Dialogue turns are reported through on_turn
        if phase == Phase::Dialogue {
            return;
        }
        self.with_bar(|pb| {
            pb.set_message(format!("{} {}", Self::mark(success), model));
            pb.inc(1);
        });
    }

    fn on_phase_complete(&self, phase: Phase) {
        let taken = self.phase_bar.lock().ok().and_then(|mut guard| guard.take());
        if let Some(pb) = taken {
            pb.finish_with_message(format!("{} done", phase.as_str().green()));
        }
    }

    fn on_turn(&self, turn: &Turn, max_turns: usize) {
        self.with_bar(|pb| {
            pb.set_message(format!(
                "{} turn {}/{} {} ({})",
                Self::mark(turn.success),
                turn.sequence,
                max_turns,
                turn.speaker,
                turn.role.as_str()
            ));
            pb.inc(1);
        });
    }

    fn on_dialogue_terminated(&self, reason: TerminationReason) {
        let _ = self
            .multi
            .println(format!("{} {}", "Dialogue ended:".cyan(), reason.as_str()));
    }

    fn on_benchmark_start(&self, candidates: usize, policy: ExecutionPolicy) {
        let _ = self.multi.println(format!(
            "{} {} candidates ({})",
            "Benchmark:".cyan(),
            candidates,
            policy
        ));
    }

    fn on_candidate_complete(&self, result: &BenchmarkResult) {
        let _ = self.multi.println(format!(
            "  {} {} {}ms",
            Self::mark(result.success),
            result.model,
            result.latency_ms
        ));
    }
}

/// Line-based progress on stderr, for non-interactive terminals
pub struct SimpleProgress;

impl ProgressNotifier for SimpleProgress {
    fn on_phase_start(&self, phase: Phase, total_tasks: usize) {
        eprintln!(
            "{} {} ({} tasks)",
            "->".cyan(),
            ProgressReporter::phase_display_name(phase).bold(),
            total_tasks
        );
    }

    fn on_task_complete(&self, phase: Phase, model: &Model, success: bool) {
        if phase != Phase::Dialogue {
            eprintln!("  {} {}", ProgressReporter::mark(success), model);
        }
    }

    fn on_phase_complete(&self, _phase: Phase) {}

    fn on_turn(&self, turn: &Turn, max_turns: usize) {
        eprintln!(
            "  {} turn {}/{} {}",
            ProgressReporter::mark(turn.success),
            turn.sequence,
            max_turns,
            turn.speaker
        );
    }

    fn on_dialogue_terminated(&self, reason: TerminationReason) {
        eprintln!("  dialogue ended: {}", reason.as_str());
    }
}
