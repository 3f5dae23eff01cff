use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::time::{Duration, Instant};

use crate::ui::{theme, Icons};

/// Progress over import batches; hidden when stdout is not a terminal
pub struct BatchBar {
    pb: ProgressBar,
    started: Instant,
}

impl BatchBar {
    pub fn new(message: &str) -> Self {
        let pb = if console::Term::stdout().is_term() {
            let pb = ProgressBar::new(0);
            if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} [{bar:30}] {pos}/{len} batches ({eta})") {
                pb.set_style(style.progress_chars("=> "));
            }
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        } else {
            ProgressBar::hidden()
        };
        pb.set_message(message.to_string());
        Self {
            pb,
            started: Instant::now(),
        }
    }

    pub fn update(&self, done: usize, total: usize) {
        self.pb.set_length(total as u64);
        self.pb.set_position(done as u64);
    }

    pub fn finish(&self, batches: usize) {
        self.pb.finish_and_clear();
        println!(
            "{} {}",
            Icons::CHECK.style(theme().repaired.clone()),
            format!(
                "Submitted {} batches in {}",
                batches,
                HumanDuration(self.started.elapsed())
            )
            .style(theme().repaired.clone())
        );
    }

    pub fn abandon(&self) {
        self.pb.abandon();
    }
}
