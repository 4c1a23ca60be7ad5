use indicatif::{ProgressBar, ProgressStyle};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Spinner on stderr for an operation of unknown length.
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// The spinner currently drawing, shared with anything that needs the
/// terminal while it runs.
#[derive(Clone, Default)]
pub struct ActiveSpinner {
    slot: Arc<Mutex<Option<ProgressBar>>>,
}

impl ActiveSpinner {
    pub fn start(&self, message: impl Into<String>) -> ProgressBar {
        let bar = spinner(message);
        *self.lock() = Some(bar.clone());
        bar
    }

    pub fn stop(&self) {
        if let Some(bar) = self.lock().take() {
            bar.finish_and_clear();
        }
    }

    /// Run `f` with the spinner hidden, if one is drawing.
    pub fn suspend<R>(&self, f: impl FnOnce() -> R) -> R {
        let current = self.lock().clone();
        match current {
            Some(bar) => bar.suspend(f),
            None => f(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<ProgressBar>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suspend_runs_with_and_without_spinner() {
        let active = ActiveSpinner::default();
        assert_eq!(active.suspend(|| 1), 1);

        let bar = active.start("Thinking...");
        bar.set_draw_target(indicatif::ProgressDrawTarget::hidden());
        assert!(active.lock().is_some());
        assert_eq!(active.suspend(|| 2), 2);

        active.stop();
        assert!(active.lock().is_none());
        assert!(bar.is_finished());
    }
}
