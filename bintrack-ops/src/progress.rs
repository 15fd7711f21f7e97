use indicatif::{ProgressBar, ProgressStyle};

///
/// One progress notification of a scheduler run. `InProgress` carries the
/// completion percentage, weighted by the summed length of the
/// chromosomes whose task has finished over the total genome length, so
/// a long chromosome moves the needle further than a short one.
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressEvent {
    Starting,
    InProgress(f64),
    Complete,
    Aborted,
}

/// Receives scheduler progress events. Registration and removal are safe
/// from any thread; callbacks run on the thread driving the scheduler.
pub trait ProgressListener: Send + Sync {
    fn progress(&self, event: ProgressEvent);
}

impl<F> ProgressListener for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn progress(&self, event: ProgressEvent) {
        self(event)
    }
}

///
/// Drives an `indicatif` progress bar from scheduler events, for callers
/// that want terminal feedback instead of wiring their own listener.
///
pub struct ProgressBarListener {
    bar: ProgressBar,
}

impl ProgressBarListener {
    pub fn new(message: &'static str) -> Self {
        let bar = ProgressBar::new(100).with_message(message);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{bar:40.cyan/blue}] {pos}%")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        ProgressBarListener { bar }
    }
}

impl ProgressListener for ProgressBarListener {
    fn progress(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Starting => self.bar.set_position(0),
            ProgressEvent::InProgress(percent) => self.bar.set_position(percent.round() as u64),
            ProgressEvent::Complete => self.bar.finish(),
            ProgressEvent::Aborted => self.bar.abandon(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_closure_listener() {
        let seen: Mutex<Vec<ProgressEvent>> = Mutex::new(Vec::new());
        let listener = |event| seen.lock().unwrap().push(event);
        listener.progress(ProgressEvent::Starting);
        listener.progress(ProgressEvent::InProgress(25.0));
        assert_eq!(
            *seen.lock().unwrap(),
            vec![ProgressEvent::Starting, ProgressEvent::InProgress(25.0)]
        );
    }
}
