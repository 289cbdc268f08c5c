// AutoPPT: AI-Powered Presentation Generator
// Copyright (c) 2024 AutoPPT Core Team
//! Progress bar over the body slides of one deck

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Progress tracker for a generation run
#[derive(Debug)]
pub struct ProgressTracker {
    /// Multi-progress container for both bars
    multi: Arc<MultiProgress>,
    /// Overall slide progress - created on init()
    main_bar: RwLock<Option<ProgressBar>>,
    /// Slide currently being produced - created on init()
    current_slide: RwLock<Option<ProgressBar>>,
    /// Whether progress is enabled
    enabled: AtomicBool,
    /// Total body slides
    total_slides: AtomicU64,
    /// Slides finished (rendered or replaced by a placeholder)
    completed_slides: AtomicU64,
    /// Slides replaced by a placeholder
    failed_slides: AtomicU64,
}

impl ProgressTracker {
    /// Create a new progress tracker (bars are created when init() is called)
    pub fn new(enabled: bool) -> Self {
        Self {
            multi: Arc::new(MultiProgress::new()),
            main_bar: RwLock::new(None),
            current_slide: RwLock::new(None),
            enabled: AtomicBool::new(enabled),
            total_slides: AtomicU64::new(0),
            completed_slides: AtomicU64::new(0),
            failed_slides: AtomicU64::new(0),
        }
    }

    /// Create a disabled progress tracker
    pub fn disabled() -> Self {
        Self::new(false)
    }

    /// Check if progress is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Start tracking `total` body slides
    ///
    /// Counters are kept even when the tracker is disabled.
    pub fn init(&self, total: usize) {
        self.total_slides.store(total as u64, Ordering::Relaxed);
        self.completed_slides.store(0, Ordering::Relaxed);
        self.failed_slides.store(0, Ordering::Relaxed);

        if !self.is_enabled() {
            return;
        }

        let main_style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} slides {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");
        let status_style = ProgressStyle::default_bar()
            .template("  {prefix:.bold.dim} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());

        let main_bar = self.multi.add(ProgressBar::new(total as u64));
        main_bar.set_style(main_style);
        main_bar.enable_steady_tick(Duration::from_millis(100));
        *self.main_bar.write() = Some(main_bar);

        let status_bar = self.multi.add(ProgressBar::new(0));
        status_bar.set_style(status_style);
        status_bar.set_prefix("Slide");
        *self.current_slide.write() = Some(status_bar);
    }

    /// Show the slide being worked on
    pub fn set_slide(&self, section: &str, slide: &str) {
        if !self.is_enabled() {
            return;
        }
        if let Some(bar) = self.current_slide.read().as_ref() {
            bar.set_message(format!("{} > {}", section, slide));
        }
    }

    /// Show a waiting message (rate-limit pacing)
    pub fn set_status(&self, message: &str) {
        if !self.is_enabled() {
            return;
        }
        if let Some(bar) = self.current_slide.read().as_ref() {
            bar.set_message(message.to_string());
        }
    }

    /// Mark one slide finished
    pub fn slide_done(&self, rendered: bool) {
        self.completed_slides.fetch_add(1, Ordering::Relaxed);
        if !rendered {
            self.failed_slides.fetch_add(1, Ordering::Relaxed);
        }
        if !self.is_enabled() {
            return;
        }
        if let Some(bar) = self.main_bar.read().as_ref() {
            bar.inc(1);
            let failed = self.failed();
            if failed > 0 {
                bar.set_message(format!("({} placeholder)", failed));
            }
        }
    }

    /// Slides finished so far
    pub fn completed(&self) -> u64 {
        self.completed_slides.load(Ordering::Relaxed)
    }

    /// Slides replaced by a placeholder so far
    pub fn failed(&self) -> u64 {
        self.failed_slides.load(Ordering::Relaxed)
    }

    /// Total slides announced by init()
    pub fn total(&self) -> u64 {
        self.total_slides.load(Ordering::Relaxed)
    }

    /// Mark the run as complete
    pub fn finish(&self) {
        if !self.is_enabled() {
            return;
        }
        if let Some(bar) = self.main_bar.read().as_ref() {
            bar.finish_with_message(format!(
                "done ({} of {} slides generated)",
                self.completed() - self.failed(),
                self.total()
            ));
        }
        if let Some(bar) = self.current_slide.read().as_ref() {
            bar.finish_and_clear();
        }
    }

    /// Finish with an error
    pub fn finish_with_error(&self, msg: &str) {
        if !self.is_enabled() {
            return;
        }
        if let Some(bar) = self.main_bar.read().as_ref() {
            bar.abandon_with_message(format!("failed: {}", msg));
        }
        if let Some(bar) = self.current_slide.read().as_ref() {
            bar.finish_and_clear();
        }
    }

    /// Suspend progress for logging output
    pub fn suspend<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if self.is_enabled() {
            self.multi.suspend(f)
        } else {
            f()
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::disabled()
    }
}
