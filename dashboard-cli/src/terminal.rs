use std::cell::Cell;

use dashboard_core::{DashboardView, Presenter, Theme};

/// Prints the dashboard to stdout and notifications to stderr.
#[derive(Debug)]
pub struct Terminal {
    theme: Cell<Theme>,
}

impl Terminal {
    pub fn new(theme: Theme) -> Self {
        Self { theme: Cell::new(theme) }
    }

    pub fn set_theme(&self, theme: Theme) {
        self.theme.set(theme);
    }

    fn rule(&self) -> &'static str {
        match self.theme.get() {
            Theme::Light => "────────────────────────────────────────",
            Theme::Dark => "════════════════════════════════════════",
        }
    }
}

impl Presenter for Terminal {
    fn set_loading(&self, loading: bool) {
        if loading {
            eprintln!("Loading...");
        }
    }

    fn render(&self, view: &DashboardView) {
        println!("{}", self.rule());
        println!("{view}");
        println!("{}", self.rule());
    }

    fn alert(&self, message: &str) {
        eprintln!("! {message}");
    }
}
