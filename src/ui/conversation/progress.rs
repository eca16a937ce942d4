//! Step counter and progress bar.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::{Gauge, Widget},
};

/// Phase names shown next to the step number, in wizard order.
pub const PHASES: [&str; 7] = [
    "Категория",
    "Детали",
    "Доказательства",
    "Ущерб",
    "Контакты",
    "Получатели",
    "Предпросмотр",
];

/// Step count at which the bar is full.
pub const FULL_AT: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepProgress {
    step: usize,
}

impl StepProgress {
    pub fn step(&self) -> usize {
        self.step
    }

    pub fn set(&mut self, step: usize) {
        self.step = step;
    }

    pub fn advance(&mut self) {
        self.step += 1;
    }

    pub fn step_back(&mut self) {
        self.step = self.step.saturating_sub(1);
    }

    pub fn reset(&mut self) {
        self.step = 0;
    }

    pub fn is_visible(&self) -> bool {
        self.step > 0
    }

    pub fn fraction(&self) -> f64 {
        (self.step as f64 / FULL_AT as f64).min(1.0)
    }

    /// Phase for the current step, clamped to the last one.
    pub fn phase(&self) -> &'static str {
        let index = self.step.saturating_sub(1).min(PHASES.len() - 1);
        PHASES[index]
    }

    pub fn label(&self) -> String {
        format!("Шаг {} · {}", self.step, self.phase())
    }
}

impl Widget for &StepProgress {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if !self.is_visible() {
            return;
        }
        Gauge::default()
            .gauge_style(Style::default().fg(Color::Cyan).bg(Color::Black))
            .ratio(self.fraction())
            .label(self.label())
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_at_zero() {
        let progress = StepProgress::default();
        assert!(!progress.is_visible());
        assert_eq!(progress.fraction(), 0.0);
    }

    #[test]
    fn test_fraction_is_capped() {
        let mut progress = StepProgress::default();
        progress.set(4);
        assert!((progress.fraction() - 0.4).abs() < f64::EPSILON);
        progress.set(15);
        assert_eq!(progress.fraction(), 1.0);
    }

    #[test]
    fn test_phase_clamps_to_last_label() {
        let mut progress = StepProgress::default();
        progress.set(1);
        assert_eq!(progress.phase(), "Категория");
        progress.set(7);
        assert_eq!(progress.phase(), "Предпросмотр");
        progress.set(12);
        assert_eq!(progress.phase(), "Предпросмотр");
        assert_eq!(progress.label(), "Шаг 12 · Предпросмотр");
    }

    #[test]
    fn test_step_back_floors_at_zero() {
        let mut progress = StepProgress::default();
        progress.step_back();
        assert_eq!(progress.step(), 0);
        progress.advance();
        progress.advance();
        progress.step_back();
        assert_eq!(progress.step(), 1);
        progress.reset();
        assert!(!progress.is_visible());
    }
}
