//! Small diagnostic overlay plotting the clock-adjustment amount the server
//! has been sending us, toggled with `G`. A steady nonzero trend means our
//! clock is drifting relative to the server's and the stall hook is
//! correcting for it every network tick.

use macroquad::prelude::*;
use std::collections::VecDeque;

pub struct NetworkGraph {
    history: VecDeque<i8>,
    max_samples: usize,
    visible: bool,
}

impl NetworkGraph {
    pub fn new() -> Self {
        NetworkGraph {
            history: VecDeque::new(),
            max_samples: 120,
            visible: false,
        }
    }

    pub fn toggle_visibility(&mut self) {
        self.visible = !self.visible;
    }

    pub fn record(&mut self, adjustment_amount: i8) {
        self.history.push_back(adjustment_amount);
        while self.history.len() > self.max_samples {
            self.history.pop_front();
        }
    }

    pub fn render(&self) {
        if !self.visible || self.history.len() < 2 {
            return;
        }

        let width = 240.0;
        let height = 80.0;
        let x = screen_width() - width - 20.0;
        let y = 20.0;

        draw_rectangle(x, y, width, height, Color::from_rgba(0, 0, 0, 180));
        draw_rectangle_lines(x, y, width, height, 1.0, Color::from_rgba(120, 120, 120, 255));

        let mid = y + height / 2.0;
        draw_line(x, mid, x + width, mid, 1.0, Color::from_rgba(60, 60, 60, 255));

        let step = width / self.max_samples as f32;
        let scale = (height / 2.0) / (i8::MAX as f32);
        let samples: Vec<i8> = self.history.iter().copied().collect();
        for (i, pair) in samples.windows(2).enumerate() {
            let x0 = x + i as f32 * step;
            let x1 = x + (i + 1) as f32 * step;
            let y0 = mid - pair[0] as f32 * scale;
            let y1 = mid - pair[1] as f32 * scale;
            draw_line(x0, y0, x1, y1, 2.0, YELLOW);
        }

        draw_text("adjustment", x + 6.0, y + height - 6.0, 14.0, WHITE);
    }
}

impl Default for NetworkGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_caps_history_at_max_samples() {
        let mut graph = NetworkGraph::new();
        for i in 0..500 {
            graph.record((i % 10) as i8);
        }
        assert_eq!(graph.history.len(), graph.max_samples);
    }

    #[test]
    fn starts_hidden_and_toggles() {
        let mut graph = NetworkGraph::new();
        assert!(!graph.visible);
        graph.toggle_visibility();
        assert!(graph.visible);
    }
}
