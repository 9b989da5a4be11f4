use std::io::Write;

const BAR_LEN: usize = 40;
const CHECKPOINTS: usize = 50;

/// Carriage-return progress bar, redrawn at evenly spaced checkpoints.
pub struct ProgressBar<W: Write> {
    out: W,
    total: usize,
    step: usize,
}

impl<W: Write> ProgressBar<W> {
    pub fn new(total: usize, out: W) -> Self {
        ProgressBar {
            out,
            total,
            step: (total / CHECKPOINTS).max(1),
        }
    }

    /// Called after step `done` (1-based) completes.
    pub fn update(&mut self, done: usize) {
        if done % self.step != 0 && done != self.total {
            return;
        }
        let pct = done * 100 / self.total;
        let filled = BAR_LEN * pct / 100;
        let bar = "█".repeat(filled) + &"·".repeat(BAR_LEN - filled);
        // Display only; a broken terminal must not fail the run.
        let _ = write!(self.out, "\rProgress: [{bar}] {pct:3}%   ");
        let _ = self.out.flush();
    }

    pub fn finish(mut self) -> W {
        let _ = writeln!(self.out);
        self.out
    }
}
