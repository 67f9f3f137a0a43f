use console::style;

/// Step counter for a single tier install. Display only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Progress {
    total_steps: u32,
    current_step: u32,
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the counter for a new tier.
    pub fn set_total_steps(&mut self, n: u32) {
        self.total_steps = n;
        self.current_step = 0;
    }

    /// Advance one step, print the labelled status line, and return the
    /// displayed percentage.
    pub fn progress(&mut self, label: &str) -> u32 {
        self.current_step += 1;
        let pct = self.percent();
        crate::status::line(format!(
            "{} {}",
            style(format!(
                "[{}/{}] {:>3}%",
                self.current_step, self.total_steps, pct
            ))
            .magenta()
            .bold(),
            label
        ));
        pct
    }

    pub fn percent(&self) -> u32 {
        percent(self.current_step, self.total_steps)
    }

    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    pub fn total_steps(&self) -> u32 {
        self.total_steps
    }
}

/// `current * 100 / total`, floored; 0 when `total` is 0.
pub fn percent(current: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (u64::from(current) * 100 / u64::from(total)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_is_floored() {
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 66);
        assert_eq!(percent(3, 3), 100);
        assert_eq!(percent(1, 7), 14);
    }

    #[test]
    fn zero_total_does_not_divide() {
        let mut p = Progress::new();
        assert_eq!(p.progress("orphan step"), 0);
        assert_eq!(percent(5, 0), 0);
    }

    #[test]
    fn n_calls_reach_exactly_100() {
        for n in 1..=12u32 {
            let mut p = Progress::new();
            p.set_total_steps(n);
            let mut last = 0;
            for k in 1..=n {
                last = p.progress("step");
                assert_eq!(last, k * 100 / n);
            }
            assert_eq!(last, 100);
        }
    }

    #[test]
    fn seven_steps_hit_100_once_on_the_last_call() {
        let mut p = Progress::new();
        p.set_total_steps(7);
        let shown: Vec<u32> = (0..7).map(|i| p.progress(&format!("step {i}"))).collect();
        assert_eq!(shown, vec![14, 28, 42, 57, 71, 85, 100]);
        assert_eq!(shown.iter().filter(|&&pct| pct == 100).count(), 1);
    }

    #[test]
    fn set_total_steps_resets_current() {
        let mut p = Progress::new();
        p.set_total_steps(2);
        p.progress("a");
        p.set_total_steps(4);
        assert_eq!(p.current_step(), 0);
        assert_eq!(p.progress("b"), 25);
    }
}
