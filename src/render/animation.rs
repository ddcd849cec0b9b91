use glam::Vec4;

/// Ping-pongs the first two channels of a color between 0 and 1.
///
/// A channel keeps moving by its step until it leaves `[0, 1]`, then the step
/// flips sign. Values can overshoot the range by at most one step.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorAnimator {
    color: Vec4,
    steps: [f32; 2],
}

impl ColorAnimator {
    pub fn new(initial: [f32; 4], step: f32) -> Self {
        let step = step.abs();
        Self {
            color: Vec4::from_array(initial),
            steps: [step, step],
        }
    }

    pub fn color(&self) -> [f32; 4] {
        self.color.to_array()
    }

    /// Advances one frame.
    pub fn step(&mut self) {
        for (channel, step) in self.steps.iter_mut().enumerate() {
            let value = self.color[channel];
            if value > 1.0 {
                *step = -step.abs();
            } else if value < 0.0 {
                *step = step.abs();
            }
            self.color[channel] = value + *step;
        }
    }
}
