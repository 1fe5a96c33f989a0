use std::f32::consts::TAU;

/// How the rotation accumulator behaves as it grows.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RotationWrap {
    /// Kept in `[0, 2π)`.
    Modulo,
    /// Grows without bound. Only trigonometric functions consume the angle,
    /// so this merely loses precision at very large magnitudes.
    Unbounded,
}

/// Per-scene rotation state, owned by the caller and threaded through the
/// renderer so independently animated scenes stay independent.
#[derive(Copy, Clone, Debug)]
pub struct AnimationState {
    rotation: f32,
    wrap: RotationWrap,
}

impl AnimationState {
    pub fn new(wrap: RotationWrap) -> Self {
        Self {
            rotation: 0.0,
            wrap,
        }
    }

    /// Current angle in radians.
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Advances by `dt` seconds at one radian per second.
    pub fn advance(&mut self, dt: f32) {
        self.rotation += dt;

        if self.wrap == RotationWrap::Modulo {
            self.rotation = self.rotation.rem_euclid(TAU);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modulo_stays_in_range() {
        let mut state = AnimationState::new(RotationWrap::Modulo);

        for dt in [0.016, 0.5, 3.0, 2.9, 0.016, 7.3, 0.0, 100.25] {
            state.advance(dt);
            assert!(state.rotation() >= 0.0 && state.rotation() < TAU);
        }
    }

    #[test]
    fn unbounded_is_the_running_sum() {
        let mut state = AnimationState::new(RotationWrap::Unbounded);
        let deltas = [0.016, 0.5, 3.0, 2.9, 0.016, 7.3];

        let mut sum = 0.0_f32;
        for dt in deltas {
            state.advance(dt);
            sum += dt;
            assert_eq!(state.rotation(), sum);
        }

        assert!(state.rotation() > TAU);
    }
}
