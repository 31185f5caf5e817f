/// Largest value the timer reaches before wrapping back to zero.
pub const FRAME_TIMER_WRAP: u32 = 4096;

/// Per-frame animation counter.
///
/// Advanced once per frame by the compositor. Values stay within
/// `0..=FRAME_TIMER_WRAP`; the advance after `FRAME_TIMER_WRAP` yields 0, which
/// keeps `timer * speed` small enough for exact `f32` phase math.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct FrameTimer {
    value: u32,
}

impl FrameTimer {
    #[inline]
    pub const fn new() -> Self {
        Self { value: 0 }
    }

    #[inline]
    pub const fn starting_at(value: u32) -> Self {
        Self {
            value: if value > FRAME_TIMER_WRAP { 0 } else { value },
        }
    }

    #[inline]
    pub fn value(self) -> u32 {
        self.value
    }

    /// Advances by one frame and returns the new value.
    #[inline]
    pub fn advance(&mut self) -> u32 {
        self.value = if self.value >= FRAME_TIMER_WRAP {
            0
        } else {
            self.value + 1
        };
        self.value
    }

    /// Image index for looping animation at `speed` images per frame.
    ///
    /// `floor(timer * speed) mod image_count`, wrapping negative speeds.
    /// Returns 0 for an empty sequence.
    pub fn image_index(self, speed: f32, image_count: usize) -> usize {
        wrap_index((self.value as f32 * speed).floor(), image_count)
    }
}

/// Wraps a (possibly negative or fractional) image index into `0..count`.
///
/// The index is floored first, then reduced with Euclidean remainder, so `-1`
/// maps to `count - 1`. Returns 0 when `count` is 0.
pub fn wrap_index(index: f32, count: usize) -> usize {
    if count == 0 || !index.is_finite() {
        return 0;
    }
    (index.floor() as i64).rem_euclid(count as i64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_by_one() {
        let mut t = FrameTimer::new();
        assert_eq!(t.advance(), 1);
        assert_eq!(t.advance(), 2);
        assert_eq!(t.value(), 2);
    }

    #[test]
    fn wraps_after_ceiling_without_reaching_past_it() {
        let mut t = FrameTimer::starting_at(FRAME_TIMER_WRAP - 1);
        assert_eq!(t.advance(), FRAME_TIMER_WRAP);
        assert_eq!(t.advance(), 0);

        let mut t = FrameTimer::new();
        for _ in 0..3 * FRAME_TIMER_WRAP {
            assert!(t.advance() <= FRAME_TIMER_WRAP);
        }
    }

    #[test]
    fn out_of_range_start_resets() {
        assert_eq!(FrameTimer::starting_at(FRAME_TIMER_WRAP + 1).value(), 0);
    }

    #[test]
    fn speed_animation_sequence() {
        let mut t = FrameTimer::new();
        let seq: Vec<usize> = (0..6)
            .map(|_| {
                t.advance();
                t.image_index(0.2, 4)
            })
            .collect();
        assert_eq!(seq, vec![0, 0, 0, 0, 1, 1]);
    }

    #[test]
    fn wrap_index_is_modular() {
        assert_eq!(wrap_index(4.0, 4), 0);
        assert_eq!(wrap_index(5.0, 4), 1);
        assert_eq!(wrap_index(-1.0, 4), 3);
        assert_eq!(wrap_index(2.7, 4), 2);
        assert_eq!(wrap_index(-0.5, 4), 3);
    }

    #[test]
    fn wrap_index_empty_sequence() {
        assert_eq!(wrap_index(3.0, 0), 0);
    }
}
