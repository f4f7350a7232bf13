/// Fixed-length history of the most recent samples.
///
/// `get(1)` is the newest sample, `get(len)` the oldest. A zero-length line
/// is valid and stores nothing.
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f64>,
    head: usize,
}

impl DelayLine {
    pub fn new(len: usize) -> Self {
        Self {
            buffer: vec![0.0; len],
            head: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    #[inline]
    pub fn push(&mut self, value: f64) {
        let len = self.buffer.len();
        if len == 0 {
            return;
        }
        self.head = (self.head + 1) % len;
        self.buffer[self.head] = value;
    }

    /// Sample pushed `delay` pushes ago (`1..=len`).
    #[inline]
    pub fn get(&self, delay: usize) -> f64 {
        let len = self.buffer.len();
        debug_assert!(delay >= 1 && delay <= len);
        self.buffer[(self.head + len - (delay - 1)) % len]
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.head = 0;
    }
}
