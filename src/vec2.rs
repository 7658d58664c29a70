/// A 2-D vector with mutable components.
///
/// Arithmetic helpers return a new value; `set` mutates in place. The
/// interpreter stores these in arena slots and mutates the slots directly,
/// which is what lets recompute observe updated operand state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Vec2 { x, y }
    }

    /// In-place reset from two numbers.
    pub fn set(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }

    // ── Component-wise arithmetic ───────────────────────────────────

    pub fn add(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x + other.x, self.y + other.y)
    }

    pub fn sub(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x - other.x, self.y - other.y)
    }

    pub fn mul(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x * other.x, self.y * other.y)
    }

    // ── Scalar broadcast ────────────────────────────────────────────

    /// Add a scalar to both components.
    pub fn add_scalar(self, s: f64) -> Vec2 {
        Vec2::new(self.x + s, self.y + s)
    }

    /// Subtract a scalar from both components.
    pub fn sub_scalar(self, s: f64) -> Vec2 {
        Vec2::new(self.x - s, self.y - s)
    }

    /// Component-wise reversed subtraction: `s - self`.
    pub fn rsub_scalar(self, s: f64) -> Vec2 {
        Vec2::new(s - self.x, s - self.y)
    }

    /// Uniform scale.
    pub fn scale(self, s: f64) -> Vec2 {
        Vec2::new(self.x * s, self.y * s)
    }

    // ── Measures ────────────────────────────────────────────────────

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn dot(self, other: Vec2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Unit-length copy; the zero vector normalizes to itself.
    pub fn normalized(self) -> Vec2 {
        let len = self.length();
        if len == 0.0 {
            self
        } else {
            self.scale(1.0 / len)
        }
    }
}
