/// One of the four cells of the 2x2 grid, in capture order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quadrant {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::TopLeft,
        Quadrant::TopRight,
        Quadrant::BottomLeft,
        Quadrant::BottomRight,
    ];

    fn is_left(self) -> bool {
        matches!(self, Quadrant::TopLeft | Quadrant::BottomLeft)
    }

    fn is_top(self) -> bool {
        matches!(self, Quadrant::TopLeft | Quadrant::TopRight)
    }
}

/// Where one thumbnail ends up on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub quadrant: Quadrant,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Placement {
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn overlaps(&self, other: &Placement) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// Border geometry of the 2x2 composite
///
/// ```text
///        |---|-------------|---|-------------|---|
///          a        w       2*b       w        a
/// ```
///
/// `a` is the outer border, `b` the inner border. Thumbnails hug the centre
/// cross with a gap of `b` and stay at least `a` away from the canvas edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeLayout {
    pub canvas: (u32, u32),
    pub outer_border: u32,
    pub inner_border: u32,
}

impl CompositeLayout {
    pub fn new(canvas: (u32, u32), outer_border: u32, inner_border: u32) -> Self {
        Self {
            canvas,
            outer_border,
            inner_border,
        }
    }

    /// Half the canvas: the box each quadrant owns
    pub fn quadrant_box(&self) -> (u32, u32) {
        (self.canvas.0 / 2, self.canvas.1 / 2)
    }

    /// Largest size a thumbnail may take inside its quadrant
    pub fn thumbnail_bounds(&self) -> (u32, u32) {
        let (qw, qh) = self.quadrant_box();
        let border = self.outer_border + self.inner_border;
        (qw.saturating_sub(border), qh.saturating_sub(border))
    }

    /// Proportional scale-down to fit the bounds; never enlarges
    pub fn thumbnail_size(&self, source: (u32, u32)) -> (u32, u32) {
        let (bw, bh) = self.thumbnail_bounds();
        let (sw, sh) = source;
        if sw <= bw && sh <= bh {
            return source;
        }

        let scale = (bw as f64 / sw.max(1) as f64).min(bh as f64 / sh.max(1) as f64);
        let w = ((sw as f64 * scale).round() as u32).clamp(1, bw.max(1));
        let h = ((sh as f64 * scale).round() as u32).clamp(1, bh.max(1));
        (w, h)
    }

    /// Anchor a thumbnail of `size` against the centre cross
    pub fn place(&self, quadrant: Quadrant, size: (u32, u32)) -> Placement {
        let (cx, cy) = self.quadrant_box();
        let (w, h) = size;
        let b = self.inner_border;

        let x = if quadrant.is_left() {
            cx.saturating_sub(b + w)
        } else {
            cx + b
        };
        let y = if quadrant.is_top() {
            cy.saturating_sub(b + h)
        } else {
            cy + b
        };

        Placement {
            quadrant,
            x,
            y,
            width: w,
            height: h,
        }
    }
}
