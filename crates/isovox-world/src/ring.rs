/// Square-spiral walk over chunk offsets around the camera chunk.
///
/// Leg `i` runs `i / 2` steps heading -x, -y, +x, +y in turn (starting with
/// -x on leg 2), yielding `(0,0), (-1,0), (-1,-1), (0,-1), (1,-1), (1,0),
/// (1,1), ...` so nearer rings are visited first.
#[derive(Clone, Debug)]
pub struct RingIter {
    legs: u32,
    leg: u32,
    step: u32,
    x: i32,
    y: i32,
}

impl RingIter {
    /// A walk of `4 * (render_distance - 1) + 3` legs.
    pub fn new(render_distance: u32) -> Self {
        Self::with_legs(4 * render_distance.saturating_sub(1) + 3)
    }

    pub fn with_legs(legs: u32) -> Self {
        Self {
            legs,
            leg: 0,
            step: 0,
            x: 0,
            y: 0,
        }
    }
}

impl Iterator for RingIter {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<(i32, i32)> {
        while self.leg < self.legs {
            if self.step < self.leg / 2 {
                let current = (self.x, self.y);
                match self.leg % 4 {
                    0 => self.x += 1,
                    1 => self.y += 1,
                    2 => self.x -= 1,
                    _ => self.y -= 1,
                }
                self.step += 1;
                return Some(current);
            }
            self.leg += 1;
            self.step = 0;
        }
        None
    }
}
