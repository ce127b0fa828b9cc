//! # Edge-bounded windows
//!
//! Grows an axis-aligned window around a seed pixel until each of its four sides has either hit
//! an edge in the left image, reached the image border, or run into a pixel which an earlier
//! window in the same pass already owns.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use crate::edges::EdgeMask;

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    North,
    South,
    West,
    East
}

/// Why a side of the window stopped growing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// The side lies on the image border.
    Boundary,

    /// The last strip added on this side held an edge pixel when scanned. A neighbouring side
    /// backing up in the same round may trim it off as a corner.
    Edge,

    /// The next strip overlapped an assigned pixel, so the side backed up by one step.
    Overlap
}

/// Growth state of one side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Growth {
    Running,
    Frozen(StopReason)
}

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// A rectangle described by its seed pixel and four independent extents.
///
/// Covers `[x - west, x + east] x [y - north, y + south]`, inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    pub x: usize,
    pub y: usize,
    pub north: usize,
    pub south: usize,
    pub west: usize,
    pub east: usize
}

/// A grown window together with the reason each side stopped.
#[derive(Clone, Copy, Debug)]
pub struct GrownWindow {
    pub window: Window,
    stops: [StopReason; 4]
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Direction {
    /// Order in which sides are grown within a round.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East
    ];

    fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::South => 1,
            Direction::West => 2,
            Direction::East => 3
        }
    }
}

impl Window {
    /// A 1x1 window on the given pixel.
    pub fn seed(x: usize, y: usize) -> Self {
        Self {
            x,
            y,
            north: 0,
            south: 0,
            west: 0,
            east: 0
        }
    }

    pub fn x_min(&self) -> usize {
        self.x - self.west
    }

    pub fn x_max(&self) -> usize {
        self.x + self.east
    }

    pub fn y_min(&self) -> usize {
        self.y - self.north
    }

    pub fn y_max(&self) -> usize {
        self.y + self.south
    }

    pub fn width(&self) -> usize {
        self.west + self.east + 1
    }

    pub fn height(&self) -> usize {
        self.north + self.south + 1
    }

    /// Number of pixels covered.
    pub fn area(&self) -> usize {
        self.width() * self.height()
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x_min() && x <= self.x_max() && y >= self.y_min() && y <= self.y_max()
    }

    pub fn overlaps(&self, other: &Window) -> bool {
        self.x_min() <= other.x_max()
            && other.x_min() <= self.x_max()
            && self.y_min() <= other.y_max()
            && other.y_min() <= self.y_max()
    }

    /// Iterate over every `(x, y)` in the window, row by row.
    pub fn pixels(&self) -> impl Iterator<Item = (usize, usize)> {
        let (x_min, x_max) = (self.x_min(), self.x_max());
        (self.y_min()..=self.y_max())
            .flat_map(move |y| (x_min..=x_max).map(move |x| (x, y)))
    }

    fn extent(&self, dir: Direction) -> usize {
        match dir {
            Direction::North => self.north,
            Direction::South => self.south,
            Direction::West => self.west,
            Direction::East => self.east
        }
    }

    fn extent_mut(&mut self, dir: Direction) -> &mut usize {
        match dir {
            Direction::North => &mut self.north,
            Direction::South => &mut self.south,
            Direction::West => &mut self.west,
            Direction::East => &mut self.east
        }
    }

    fn at_border(&self, dir: Direction, width: usize, height: usize) -> bool {
        match dir {
            Direction::North => self.y_min() == 0,
            Direction::South => self.y_max() + 1 >= height,
            Direction::West => self.x_min() == 0,
            Direction::East => self.x_max() + 1 >= width
        }
    }

    /// Inclusive `(x_min, x_max, y_min, y_max)` of the outermost strip on the given side.
    fn strip(&self, dir: Direction) -> (usize, usize, usize, usize) {
        match dir {
            Direction::North => (self.x_min(), self.x_max(), self.y_min(), self.y_min()),
            Direction::South => (self.x_min(), self.x_max(), self.y_max(), self.y_max()),
            Direction::West => (self.x_min(), self.x_min(), self.y_min(), self.y_max()),
            Direction::East => (self.x_max(), self.x_max(), self.y_min(), self.y_max())
        }
    }
}

impl GrownWindow {
    /// Why the given side of the window stopped growing.
    pub fn stop(&self, dir: Direction) -> StopReason {
        self.stops[dir.index()]
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Grow a window around the unassigned pixel `(x, y)`.
///
/// Each round runs in two phases. First every running side grows by one pixel, except a side
/// already on the image border, which freezes. Then each side grown this round scans its newly
/// exposed strip, bounded by the other sides' grown extents, so a new corner pixel is seen by
/// both of its sides:
///
/// - any pixel in `assigned` already owned by an earlier window makes the side back up by one
///   step and freeze, so the window never overlaps another;
/// - otherwise any edge pixel in the strip freezes the side with the edge included.
///
/// A back-up shrinks the window before the remaining strips of the round are scanned. The seed
/// pixel itself is never tested, so a window is at least 1x1 even if the seed lies on an edge.
/// `assigned` must hold one entry per pixel of `edges`.
pub fn grow(x: usize, y: usize, edges: &EdgeMask, assigned: &[Option<u8>]) -> GrownWindow {
    let width = edges.width();
    let height = edges.height();

    let mut window = Window::seed(x, y);
    let mut growth = [Growth::Running; 4];

    // Each round either grows a running side or freezes it. Extents are bounded by the image,
    // so this terminates.
    while growth.iter().any(|g| *g == Growth::Running) {
        let mut grown = [false; 4];

        for &dir in Direction::ALL.iter() {
            if growth[dir.index()] != Growth::Running {
                continue;
            }

            if window.at_border(dir, width, height) {
                growth[dir.index()] = Growth::Frozen(StopReason::Boundary);
                continue;
            }

            *window.extent_mut(dir) += 1;
            grown[dir.index()] = true;
        }

        for &dir in Direction::ALL.iter() {
            if !grown[dir.index()] {
                continue;
            }

            match scan_strip(&window, dir, edges, assigned) {
                Some(StopReason::Overlap) => {
                    *window.extent_mut(dir) -= 1;
                    growth[dir.index()] = Growth::Frozen(StopReason::Overlap);
                }
                Some(reason) => growth[dir.index()] = Growth::Frozen(reason),
                None => ()
            }
        }
    }

    let mut stops = [StopReason::Boundary; 4];
    for (stop, g) in stops.iter_mut().zip(growth.iter()) {
        if let Growth::Frozen(reason) = g {
            *stop = *reason;
        }
    }

    debug_assert!(Direction::ALL.iter().all(|&d| window.extent(d) <= width.max(height)));

    GrownWindow { window, stops }
}

/// Scan the outermost strip on one side, overlap taking precedence over edges.
fn scan_strip(
    window: &Window,
    dir: Direction,
    edges: &EdgeMask,
    assigned: &[Option<u8>]
) -> Option<StopReason> {
    let width = edges.width();
    let (x_min, x_max, y_min, y_max) = window.strip(dir);

    let mut hit_edge = false;

    for y in y_min..=y_max {
        let row = y * width;
        for x in x_min..=x_max {
            let i = row + x;

            if assigned[i].is_some() {
                return Some(StopReason::Overlap);
            }

            if edges.at(i) {
                hit_edge = true;
            }
        }
    }

    match hit_edge {
        true => Some(StopReason::Edge),
        false => None
    }
}
