//! 3D line supercover over integer grid cells.
//!
//! Bresenham-style DDA: the axis with the largest delta (ties resolved X, then
//! Y, then Z) is stepped every iteration, the two minor axes step whenever
//! their error accumulator is non-negative.
//!
//! ```text
//! err[minor] = 2 * d[minor] - d[major]
//! loop until cell[major] == end[major]:
//!     for each minor: if err >= 0 { step minor; err -= 2 * d[major] }
//!     step major
//!     for each minor: err += 2 * d[minor]
//!     emit cell
//! ```
//!
//! The step sign is `+1` only when `start < end` on that axis; equal
//! coordinates get `-1`. The delta on such an axis is zero, so its accumulator
//! never becomes non-negative and the sign is never used.

use bevy::math::{IVec3, Vec3};

/// Iterator over the cells a segment passes through, from `floor(start)` to
/// `floor(end)` inclusive.
///
/// Holds no state beyond one walk; build a new one to restart.
#[derive(Debug, Clone)]
pub struct Supercover {
    point: IVec3,
    end: IVec3,
    step: IVec3,
    double_delta: IVec3,
    major: usize,
    minors: [usize; 2],
    error: [i32; 2],
    started: bool,
}

impl Supercover {
    /// Start a walk between two continuous grid-space points.
    pub fn new(start: Vec3, end: Vec3) -> Self {
        Self::between(start.floor().as_ivec3(), end.floor().as_ivec3())
    }

    /// Start a walk between two integer cells.
    pub fn between(start: IVec3, end: IVec3) -> Self {
        let delta = (end - start).abs();
        let step = IVec3::new(
            step_sign(start.x, end.x),
            step_sign(start.y, end.y),
            step_sign(start.z, end.z),
        );
        let double_delta = delta * 2;

        let major = driving_axis(delta);
        let minors = match major {
            0 => [1, 2],
            1 => [0, 2],
            _ => [0, 1],
        };
        let error = [
            double_delta[minors[0]] - delta[major],
            double_delta[minors[1]] - delta[major],
        ];

        Self {
            point: start,
            end,
            step,
            double_delta,
            major,
            minors,
            error,
            started: false,
        }
    }

    /// Index of the driving axis (0 = X, 1 = Y, 2 = Z).
    pub fn driving_axis(&self) -> usize {
        self.major
    }
}

impl Iterator for Supercover {
    type Item = IVec3;

    fn next(&mut self) -> Option<IVec3> {
        if !self.started {
            self.started = true;
            return Some(self.point);
        }
        if self.point[self.major] == self.end[self.major] {
            return None;
        }

        for (error, &axis) in self.error.iter_mut().zip(self.minors.iter()) {
            if *error >= 0 {
                self.point[axis] += self.step[axis];
                *error -= self.double_delta[self.major];
            }
        }
        self.point[self.major] += self.step[self.major];
        for (error, &axis) in self.error.iter_mut().zip(self.minors.iter()) {
            *error += self.double_delta[axis];
        }

        Some(self.point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.end[self.major] - self.point[self.major]).unsigned_abs() as usize;
        let n = remaining + usize::from(!self.started);
        (n, Some(n))
    }
}

impl ExactSizeIterator for Supercover {}

/// Ordered cells from `floor(start)` to `floor(end)` inclusive.
pub fn trace_cells(start: Vec3, end: Vec3) -> Vec<IVec3> {
    Supercover::new(start, end).collect()
}

#[inline]
fn step_sign(start: i32, end: i32) -> i32 {
    if start < end {
        1
    } else {
        -1
    }
}

/// First axis whose delta is >= both others, in X, Y, Z order.
#[inline]
fn driving_axis(delta: IVec3) -> usize {
    if delta.x >= delta.y && delta.x >= delta.z {
        0
    } else if delta.y >= delta.x && delta.y >= delta.z {
        1
    } else {
        2
    }
}
