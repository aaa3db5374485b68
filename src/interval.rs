/*

    Responsible for creating a struct that represents
    ranges from a to b. Used as a running (min, max)
    fold along a single axis while computing bounds.

    See also associated constants of Interval class:
    - EMPTY: (inf, -inf), identity of expand( )

    No epsilon is applied anywhere in this module,
    min/max folds are exact.

    @author: Bartu
    @date: Sept 2025

*/

use serde::Serialize;

use crate::numeric::{Float};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Interval {
    pub min: Float,
    pub max: Float,
}

impl Interval {

    pub const EMPTY: Self = Self {
        min: Float::INFINITY,
        max: Float::NEG_INFINITY,
    };

    pub fn validate(&self) -> bool {
        self.max >= self.min
    }

    pub fn new(min: Float, max: Float) -> Self {
        Self {
            min,
            max,
        }
    }

    pub fn size(&self) -> Float {
        self.max - self.min
    }

    pub fn center(&self) -> Float {
        (self.min + self.max) * 0.5
    }

    pub fn contains(&self, x: Float) -> bool {
        self.min <= x && x <= self.max
    }

    /// Total order, so -0.0 < +0.0 and the fold is bit stable under any
    /// point order. NaN would sort past infinity, keep it out.
    pub fn expand(&mut self, x: Float) {
        if x.total_cmp(&self.min).is_lt() { self.min = x; }
        if x.total_cmp(&self.max).is_gt() { self.max = x; }
    }

}
