use std::fmt::{self, Debug, Display};

/// Inclusive integer range. Used both for character classes on set
/// transitions and for text-extraction spans over the input stream.
/// An interval with `b < a` is empty; `Interval::INVALID` is the
/// canonical empty value.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    pub a: i32,
    pub b: i32,
}

impl Interval {
    pub const INVALID: Interval = Interval { a: -1, b: -2 };

    pub fn of(a: i32, b: i32) -> Self {
        Interval { a, b }
    }

    pub fn point(a: i32) -> Self {
        Interval { a, b: a }
    }

    pub fn len(&self) -> usize {
        if self.b < self.a {
            0
        } else {
            (self.b - self.a + 1) as usize
        }
    }

    pub fn is_empty(&self) -> bool {
        self.b < self.a
    }

    pub fn contains(&self, v: i32) -> bool {
        self.a <= v && v <= self.b
    }

    pub fn starts_before_disjoint(&self, other: &Interval) -> bool {
        self.a < other.a && self.b < other.a
    }

    pub fn starts_before_non_disjoint(&self, other: &Interval) -> bool {
        self.a <= other.a && self.b >= other.a
    }

    pub fn starts_after_disjoint(&self, other: &Interval) -> bool {
        self.a > other.b
    }

    pub fn starts_after_non_disjoint(&self, other: &Interval) -> bool {
        self.a > other.a && self.a <= other.b
    }

    pub fn disjoint(&self, other: &Interval) -> bool {
        self.starts_before_disjoint(other) || self.starts_after_disjoint(other)
    }

    pub fn adjacent(&self, other: &Interval) -> bool {
        self.a == other.b + 1 || self.b == other.a - 1
    }

    pub fn properly_contains(&self, other: &Interval) -> bool {
        other.a >= self.a && other.b <= self.b
    }

    pub fn union(&self, other: &Interval) -> Interval {
        Interval::of(self.a.min(other.a), self.b.max(other.b))
    }

    pub fn intersection(&self, other: &Interval) -> Interval {
        Interval::of(self.a.max(other.a), self.b.min(other.b))
    }

    /// The part of `self` not covered by `other`, when `other` does not
    /// properly contain `self`. Returns `None` when the two are disjoint.
    pub fn difference_not_properly_contained(&self, other: &Interval) -> Option<Interval> {
        if other.starts_before_non_disjoint(self) {
            Some(Interval::of(self.a.max(other.b + 1), self.b))
        } else if other.starts_after_non_disjoint(self) {
            Some(Interval::of(self.a, other.a - 1))
        } else {
            None
        }
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.a, self.b)
    }
}

impl Debug for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

/// A set of symbols kept as a sorted list of disjoint, non-adjacent
/// intervals. Insertion coalesces overlapping and adjacent ranges, so
/// membership checks are a binary search over a small list.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct IntervalSet {
    intervals: Vec<Interval>,
}

impl IntervalSet {
    pub fn new() -> Self {
        IntervalSet { intervals: vec![] }
    }

    pub fn of(a: i32, b: i32) -> Self {
        let mut s = IntervalSet::new();
        s.add(Interval::of(a, b));
        s
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn num_intervals(&self) -> usize {
        self.intervals.len()
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn add(&mut self, added: Interval) {
        if added.is_empty() {
            return;
        }
        let mut merged = added;
        let mut out: Vec<Interval> = Vec::with_capacity(self.intervals.len() + 1);
        let mut placed = false;
        for iv in &self.intervals {
            if placed {
                out.push(*iv);
            } else if !merged.disjoint(iv) || merged.adjacent(iv) {
                merged = merged.union(iv);
            } else if iv.starts_after_disjoint(&merged) {
                out.push(merged);
                placed = true;
                out.push(*iv);
            } else {
                out.push(*iv);
            }
        }
        if !placed {
            out.push(merged);
        }
        self.intervals = out;
    }

    pub fn add_set(&mut self, other: &IntervalSet) {
        for iv in &other.intervals {
            self.add(*iv);
        }
    }

    pub fn contains(&self, v: i32) -> bool {
        self.intervals
            .binary_search_by(|iv| {
                if v < iv.a {
                    std::cmp::Ordering::Greater
                } else if v > iv.b {
                    std::cmp::Ordering::Less
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }

    pub fn len(&self) -> usize {
        self.intervals.iter().map(|iv| iv.len()).sum()
    }
}

impl Display for IntervalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.intervals.iter().map(|iv| iv.to_string()).collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

impl Debug for IntervalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_relations() {
        let a = Interval::of(0, 5);
        let b = Interval::of(6, 9);
        let c = Interval::of(3, 7);
        assert!(a.adjacent(&b));
        assert!(a.disjoint(&b));
        assert!(!a.disjoint(&c));
        assert_eq!(a.union(&c), Interval::of(0, 7));
        assert_eq!(a.intersection(&c), Interval::of(3, 5));
        assert_eq!(
            a.difference_not_properly_contained(&c),
            Some(Interval::of(0, 2))
        );
        assert_eq!(c.difference_not_properly_contained(&a), Some(Interval::of(6, 7)));
        assert!(Interval::INVALID.is_empty());
        assert_eq!(Interval::of(4, 1).len(), 0);
    }

    #[test]
    fn interval_set_coalesces() {
        let mut s = IntervalSet::new();
        s.add(Interval::of(10, 20));
        s.add(Interval::of(30, 40));
        assert_eq!(s.num_intervals(), 2);
        // adjacent on the left, overlapping on the right: collapses to one
        s.add(Interval::of(21, 30));
        assert_eq!(s.num_intervals(), 1);
        assert_eq!(s.intervals()[0], Interval::of(10, 40));
        assert!(s.contains(10) && s.contains(40) && s.contains(25));
        assert!(!s.contains(9) && !s.contains(41));
        assert_eq!(s.len(), 31);
    }

    #[test]
    fn interval_set_ordering() {
        let mut s = IntervalSet::new();
        s.add(Interval::of(50, 60));
        s.add(Interval::of(0, 5));
        s.add(Interval::of(20, 25));
        assert_eq!(
            s.intervals(),
            &[Interval::of(0, 5), Interval::of(20, 25), Interval::of(50, 60)]
        );
    }
}
