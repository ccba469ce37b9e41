//! Interval overlap predicates shared by every conflict check.

/// Half-open overlap: `[start_a, end_a)` and `[start_b, end_b)` share at least
/// one instant. Touching endpoints do not overlap.
pub fn overlaps<T: PartialOrd>(start_a: T, end_a: T, start_b: T, end_b: T) -> bool {
    start_a < end_b && end_a > start_b
}

/// Closed overlap for inclusive date ranges: `[start_a, end_a]` and
/// `[start_b, end_b]` share at least one day.
pub fn dates_overlap<T: PartialOrd>(start_a: T, end_a: T, start_b: T, end_b: T) -> bool {
    start_a <= end_b && end_a >= start_b
}

/// Inclusive containment used by the "active on date" lookups; an absent end
/// means the range is open-ended.
pub fn covers<T: PartialOrd>(start: T, end: Option<T>, day: T) -> bool {
    start <= day && end.map_or(true, |end| day <= end)
}
