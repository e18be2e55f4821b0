// Priority Score Packing
//
// The priority set orders ready jobs by `(priority << PRIORITY_SHIFT) |
// counter`, so equal priorities still tie-break by insertion order. The
// shift width isn't pinned down by anything retained from the original
// source, so 48 bits is chosen here to leave 48 bits of headroom for the
// monotonic counter while keeping priority values well within i64 range
// (documented as an Open Question resolution in DESIGN.md).

pub const PRIORITY_SHIFT: i64 = 48;

pub fn priority_score(priority: u64, counter: i64) -> f64 {
    (((priority as i64) << PRIORITY_SHIFT) | counter) as f64
}
