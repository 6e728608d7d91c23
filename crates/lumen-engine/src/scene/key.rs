use core::cmp::Ordering;

/// Sort key for transparent draws.
///
/// Ordering rules:
/// 1) `distance`: descending (farthest first, back-to-front)
/// 2) `order`: ascending (collection order for equal distances)
#[derive(Debug, Copy, Clone)]
pub struct DepthKey {
    /// Camera-to-instance-centroid distance.
    pub distance: f64,
    /// Collection index, keeping equal distances stable.
    pub order: u32,
}

impl DepthKey {
    #[inline]
    pub const fn new(distance: f64, order: u32) -> Self {
        Self { distance, order }
    }
}

impl PartialEq for DepthKey {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DepthKey {}

impl Ord for DepthKey {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        match other.distance.total_cmp(&self.distance) {
            Ordering::Equal => self.order.cmp(&other.order),
            o => o,
        }
    }
}

impl PartialOrd for DepthKey {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn farther_sorts_first() {
        let mut keys = vec![DepthKey::new(5.0, 0), DepthKey::new(1.0, 1), DepthKey::new(3.0, 2)];
        keys.sort();
        let d: Vec<f64> = keys.iter().map(|k| k.distance).collect();
        assert_eq!(d, vec![5.0, 3.0, 1.0]);
    }

    #[test]
    fn ties_keep_collection_order() {
        let mut keys = vec![DepthKey::new(2.0, 3), DepthKey::new(2.0, 1)];
        keys.sort();
        assert_eq!(keys[0].order, 1);
    }

    #[test]
    fn nan_is_total() {
        let mut keys = vec![DepthKey::new(f64::NAN, 0), DepthKey::new(1.0, 1)];
        keys.sort();
        assert_eq!(keys.len(), 2);
    }
}
