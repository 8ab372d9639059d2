use serde::Serialize;

/// Ordinal band scale over logical node indices.
///
/// The domain is a permutation: `domain[position]` is the node drawn in that
/// band. `offset(index)` answers where a node lands, so swapping the
/// permutation moves nodes without touching their identity.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BandScale {
    domain: Vec<usize>,
    position_of: Vec<usize>,
    range: f64,
}

impl BandScale {
    pub fn new(domain: Vec<usize>, range: f64) -> Self {
        let position_of = invert(&domain);
        Self {
            domain,
            position_of,
            range,
        }
    }

    pub fn len(&self) -> usize {
        self.domain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domain.is_empty()
    }

    pub fn range(&self) -> f64 {
        self.range
    }

    pub fn domain(&self) -> &[usize] {
        &self.domain
    }

    pub fn bandwidth(&self) -> f64 {
        if self.domain.is_empty() {
            self.range
        } else {
            self.range / self.domain.len() as f64
        }
    }

    pub fn position(&self, index: usize) -> Option<usize> {
        self.position_of
            .get(index)
            .copied()
            .filter(|&position| position != usize::MAX)
    }

    /// Pixel offset of the band holding logical `index`; indices outside the
    /// domain map to the start of the range.
    pub fn offset(&self, index: usize) -> f64 {
        self.position(index)
            .map_or(0.0, |position| position as f64 * self.bandwidth())
    }

    /// Logical index of the band under `pixel`, clamped to the outer bands.
    pub fn invert(&self, pixel: f64) -> Option<usize> {
        if self.domain.is_empty() {
            return None;
        }
        let band = self.bandwidth();
        let position = if band > 0.0 {
            (pixel / band).floor().max(0.0) as usize
        } else {
            0
        };
        self.domain
            .get(position.min(self.domain.len() - 1))
            .copied()
    }

    pub fn rescale(&mut self, range: f64) {
        self.range = range;
    }

    pub fn set_domain(&mut self, domain: Vec<usize>) {
        self.position_of = invert(&domain);
        self.domain = domain;
    }
}

fn invert(domain: &[usize]) -> Vec<usize> {
    let mut position_of = vec![usize::MAX; domain.len()];
    for (position, &index) in domain.iter().enumerate() {
        if let Some(slot) = position_of.get_mut(index) {
            *slot = position;
        }
    }
    position_of
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_follow_the_permutation() {
        let scale = BandScale::new(vec![2, 0, 1], 300.0);

        assert_eq!(scale.bandwidth(), 100.0);
        assert_eq!(scale.offset(2), 0.0);
        assert_eq!(scale.offset(0), 100.0);
        assert_eq!(scale.offset(1), 200.0);
    }

    #[test]
    fn invert_finds_nearest_band() {
        let scale = BandScale::new(vec![2, 0, 1], 300.0);

        assert_eq!(scale.invert(0.0), Some(2));
        assert_eq!(scale.invert(150.0), Some(0));
        assert_eq!(scale.invert(299.9), Some(1));
        assert_eq!(scale.invert(-10.0), Some(2));
        assert_eq!(scale.invert(1e6), Some(1));
    }

    #[test]
    fn rescale_keeps_domain_order() {
        let mut scale = BandScale::new(vec![1, 0], 100.0);
        scale.rescale(400.0);

        assert_eq!(scale.domain(), &[1, 0]);
        assert_eq!(scale.offset(0), 200.0);
    }

    #[test]
    fn single_band_spans_full_range() {
        let scale = BandScale::new(vec![0], 250.0);

        assert_eq!(scale.bandwidth(), 250.0);
        assert_eq!(scale.offset(0), 0.0);
    }
}
