use super::Feature;
use crate::domain::errors::EngineError;
use crate::domain::market::Bar;
use std::ops::Range;

/// Bars augmented with named indicator columns.
///
/// Construction drops every row where any column is non-finite (look-back
/// warm-up, zero divisions), so every surviving row has every column populated.
/// Row order is preserved. Frames are immutable once built.
#[derive(Debug, Clone, Default)]
pub struct FeatureFrame {
    bars: Vec<Bar>,
    columns: Vec<(Feature, Vec<f64>)>,
}

impl FeatureFrame {
    /// Builds a frame from full-length columns aligned with `bars`.
    ///
    /// Columns whose length differs from `bars` are rejected.
    pub fn from_columns(
        bars: &[Bar],
        columns: Vec<(Feature, Vec<f64>)>,
    ) -> Result<Self, EngineError> {
        if let Some((feature, values)) = columns.iter().find(|(_, v)| v.len() != bars.len()) {
            return Err(EngineError::IndicatorComputation(format!(
                "column {} has {} values for {} bars",
                feature,
                values.len(),
                bars.len()
            )));
        }

        let keep: Vec<usize> = (0..bars.len())
            .filter(|&row| columns.iter().all(|(_, values)| values[row].is_finite()))
            .collect();

        let bars_kept = keep.iter().map(|&row| bars[row]).collect();
        let columns_kept = columns
            .into_iter()
            .map(|(feature, values)| (feature, keep.iter().map(|&row| values[row]).collect()))
            .collect();

        Ok(Self {
            bars: bars_kept,
            columns: columns_kept,
        })
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }

    /// Feature columns in declaration order.
    pub fn features(&self) -> Vec<Feature> {
        self.columns.iter().map(|(f, _)| *f).collect()
    }

    pub fn has(&self, feature: Feature) -> bool {
        self.columns.iter().any(|(f, _)| *f == feature)
    }

    pub fn column(&self, feature: Feature) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(f, _)| *f == feature)
            .map(|(_, values)| values.as_slice())
    }

    /// Most recent value of a column.
    pub fn latest(&self, feature: Feature) -> Option<f64> {
        self.column(feature).and_then(|values| values.last().copied())
    }

    /// Value `back` rows before the most recent (0 = latest).
    pub fn value_from_end(&self, feature: Feature, back: usize) -> Option<f64> {
        let values = self.column(feature)?;
        values.len().checked_sub(back + 1).map(|idx| values[idx])
    }

    /// Candidates present in this frame, in the candidates' order.
    pub fn available(&self, candidates: &[Feature]) -> Vec<Feature> {
        candidates.iter().copied().filter(|f| self.has(*f)).collect()
    }

    /// Whether every listed feature is a column of this frame.
    pub fn contains_all(&self, features: &[Feature]) -> bool {
        features.iter().all(|f| self.has(*f))
    }

    /// Row range covering the most recent `n` rows (all rows if shorter).
    pub fn tail_range(&self, n: usize) -> Range<usize> {
        self.len().saturating_sub(n)..self.len()
    }

    /// Row-major feature matrix for `features` over `rows`.
    pub fn matrix(&self, features: &[Feature], rows: Range<usize>) -> Result<Vec<Vec<f64>>, EngineError> {
        if rows.end > self.len() || rows.start > rows.end {
            return Err(EngineError::InvalidInput(format!(
                "row range {:?} outside frame of {} rows",
                rows,
                self.len()
            )));
        }

        let cols: Vec<&[f64]> = features
            .iter()
            .map(|f| {
                self.column(*f).ok_or_else(|| {
                    EngineError::InvalidInput(format!("feature {} not present in frame", f))
                })
            })
            .collect::<Result<_, _>>()?;

        Ok(rows
            .map(|row| cols.iter().map(|values| values[row]).collect())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bars(n: usize) -> Vec<Bar> {
        (0..n)
            .map(|i| {
                let c = 100.0 + i as f64;
                Bar::new(i as i64 * 1_000, c, c + 1.0, c - 1.0, c, 5.0)
            })
            .collect()
    }

    #[test]
    fn test_incomplete_rows_are_dropped() {
        let input = bars(5);
        let frame = FeatureFrame::from_columns(
            &input,
            vec![
                (Feature::Rsi, vec![f64::NAN, 1.0, 2.0, 3.0, 4.0]),
                (Feature::Atr, vec![f64::NAN, f64::NAN, 2.0, f64::INFINITY, 4.0]),
            ],
        )
        .unwrap();

        assert_eq!(frame.len(), 2);
        assert_eq!(frame.column(Feature::Rsi).unwrap(), &[2.0, 4.0]);
        assert_eq!(frame.bars()[0].timestamp, 2_000);
        assert_eq!(frame.bars()[1].timestamp, 4_000);
    }

    #[test]
    fn test_mismatched_column_length_is_rejected() {
        let input = bars(3);
        let result = FeatureFrame::from_columns(&input, vec![(Feature::Rsi, vec![1.0])]);
        assert!(matches!(result, Err(EngineError::IndicatorComputation(_))));
    }

    #[test]
    fn test_matrix_and_tail() {
        let input = bars(4);
        let frame = FeatureFrame::from_columns(
            &input,
            vec![
                (Feature::Rsi, vec![1.0, 2.0, 3.0, 4.0]),
                (Feature::Adx, vec![10.0, 20.0, 30.0, 40.0]),
            ],
        )
        .unwrap();

        let m = frame
            .matrix(&[Feature::Adx, Feature::Rsi], frame.tail_range(2))
            .unwrap();
        assert_eq!(m, vec![vec![30.0, 3.0], vec![40.0, 4.0]]);
        assert_eq!(frame.tail_range(10), 0..4);
        assert_eq!(frame.value_from_end(Feature::Rsi, 1), Some(3.0));
        assert_eq!(frame.value_from_end(Feature::Rsi, 4), None);
        assert!(frame.matrix(&[Feature::Cmf], 0..1).is_err());
    }

    #[test]
    fn test_available_preserves_candidate_order() {
        let input = bars(2);
        let frame = FeatureFrame::from_columns(
            &input,
            vec![(Feature::Adx, vec![1.0, 2.0]), (Feature::Rsi, vec![1.0, 2.0])],
        )
        .unwrap();
        assert_eq!(
            frame.available(&[Feature::Rsi, Feature::Cmf, Feature::Adx]),
            vec![Feature::Rsi, Feature::Adx]
        );
        assert!(frame.contains_all(&[Feature::Adx]));
        assert!(!frame.contains_all(&[Feature::Adx, Feature::Cmf]));
    }
}
