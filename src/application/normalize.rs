//! Raw portfolio → base-asset exposure.

use crate::application::leveraged_registry::LeveragedProductRegistry;
use crate::domain::values::exposure::{ExposureMap, RawPortfolio};
use crate::domain::values::normalization_mode::NormalizationMode;
use std::collections::BTreeMap;
use std::sync::Arc;

pub struct ExposureNormalizer {
    registry: Arc<LeveragedProductRegistry>,
}

impl ExposureNormalizer {
    pub fn new(registry: Arc<LeveragedProductRegistry>) -> Self {
        Self { registry }
    }

    /// Fold every ticker onto its base asset (`weight * factor`) and rescale.
    ///
    /// `LongOnly` drops non-positive exposure and scales the rest to sum to 1.
    /// `LongShort` keeps signs and scales so the absolute weights sum to 1.
    /// Returns an empty map when nothing usable is left.
    pub fn normalize(&self, raw: &RawPortfolio, mode: NormalizationMode) -> ExposureMap {
        let mut exposure: BTreeMap<String, f64> = BTreeMap::new();
        for (ticker, weight) in raw {
            let mapping = self.registry.lookup(ticker);
            *exposure.entry(mapping.base_ticker).or_insert(0.0) += weight * mapping.factor;
        }

        match mode {
            NormalizationMode::LongOnly => {
                exposure.retain(|_, w| *w > 0.0);
                let total: f64 = exposure.values().sum();
                if total <= 0.0 {
                    return ExposureMap::new();
                }
                exposure.into_iter().map(|(t, w)| (t, w / total)).collect()
            }
            NormalizationMode::LongShort => {
                let l1: f64 = exposure.values().map(|w| w.abs()).sum();
                if l1 == 0.0 {
                    return ExposureMap::new();
                }
                exposure.into_iter().map(|(t, w)| (t, w / l1)).collect()
            }
        }
    }
}
