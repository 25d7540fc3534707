use serde::Serialize;

/// Underlying asset and leverage factor of a listed product.
///
/// `factor > 0` is a leveraged long, `factor < 0` an inverse product and
/// `1.0` a plain holding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductMapping {
    pub base_ticker: String,
    pub factor: f64,
}

impl ProductMapping {
    pub fn identity(ticker: &str) -> Self {
        Self {
            base_ticker: ticker.to_string(),
            factor: 1.0,
        }
    }
}
