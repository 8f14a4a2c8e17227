//! Common types used throughout strata.
//!
//! A [`CrossSection`] is every stock observed at one rebalancing date, stored
//! column-wise. Stocks are kept in ascending identifier order, which is the
//! canonical order every component scatters its results back into.

use crate::{Result, StrataError};
use ndarray::Array1;
use std::collections::{BTreeMap, HashSet};

// Re-export date type from chrono
pub use chrono::NaiveDate as Date;

/// A stock identifier, such as `"600000.XSHG"`.
pub type Symbol = String;

/// Panel column names.
pub mod columns {
    /// Rebalancing date.
    pub const DATE: &str = "date";
    /// Stock identifier.
    pub const STOCK: &str = "stock";
    /// Market value, strictly positive.
    pub const MARKET_VALUE: &str = "market_value";
    /// Primary industry code.
    pub const INDUSTRY: &str = "pri_indus_code";
    /// Return from this rebalancing date to the next one.
    pub const NEXT_RETURN: &str = "next_period_return";
    /// Benchmark index weight (optional).
    pub const INDEX_WEIGHT: &str = "index_weight";

    /// Columns every panel must carry.
    pub const REQUIRED: [&str; 5] = [DATE, STOCK, MARKET_VALUE, INDUSTRY, NEXT_RETURN];
}

/// All stocks observed at one rebalancing date.
#[derive(Debug, Clone)]
pub struct CrossSection {
    /// Rebalancing date.
    pub date: Date,
    /// Stock identifiers, ascending.
    pub stocks: Vec<Symbol>,
    /// Primary industry code per stock.
    pub industries: Vec<String>,
    /// Market value per stock.
    pub market_value: Array1<f64>,
    /// Forward return to the next rebalancing date.
    pub next_return: Array1<f64>,
    /// Benchmark index weight per stock.
    pub index_weight: Array1<f64>,
    /// Factor exposures keyed by factor name. `NaN` marks a missing value.
    pub factors: BTreeMap<String, Array1<f64>>,
}

impl CrossSection {
    /// Build a cross-section without factor columns.
    ///
    /// Rows are reordered so that stocks are ascending. Lengths must agree and
    /// stock identifiers must be unique.
    pub fn new(
        date: Date,
        stocks: Vec<Symbol>,
        industries: Vec<String>,
        market_value: Vec<f64>,
        next_return: Vec<f64>,
        index_weight: Vec<f64>,
    ) -> Result<Self> {
        let n = stocks.len();
        if industries.len() != n
            || market_value.len() != n
            || next_return.len() != n
            || index_weight.len() != n
        {
            return Err(StrataError::InvalidData(format!(
                "cross-section {date}: column lengths disagree with {n} stocks"
            )));
        }

        let mut seen = HashSet::with_capacity(n);
        for stock in &stocks {
            if !seen.insert(stock.as_str()) {
                return Err(StrataError::InvalidData(format!(
                    "cross-section {date}: duplicate stock {stock}"
                )));
            }
        }

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| stocks[a].cmp(&stocks[b]));

        Ok(Self {
            date,
            stocks: order.iter().map(|&i| stocks[i].clone()).collect(),
            industries: order.iter().map(|&i| industries[i].clone()).collect(),
            market_value: order.iter().map(|&i| market_value[i]).collect(),
            next_return: order.iter().map(|&i| next_return[i]).collect(),
            index_weight: order.iter().map(|&i| index_weight[i]).collect(),
            factors: BTreeMap::new(),
        })
    }

    /// Attach a factor column given in canonical (ascending stock) order.
    pub fn with_factor(mut self, name: impl Into<String>, values: Array1<f64>) -> Result<Self> {
        let name = name.into();
        if values.len() != self.len() {
            return Err(StrataError::InvalidData(format!(
                "cross-section {}: factor {name} has {} values, expected {}",
                self.date,
                values.len(),
                self.len()
            )));
        }
        self.factors.insert(name, values);
        Ok(self)
    }

    /// Number of stocks.
    pub fn len(&self) -> usize {
        self.stocks.len()
    }

    /// Whether the cross-section has no stocks.
    pub fn is_empty(&self) -> bool {
        self.stocks.is_empty()
    }

    /// Exposure vector for a factor.
    pub fn factor(&self, name: &str) -> Result<&Array1<f64>> {
        self.factors
            .get(name)
            .ok_or_else(|| StrataError::MissingColumn(format!("{name} (date {})", self.date)))
    }

    /// Row indices of each industry bucket, keyed by industry code.
    ///
    /// Indices within a bucket keep canonical stock order.
    pub fn industry_buckets(&self) -> BTreeMap<&str, Vec<usize>> {
        let mut buckets: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (i, industry) in self.industries.iter().enumerate() {
            buckets.entry(industry.as_str()).or_default().push(i);
        }
        buckets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn date() -> Date {
        Date::from_ymd_opt(2011, 1, 31).unwrap()
    }

    #[test]
    fn test_cross_section_sorted_by_stock() {
        let cs = CrossSection::new(
            date(),
            vec!["B".into(), "A".into(), "C".into()],
            vec!["x".into(), "y".into(), "x".into()],
            vec![2.0, 1.0, 3.0],
            vec![0.02, 0.01, 0.03],
            vec![0.3, 0.3, 0.4],
        )
        .unwrap();
        assert_eq!(cs.stocks, vec!["A", "B", "C"]);
        assert_eq!(cs.industries, vec!["y", "x", "x"]);
        assert_eq!(cs.market_value, array![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_cross_section_rejects_duplicates() {
        let err = CrossSection::new(
            date(),
            vec!["A".into(), "A".into()],
            vec!["x".into(), "x".into()],
            vec![1.0, 1.0],
            vec![0.0, 0.0],
            vec![0.5, 0.5],
        )
        .unwrap_err();
        assert!(matches!(err, StrataError::InvalidData(_)));
    }

    #[test]
    fn test_industry_buckets() {
        let cs = CrossSection::new(
            date(),
            vec!["A".into(), "B".into(), "C".into()],
            vec!["y".into(), "x".into(), "y".into()],
            vec![1.0; 3],
            vec![0.0; 3],
            vec![1.0 / 3.0; 3],
        )
        .unwrap();
        let buckets = cs.industry_buckets();
        assert_eq!(buckets["x"], vec![1]);
        assert_eq!(buckets["y"], vec![0, 2]);
    }

    #[test]
    fn test_missing_factor() {
        let cs = CrossSection::new(date(), vec![], vec![], vec![], vec![], vec![]).unwrap();
        assert!(cs.is_empty());
        assert!(matches!(cs.factor("pe"), Err(StrataError::MissingColumn(_))));
    }
}
