//! End-to-end runs over a synthetic monthly panel.

use approx::assert_abs_diff_eq;
use polars::prelude::*;
use strata::{
    DiagnosticKind, Panel, StrataConfig, StrataError, factor_combination, hierarchical_backtest,
    single_factor_analysis,
};

const MONTHS: usize = 24;
const STOCKS: usize = 30;

/// Deterministic value in [-0.5, 0.5).
fn noise(seed: u64) -> f64 {
    let mut z = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    (z >> 11) as f64 / (1u64 << 53) as f64 - 0.5
}

/// `alpha` drives next-period returns, `beta` is unrelated noise.
fn synthetic_panel(solo_industry: bool) -> Panel {
    let mut date = Vec::new();
    let mut stock = Vec::new();
    let mut market_value = Vec::new();
    let mut industry = Vec::new();
    let mut next_return = Vec::new();
    let mut index_weight = Vec::new();
    let mut alpha = Vec::new();
    let mut beta = Vec::new();

    for m in 0..MONTHS {
        for s in 0..STOCKS {
            let seed = (m * STOCKS + s) as u64;
            let a = 2.0 * noise(seed);
            let ind = if solo_industry && s == STOCKS - 1 {
                "solo".to_string()
            } else {
                format!("I{}", s % 3)
            };
            date.push(format!("{}-{:02}-01", 2015 + m / 12, m % 12 + 1));
            stock.push(format!("{:06}.XSHE", s + 1));
            market_value.push(1.0e9 * (1.0 + (s % 7) as f64) * (1.0 + 0.2 * noise(seed + 50_000)));
            industry.push(ind);
            next_return.push(0.02 * a + 0.002 * noise(seed + 10_000) + 0.001 * (s % 3) as f64);
            index_weight.push(1.0 / STOCKS as f64);
            alpha.push(a);
            beta.push(noise(seed + 20_000));
        }
    }

    let df = df! {
        "date" => date,
        "stock" => stock,
        "market_value" => market_value,
        "pri_indus_code" => industry,
        "next_period_return" => next_return,
        "index_weight" => index_weight,
        "alpha" => alpha,
        "beta" => beta,
    }
    .unwrap();
    Panel::new(df).unwrap()
}

#[test]
fn test_hierarchical_backtest() {
    let panel = synthetic_panel(false);
    let run = hierarchical_backtest(&panel, "alpha", &StrataConfig::default()).unwrap();

    assert_eq!(run.weights.len(), MONTHS);
    assert!(run.diagnostics.is_empty());
    for table in &run.weights {
        assert_eq!(table.stocks.len(), STOCKS);
        for &total in table.group_totals().iter() {
            assert_abs_diff_eq!(total, 1.0, epsilon = 1e-12);
        }
    }

    assert_eq!(run.series.dates.len(), MONTHS);
    assert_eq!(run.series.group_count(), 5);
    // the top group holds the highest alpha, which earns the highest return
    let spread = run.performance.last().unwrap();
    assert_eq!(spread.group, strata::groups::SPREAD_LABEL);
    assert!(spread.total_return > 0.0);
    assert!(run.performance[4].total_return > run.performance[0].total_return);

    let frame = run.weight_frame().unwrap();
    assert_eq!(frame.height(), MONTHS * STOCKS * 5);
}

#[test]
fn test_preprocessing_preserves_group_order() {
    let panel = synthetic_panel(false);
    let plain = hierarchical_backtest(&panel, "alpha", &StrataConfig::default()).unwrap();
    let mut config = StrataConfig::default();
    config.preprocess.enabled = true;
    let cleaned = hierarchical_backtest(&panel, "alpha", &config).unwrap();
    for (a, b) in plain.weights.iter().zip(&cleaned.weights) {
        assert_eq!(a.weights, b.weights);
    }
}

#[test]
fn test_factor_combination() {
    let panel = synthetic_panel(false);
    let run = factor_combination(&panel, &["alpha", "beta"], &StrataConfig::default()).unwrap();

    assert_eq!(run.ic_table.len(), MONTHS);
    assert_eq!(run.ic_table.factors, vec!["alpha".to_string(), "beta".to_string()]);
    assert_eq!(run.moments.len(), MONTHS - 12);
    assert!(run.summaries[0].mean_ic > 0.8);
    assert!(run.summaries[0].mean_ic > run.summaries[1].mean_ic);

    assert_eq!(run.report.len(), MONTHS - 12);
    for record in &run.report.records {
        assert!(record.converged);
        assert!(record.score >= record.uniform_score - 1e-12);
        assert_abs_diff_eq!(record.weights.sum(), 1.0, epsilon = 1e-9);
        assert!(record.weights[0] > record.weights[1]);
    }
    let frame = run.report.to_frame().unwrap();
    assert_eq!(frame.height(), MONTHS - 12);

    assert_eq!(run.composites.len(), run.report.len());
    for (composite, record) in run.composites.iter().zip(&run.report.records) {
        assert_eq!(composite.date, record.date);
        assert_eq!(composite.stocks.len(), STOCKS);
        assert!(composite.scores.iter().all(|z| z.is_finite()));
        assert_abs_diff_eq!(composite.scores.sum(), 0.0, epsilon = 1e-9);
    }
}

#[test]
fn test_short_history_gives_no_weights() {
    let panel = synthetic_panel(false);
    let mut config = StrataConfig::default();
    config.ic.window = MONTHS;
    let run = factor_combination(&panel, &["alpha", "beta"], &config).unwrap();
    assert!(run.moments.is_empty());
    assert!(run.report.is_empty());
}

#[test]
fn test_single_factor_analysis() {
    let panel = synthetic_panel(false);
    let analysis = single_factor_analysis(&panel, "alpha", &StrataConfig::default()).unwrap();
    assert_eq!(analysis.ic.n_obs, MONTHS);
    assert!(analysis.ic.ir > 1.0);
    assert_eq!(analysis.regressions.len(), MONTHS);
    assert!(analysis.tvalues.mean_abs_t > 2.0);
    assert_abs_diff_eq!(analysis.tvalues.mean_factor_return, 0.02, epsilon = 2e-3);
}

#[test]
fn test_singleton_industry_is_reported_not_fatal() {
    let panel = synthetic_panel(true);
    let run = factor_combination(&panel, &["alpha", "beta"], &StrataConfig::default()).unwrap();
    assert!(run.ic_table.values.iter().all(|v| v.is_finite()));
    let singles = run
        .diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::RankDeficientRegression)
        .count();
    // one per date and factor
    assert_eq!(singles, MONTHS * 2);
    assert!(
        run.diagnostics
            .iter()
            .all(|d| d.provenance.industry.as_deref() == Some("solo"))
    );
}

#[test]
fn test_schema_errors_are_fatal() {
    let df = df! {
        "date" => &["2015-01-01"],
        "stock" => &["000001.XSHE"],
        "pri_indus_code" => &["I0"],
        "next_period_return" => &[0.01],
    }
    .unwrap();
    assert!(matches!(Panel::new(df), Err(StrataError::MissingColumn(_))));

    let panel = synthetic_panel(false);
    assert!(matches!(
        hierarchical_backtest(&panel, "gamma", &StrataConfig::default()),
        Err(StrataError::MissingColumn(_))
    ));
}
