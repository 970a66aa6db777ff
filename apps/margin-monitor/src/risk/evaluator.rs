//! Pure risk evaluation.
//!
//! One snapshot plus one price in, a deterministic set of findings out.
//! No I/O, no clock, no state; calling twice with the same inputs yields
//! identical results.

use super::types::{
    DenominatorSource, Evaluation, MarginSnapshot, RatioOutcome, RiskAssessment, RiskThresholds,
    RuleKind,
};

/// Evaluate one cycle's snapshot against the configured thresholds.
///
/// Two independent rules run, so a single cycle can yield zero, one, or
/// two assessments:
///
/// * Maintenance-margin ratio above `mm_threshold`, with a USD shortfall
///   solved against `mm_target` and converted to native units at `price_usd`.
/// * USD-valued native equity below `equity_floor_usd`, lifting equity back
///   to `equity_target` native units.
pub fn evaluate(
    snapshot: &MarginSnapshot,
    price_usd: f64,
    thresholds: &RiskThresholds,
) -> Evaluation {
    let (numerator, denominator, mm_usd, ratio_equity_usd) = match thresholds.denominator {
        DenominatorSource::SingleCurrencyNative => (
            snapshot.maintenance_margin,
            snapshot.equity,
            snapshot.maintenance_margin * price_usd,
            snapshot.equity * price_usd,
        ),
        DenominatorSource::AccountTotalsUsd => {
            // Totals are absent from single-currency snapshots; fall back to
            // the native figures valued at the cycle price.
            let total_mm = snapshot
                .total_maintenance_margin_usd
                .unwrap_or(snapshot.maintenance_margin * price_usd);
            let total_equity = snapshot
                .total_equity_usd
                .unwrap_or(snapshot.equity * price_usd);
            (total_mm, total_equity, total_mm, total_equity)
        }
    };

    #[allow(clippy::float_cmp)]
    let ratio = if denominator == 0.0 {
        RatioOutcome::Undefined
    } else {
        RatioOutcome::Defined(numerator / denominator)
    };

    let mut assessments = Vec::new();
    let mut required_remediation = 0.0;

    if let Some(r) = ratio.value()
        && r > thresholds.mm_threshold
    {
        // USD equity needed to bring the ratio down to target, minus what
        // is already there. A non-positive shortfall means the account is
        // over threshold but already funded past the target; stay silent.
        let delta_usd = mm_usd / thresholds.mm_target - ratio_equity_usd;
        if delta_usd > 0.0 {
            let remediation = delta_usd / price_usd;
            required_remediation = remediation;
            assessments.push(RiskAssessment {
                rule: RuleKind::MaintenanceMarginRatio,
                currency: snapshot.currency.clone(),
                message: format!(
                    "maintenance margin ratio {:.2}% exceeds threshold {:.2}%; \
                     add {:.6} {} to reach target ratio {:.2}%",
                    r * 100.0,
                    thresholds.mm_threshold * 100.0,
                    remediation,
                    snapshot.currency,
                    thresholds.mm_target * 100.0,
                ),
                current_value: r,
                threshold: thresholds.mm_threshold,
                remediation,
            });
        }
    }

    let equity_usd = snapshot.equity * price_usd;
    if equity_usd < thresholds.equity_floor_usd {
        let remediation = thresholds.equity_target - snapshot.equity;
        assessments.push(RiskAssessment {
            rule: RuleKind::EquityFloor,
            currency: snapshot.currency.clone(),
            message: format!(
                "{} equity {:.2} USD is below floor {:.2} USD; \
                 add {:.6} {} to reach target balance {:.6}",
                snapshot.currency,
                equity_usd,
                thresholds.equity_floor_usd,
                remediation,
                snapshot.currency,
                thresholds.equity_target,
            ),
            current_value: equity_usd,
            threshold: thresholds.equity_floor_usd,
            remediation,
        });
    }

    Evaluation {
        ratio,
        equity_usd,
        required_remediation,
        assessments,
    }
}
