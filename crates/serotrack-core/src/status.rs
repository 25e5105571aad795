//! The titer status engine — pure classification of readings into a
//! [`TreatmentStatus`].
//!
//! Two modes:
//!
//! - [`classify`] / [`classify_reading`]: coarse magnitude banding of a
//!   single reading, used when only the latest value is known.
//! - [`classify_trend`]: serologic follow-up over a (previous, current)
//!   pair — the 4-fold-drop rule, the rise-indicates-reinfection rule, and
//!   the 90-day-plateau-indicates-failure rule.
//!
//! The engine never fails. Bad input degrades to [`TreatmentStatus::Unknown`]
//! (single mode) or "no status change" (trend mode); it never guesses a
//! worse-than-warranted status from unparsable data.

use serde::{Deserialize, Serialize};

use crate::titer::{Reactivity, TiterReading};

/// Dilution at or above which a case reads as an active infection.
const ACTIVE_THRESHOLD: u32 = 32;
/// Dilution at or above which a case reads as under treatment.
const TREATMENT_THRESHOLD: u32 = 8;
/// Plateaus older than this (days since last treatment) read as failure.
const PLATEAU_FAILURE_DAYS: i64 = 90;

// ─── TreatmentStatus ─────────────────────────────────────────────────────────

/// Clinical status of a case, always derived at read time from titer data —
/// never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreatmentStatus {
  ActiveInfection,
  UnderTreatment,
  TreatmentComplete,
  MonitoringCure,
  Cured,
  TreatmentFailure,
  Reinfection,
  Unknown,
}

// ─── Single-reading classification ───────────────────────────────────────────

/// Classify a raw titer string. Lenient: any unparsable input (including a
/// bare `Reactive`, which has no magnitude) yields `Unknown` rather than an
/// error.
pub fn classify(raw: &str) -> TreatmentStatus {
  match raw.parse::<TiterReading>() {
    Ok(reading) => classify_reading(&reading),
    Err(_) => TreatmentStatus::Unknown,
  }
}

/// Classify an already-validated reading by magnitude band.
pub fn classify_reading(reading: &TiterReading) -> TreatmentStatus {
  let Some(v) = reading.trend_magnitude() else {
    // Bare "Reactive": qualitatively positive, magnitude unknown.
    return TreatmentStatus::Unknown;
  };

  if v >= ACTIVE_THRESHOLD {
    TreatmentStatus::ActiveInfection
  } else if v >= TREATMENT_THRESHOLD {
    TreatmentStatus::UnderTreatment
  } else if v >= 1 {
    TreatmentStatus::MonitoringCure
  } else {
    TreatmentStatus::Cured
  }
}

// ─── Trend classification ────────────────────────────────────────────────────

/// Classify a (previous, current) pair of readings for a case already under
/// treatment or monitoring.
///
/// Returns `None` when no conclusion is warranted — either reading lacks a
/// usable magnitude, or the titer has plateaued too recently — in which case
/// the caller keeps the prior status.
///
/// `days_since_last_treatment` is measured from the most recent treatment
/// date to the date of the current reading.
pub fn classify_trend(
  previous: &TiterReading,
  current: &TiterReading,
  current_result: Reactivity,
  days_since_last_treatment: Option<i64>,
) -> Option<TreatmentStatus> {
  let prev = previous.trend_magnitude()?;
  let curr = current.trend_magnitude()?;

  // A drop of at least two dilution steps (4-fold) is a favorable response.
  if curr <= prev / 4 {
    return Some(if current_result == Reactivity::NonReactive {
      TreatmentStatus::Cured
    } else {
      TreatmentStatus::MonitoringCure
    });
  }

  // A rising titer after treatment indicates reinfection.
  if curr > prev {
    return Some(TreatmentStatus::Reinfection);
  }

  // Plateau: only conclude failure once enough time has passed since the
  // last treatment.
  if curr == prev
    && let Some(days) = days_since_last_treatment
    && days > PLATEAU_FAILURE_DAYS
  {
    return Some(TreatmentStatus::TreatmentFailure);
  }

  None
}

#[cfg(test)]
mod tests {
  use super::*;

  fn titer(raw: &str) -> TiterReading { raw.parse().unwrap() }

  // ── Single-reading bands ──────────────────────────────────────────────

  #[test]
  fn bands_match_magnitude() {
    assert_eq!(classify("1:32"), TreatmentStatus::ActiveInfection);
    assert_eq!(classify("1:16"), TreatmentStatus::UnderTreatment);
    assert_eq!(classify("1:4"), TreatmentStatus::MonitoringCure);
    assert_eq!(classify("Non-reactive"), TreatmentStatus::Cured);
    assert_eq!(classify("garbage"), TreatmentStatus::Unknown);
  }

  #[test]
  fn band_boundaries_are_half_open() {
    // Exactly 8 is already "under treatment", exactly 32 already "active".
    assert_eq!(classify("1:8"), TreatmentStatus::UnderTreatment);
    assert_eq!(classify("1:32"), TreatmentStatus::ActiveInfection);
  }

  #[test]
  fn high_dilutions_are_active() {
    assert_eq!(classify("1:4096"), TreatmentStatus::ActiveInfection);
  }

  #[test]
  fn bare_reactive_is_unknown() {
    assert_eq!(classify("Reactive"), TreatmentStatus::Unknown);
  }

  #[test]
  fn classify_is_pure() {
    assert_eq!(classify("1:64"), classify("1:64"));
  }

  // ── Trend ─────────────────────────────────────────────────────────────

  #[test]
  fn fourfold_drop_still_reactive_is_monitoring() {
    let s = classify_trend(&titer("1:64"), &titer("1:16"), Reactivity::Reactive, None);
    assert_eq!(s, Some(TreatmentStatus::MonitoringCure));
  }

  #[test]
  fn fourfold_drop_non_reactive_is_cured() {
    let s = classify_trend(
      &titer("1:64"),
      &titer("1:16"),
      Reactivity::NonReactive,
      None,
    );
    assert_eq!(s, Some(TreatmentStatus::Cured));
  }

  #[test]
  fn drop_to_non_reactive_is_cured() {
    let s = classify_trend(
      &titer("1:8"),
      &titer("Non-reactive"),
      Reactivity::NonReactive,
      None,
    );
    assert_eq!(s, Some(TreatmentStatus::Cured));
  }

  #[test]
  fn rising_titer_is_reinfection() {
    let s = classify_trend(&titer("1:16"), &titer("1:32"), Reactivity::Reactive, None);
    assert_eq!(s, Some(TreatmentStatus::Reinfection));
  }

  #[test]
  fn twofold_drop_is_indeterminate() {
    // 1:32 → 1:16 is only one dilution step; not yet a response.
    let s = classify_trend(&titer("1:32"), &titer("1:16"), Reactivity::Reactive, None);
    assert_eq!(s, None);
  }

  #[test]
  fn late_plateau_is_treatment_failure() {
    let s =
      classify_trend(&titer("1:16"), &titer("1:16"), Reactivity::Reactive, Some(120));
    assert_eq!(s, Some(TreatmentStatus::TreatmentFailure));
  }

  #[test]
  fn recent_plateau_is_indeterminate() {
    let s =
      classify_trend(&titer("1:16"), &titer("1:16"), Reactivity::Reactive, Some(30));
    assert_eq!(s, None);

    // Exactly 90 days is still too soon.
    let s =
      classify_trend(&titer("1:16"), &titer("1:16"), Reactivity::Reactive, Some(90));
    assert_eq!(s, None);
  }

  #[test]
  fn plateau_without_treatment_date_is_indeterminate() {
    let s = classify_trend(&titer("1:16"), &titer("1:16"), Reactivity::Reactive, None);
    assert_eq!(s, None);
  }

  #[test]
  fn bare_reactive_endpoint_is_indeterminate() {
    let s = classify_trend(
      &titer("1:16"),
      &titer("Reactive"),
      Reactivity::Reactive,
      Some(120),
    );
    assert_eq!(s, None);
  }
}
