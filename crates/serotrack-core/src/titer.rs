//! Titer readings — the validated lab value at the heart of the register.
//!
//! A titer is reported either qualitatively (`Non-reactive` / `Reactive`) or
//! as a dilution ratio `1:N`, where a higher N means stronger reactivity.
//! Labs dilute in doubling steps, so N is always a power of two; readings
//! above 1:4096 are not reported by any assay we ingest.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// Highest dilution denominator accepted at the input boundary.
pub const MAX_DILUTION: u32 = 4096;

// ─── TiterReading ────────────────────────────────────────────────────────────

/// A validated titer value. Construction (via [`FromStr`] or serde) rejects
/// anything that is not one of the three accepted forms; malformed strings
/// never make it into storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TiterReading {
  /// `Non-reactive` — no antibody detected.
  NonReactive,
  /// `Reactive` with no dilution given. Qualitatively positive but of
  /// unknown magnitude, so unusable as a trend endpoint.
  Reactive,
  /// `1:N` — reactive at dilution N (power of two, 2..=4096).
  Dilution(u32),
}

impl TiterReading {
  /// The dilution denominator, if this reading carries one.
  pub fn dilution(&self) -> Option<u32> {
    match self {
      Self::Dilution(n) => Some(*n),
      _ => None,
    }
  }

  /// Numeric magnitude usable as a trend endpoint: `1:N` → N,
  /// `Non-reactive` → 0. Bare `Reactive` has no usable magnitude.
  pub fn trend_magnitude(&self) -> Option<u32> {
    match self {
      Self::Dilution(n) => Some(*n),
      Self::NonReactive => Some(0),
      Self::Reactive => None,
    }
  }

  /// The qualitative result implied by this reading.
  pub fn reactivity(&self) -> Reactivity {
    match self {
      Self::NonReactive => Reactivity::NonReactive,
      _ => Reactivity::Reactive,
    }
  }
}

impl FromStr for TiterReading {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Error> {
    let trimmed = s.trim();

    if trimmed.eq_ignore_ascii_case("non-reactive") {
      return Ok(Self::NonReactive);
    }
    if trimmed.eq_ignore_ascii_case("reactive") {
      return Ok(Self::Reactive);
    }

    if let Some(denom) = trimmed.strip_prefix("1:")
      && let Ok(n) = denom.parse::<u32>()
      && n.is_power_of_two()
      && (2..=MAX_DILUTION).contains(&n)
    {
      return Ok(Self::Dilution(n));
    }

    Err(Error::InvalidTiter(s.to_string()))
  }
}

impl TryFrom<String> for TiterReading {
  type Error = Error;

  fn try_from(s: String) -> Result<Self, Error> { s.parse() }
}

impl fmt::Display for TiterReading {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::NonReactive => write!(f, "Non-reactive"),
      Self::Reactive => write!(f, "Reactive"),
      Self::Dilution(n) => write!(f, "1:{n}"),
    }
  }
}

impl From<TiterReading> for String {
  fn from(t: TiterReading) -> Self { t.to_string() }
}

// ─── Reactivity ──────────────────────────────────────────────────────────────

/// Qualitative lab result reported alongside a titer on follow-up tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reactivity {
  Reactive,
  NonReactive,
  Inconclusive,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_canonical_forms() {
    assert_eq!(
      "Non-reactive".parse::<TiterReading>().unwrap(),
      TiterReading::NonReactive
    );
    assert_eq!(
      "Reactive".parse::<TiterReading>().unwrap(),
      TiterReading::Reactive
    );
    assert_eq!(
      "1:64".parse::<TiterReading>().unwrap(),
      TiterReading::Dilution(64)
    );
  }

  #[test]
  fn parsing_is_case_and_whitespace_tolerant() {
    assert_eq!(
      " non-reactive ".parse::<TiterReading>().unwrap(),
      TiterReading::NonReactive
    );
    assert_eq!(
      "REACTIVE".parse::<TiterReading>().unwrap(),
      TiterReading::Reactive
    );
  }

  #[test]
  fn rejects_non_power_of_two_dilutions() {
    assert!("1:3".parse::<TiterReading>().is_err());
    assert!("1:100".parse::<TiterReading>().is_err());
  }

  #[test]
  fn rejects_out_of_range_dilutions() {
    assert!("1:1".parse::<TiterReading>().is_err());
    assert!("1:8192".parse::<TiterReading>().is_err());
  }

  #[test]
  fn rejects_garbage() {
    assert!("garbage".parse::<TiterReading>().is_err());
    assert!("".parse::<TiterReading>().is_err());
    assert!("2:8".parse::<TiterReading>().is_err());
  }

  #[test]
  fn display_roundtrips() {
    for raw in ["Non-reactive", "Reactive", "1:2", "1:4096"] {
      let t: TiterReading = raw.parse().unwrap();
      assert_eq!(t.to_string(), raw);
    }
  }

  #[test]
  fn trend_magnitudes() {
    assert_eq!(TiterReading::NonReactive.trend_magnitude(), Some(0));
    assert_eq!(TiterReading::Reactive.trend_magnitude(), None);
    assert_eq!(TiterReading::Dilution(16).trend_magnitude(), Some(16));
  }
}
