//! Compu-method metadata: maps a raw stored value to an engineering value.
//!
//! Only the rational conversion's linear special case gets a closed-form
//! display equation; every other family degrades to the identity `x`.

use crate::model::format_limit;

/// The six rational-conversion coefficients, in A2L order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

/// A resolved conversion reference: unit plus optional coefficients and
/// display format.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub unit: String,
    pub format: Option<String>,
    pub coefficients: Option<Coefficients>,
}

impl Conversion {
    /// Derive the display equation.
    ///
    /// When a = d = e = 0 and f ≠ 0 the rational conversion collapses to
    /// `((f·x) - c) / b`; a negative `c` flips the operator and is printed
    /// sign-stripped. Any other coefficient pattern (or no coefficients at
    /// all) renders as `x`.
    pub fn equation(&self) -> String {
        let Some(co) = self.coefficients else {
            return "x".to_string();
        };
        if co.a != 0.0 || co.d != 0.0 || co.e != 0.0 || co.f == 0.0 {
            return "x".to_string();
        }

        let (sign, c_abs) = if co.c < 0.0 { ('+', -co.c) } else { ('-', co.c) };
        format!(
            "(({} * [x]) {} {}) / {}",
            format_limit(co.f),
            sign,
            format_limit(c_abs),
            format_limit(co.b)
        )
    }
}
