//! Residue-class sieves
//!
//! A sieve is an ordered list of modular clauses folded left to right over an
//! integer window. Each clause keeps the integers whose shifted value falls
//! into one of its residue classes, and combines that set with the
//! accumulator by union, intersection or complement.
//!
//! The shift (metabola) is subtracted from each candidate before the modulus
//! test, so the pattern slides along the number line while the requested
//! window stays put.

use crate::error::{XenakisError, XenakisResult};
use std::collections::BTreeSet;
use std::fmt;

/// How a clause combines with the accumulated result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClauseOp {
    Union,
    Intersection,
    Complement,
}

impl fmt::Display for ClauseOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClauseOp::Union => write!(f, "union"),
            ClauseOp::Intersection => write!(f, "intersection"),
            ClauseOp::Complement => write!(f, "complement"),
        }
    }
}

/// A validated residue-class clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    op: ClauseOp,
    modulus: i64,
    residues: Vec<i64>,
}

impl Clause {
    /// Build a clause, wrapping residues into `[0, modulus)`
    ///
    /// Negative residues wrap, duplicates collapse. Fails when the modulus is
    /// below 2 or when no residue survives normalisation.
    pub fn new(op: ClauseOp, modulus: i64, residues: &[i64]) -> XenakisResult<Self> {
        if modulus < 2 {
            return Err(XenakisError::InvalidClause(format!(
                "modulus {} must be an integer >= 2",
                modulus
            )));
        }

        let normalized: BTreeSet<i64> = residues.iter().map(|r| r.rem_euclid(modulus)).collect();
        if normalized.is_empty() {
            return Err(XenakisError::InvalidClause(format!(
                "residue list for modulus {} is empty after normalization",
                modulus
            )));
        }

        Ok(Self {
            op,
            modulus,
            residues: normalized.into_iter().collect(),
        })
    }

    pub fn union(modulus: i64, residues: &[i64]) -> XenakisResult<Self> {
        Self::new(ClauseOp::Union, modulus, residues)
    }

    pub fn intersection(modulus: i64, residues: &[i64]) -> XenakisResult<Self> {
        Self::new(ClauseOp::Intersection, modulus, residues)
    }

    pub fn complement(modulus: i64, residues: &[i64]) -> XenakisResult<Self> {
        Self::new(ClauseOp::Complement, modulus, residues)
    }

    pub fn op(&self) -> ClauseOp {
        self.op
    }

    pub fn modulus(&self) -> i64 {
        self.modulus
    }

    /// Canonical residues, sorted and within `[0, modulus)`
    pub fn residues(&self) -> &[i64] {
        &self.residues
    }

    fn accepts(&self, x: i64, shift: i64) -> bool {
        let m = self.modulus;
        let r = (x.rem_euclid(m) - shift.rem_euclid(m)).rem_euclid(m);
        self.residues.binary_search(&r).is_ok()
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let residues: Vec<String> = self.residues.iter().map(|r| r.to_string()).collect();
        write!(f, "{}({}: {})", self.op, self.modulus, residues.join(","))
    }
}

/// Ordered residue-class sieve with an adjustable shift
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sieve {
    clauses: Vec<Clause>,
    shift: i64,
}

impl Sieve {
    pub fn new(clauses: Vec<Clause>) -> Self {
        Self { clauses, shift: 0 }
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Replace the metabola offset; later calls overwrite earlier ones
    pub fn shift(&mut self, amount: i64) {
        self.shift = amount;
    }

    pub fn shift_amount(&self) -> i64 {
        self.shift
    }

    /// Members of the inclusive window `[start, end]`, strictly increasing
    ///
    /// Intersection and complement clauses that meet an empty accumulator
    /// seed it from their own filtered set (complement against the window),
    /// so a sieve may open with either of them.
    pub fn generate(&self, start: i64, end: i64) -> Vec<i64> {
        if start > end {
            return Vec::new();
        }

        let mut result: BTreeSet<i64> = BTreeSet::new();

        for clause in &self.clauses {
            let filtered: BTreeSet<i64> = (start..=end)
                .filter(|&x| clause.accepts(x, self.shift))
                .collect();

            result = match clause.op {
                ClauseOp::Union => {
                    result.extend(filtered);
                    result
                }
                ClauseOp::Intersection => {
                    if result.is_empty() {
                        filtered
                    } else {
                        result.intersection(&filtered).copied().collect()
                    }
                }
                ClauseOp::Complement => {
                    if result.is_empty() {
                        (start..=end).filter(|x| !filtered.contains(x)).collect()
                    } else {
                        result.difference(&filtered).copied().collect()
                    }
                }
            };
        }

        result.into_iter().collect()
    }

    /// Least common multiple of the clause moduli (1 with no clauses)
    pub fn period(&self) -> i64 {
        self.clauses
            .iter()
            .fold(1, |acc, clause| lcm(acc, clause.modulus))
    }

    /// Stepwise register-mapped sequence built by tiling the sieve
    ///
    /// A reservoir of at least two periods (and never fewer than 513 steps) is
    /// generated from zero, repeated upward one period at a time until
    /// `length` values exist, then folded into `[low, high]`.
    pub fn tile_sequence(&self, length: usize, low: i64, high: i64) -> Vec<i64> {
        let period = self.period().max(1);
        let reservoir = self.generate(0, 512.max(period.saturating_mul(2)));
        if reservoir.is_empty() {
            return Vec::new();
        }

        let span = (high - low + 1).max(1);
        let n = reservoir.len();
        (0..length)
            .map(|i| {
                let value = reservoir[i % n] + (i / n) as i64 * period;
                low + value.rem_euclid(span)
            })
            .collect()
    }
}

impl fmt::Display for Sieve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.clauses.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", parts.join(" · "))?;
        if self.shift != 0 {
            write!(f, " >> {}", self.shift)?;
        }
        Ok(())
    }
}

fn gcd(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

fn lcm(a: i64, b: i64) -> i64 {
    if a == 0 || b == 0 {
        return 0;
    }
    (a / gcd(a, b)).saturating_mul(b).abs()
}
