//! Boundary parsing for sieve clause lists
//!
//! Accepts the external clause contract: an ordered list of
//! `[operation, {"modulus": m, "residues": [...]}]` pairs, with the legacy
//! single `"residue"` key and the `negation` spelling of `complement`.
//! Command-line clauses use the compact `op:modulus:r1,r2` form.

use crate::error::{XenakisError, XenakisResult};
use crate::sieve::{Clause, ClauseOp, Sieve};
use serde::Deserialize;
use serde_json::Value;

/// Raw clause body as it arrives from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ClauseSpec {
    pub modulus: Value,
    #[serde(default)]
    pub residues: Option<Vec<Option<i64>>>,
    #[serde(default)]
    pub residue: Option<i64>,
}

impl ClauseSpec {
    /// Validate into a core clause
    pub fn into_clause(self, op: ClauseOp) -> XenakisResult<Clause> {
        let modulus = self.modulus.as_i64().ok_or_else(|| {
            XenakisError::InvalidClause(format!("modulus {} is not an integer", self.modulus))
        })?;

        let residues: Vec<i64> = match self.residues {
            Some(list) => list.into_iter().flatten().collect(),
            None => self.residue.into_iter().collect(),
        };

        Clause::new(op, modulus, &residues)
    }
}

/// Map an operation name onto a clause operation
pub fn parse_op(name: &str) -> XenakisResult<ClauseOp> {
    match name.trim().to_ascii_lowercase().as_str() {
        "union" => Ok(ClauseOp::Union),
        "intersection" => Ok(ClauseOp::Intersection),
        "complement" | "negation" => Ok(ClauseOp::Complement),
        other => Err(XenakisError::InvalidClause(format!(
            "unknown operation '{}'",
            other
        ))),
    }
}

/// Parse a JSON clause list
pub fn parse_clauses_json(text: &str) -> XenakisResult<Vec<Clause>> {
    let raw: Vec<(String, ClauseSpec)> = serde_json::from_str(text)?;
    raw.into_iter()
        .map(|(op, spec)| spec.into_clause(parse_op(&op)?))
        .collect()
}

/// Parse one `op:modulus:r1,r2,...` clause
pub fn parse_clause_str(text: &str) -> XenakisResult<Clause> {
    let mut parts = text.splitn(3, ':');
    let (op, modulus, residues) = match (parts.next(), parts.next(), parts.next()) {
        (Some(op), Some(m), Some(r)) => (op, m, r),
        _ => {
            return Err(XenakisError::InvalidClause(format!(
                "expected op:modulus:residues, got '{}'",
                text
            )))
        }
    };

    let op = parse_op(op)?;
    let modulus: i64 = modulus.trim().parse().map_err(|_| {
        XenakisError::InvalidClause(format!("modulus '{}' is not an integer", modulus.trim()))
    })?;
    let residues = residues
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(|r| {
            r.parse::<i64>()
                .map_err(|_| XenakisError::InvalidClause(format!("residue '{}' is not an integer", r)))
        })
        .collect::<XenakisResult<Vec<i64>>>()?;

    Clause::new(op, modulus, &residues)
}

/// Build a sieve from clause strings and an initial shift
pub fn sieve_from_strs<S: AsRef<str>>(clauses: &[S], shift: i64) -> XenakisResult<Sieve> {
    let clauses = clauses
        .iter()
        .map(|c| parse_clause_str(c.as_ref()))
        .collect::<XenakisResult<Vec<_>>>()?;
    let mut sieve = Sieve::new(clauses);
    sieve.shift(shift);
    Ok(sieve)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_clause_list() {
        let clauses = parse_clauses_json(
            r#"[["union", {"modulus": 5, "residues": [0, 2]}],
                ["negation", {"modulus": 3, "residue": 1}]]"#,
        )
        .unwrap();
        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[0].residues(), &[0, 2]);
        assert_eq!(clauses[1].op(), ClauseOp::Complement);
        assert_eq!(clauses[1].residues(), &[1]);
    }

    #[test]
    fn test_null_residues_dropped() {
        let clauses =
            parse_clauses_json(r#"[["union", {"modulus": 4, "residues": [null, 5, -3]}]]"#).unwrap();
        assert_eq!(clauses[0].residues(), &[1]);
    }

    #[test]
    fn test_all_null_residues_rejected() {
        let err = parse_clauses_json(r#"[["union", {"modulus": 4, "residues": [null]}]]"#)
            .unwrap_err();
        assert!(matches!(err, XenakisError::InvalidClause(_)));
    }

    #[test]
    fn test_fractional_modulus_rejected() {
        let err = parse_clauses_json(r#"[["union", {"modulus": 4.5, "residues": [1]}]]"#)
            .unwrap_err();
        assert!(matches!(err, XenakisError::InvalidClause(_)));
    }

    #[test]
    fn test_unknown_operation_rejected() {
        assert!(matches!(parse_op("xor"), Err(XenakisError::InvalidClause(_))));
    }

    #[test]
    fn test_clause_string() {
        let clause = parse_clause_str("intersection:7:2, 9").unwrap();
        assert_eq!(clause.op(), ClauseOp::Intersection);
        assert_eq!(clause.modulus(), 7);
        assert_eq!(clause.residues(), &[2]);

        assert!(parse_clause_str("union:5").is_err());
        assert!(parse_clause_str("union:x:1").is_err());
        assert!(parse_clause_str("union:5:").is_err());
    }

    #[test]
    fn test_sieve_from_strs_applies_shift() {
        let sieve = sieve_from_strs(&["union:6:1"], 2).unwrap();
        assert_eq!(sieve.shift_amount(), 2);
        assert_eq!(sieve.generate(0, 12), vec![3, 9]);
    }
}
