//! Loop bound matching.
//!
//! [`find_match`] walks the script from a bound to its partner. [`JumpTable`]
//! answers the same question in O(1) after one O(len) pass. Both give the
//! same answer for every bound of a balanced script.

use crate::error::InvariantViolation;

/// How the engine finds the partner of a loop bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchStrategy {
    /// Scan the script on every jump.
    Scan,
    /// Look the partner up in a table built before execution.
    #[default]
    Table,
}

impl std::str::FromStr for MatchStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scan" => Ok(MatchStrategy::Scan),
            "table" => Ok(MatchStrategy::Table),
            other => Err(format!("unknown resolver '{other}' (expected 'scan' or 'table')")),
        }
    }
}

/// Find the index of the bound paired with the one at `position`.
///
/// Scans forward from a `[` and backward from a `]`. Bounds of the same
/// kind met on the way open a nested loop and bump the depth; bounds of the
/// opposite kind close one, and the first one met at depth 0 is the partner.
pub fn find_match(code: &[char], position: usize) -> Result<usize, InvariantViolation> {
    let (begin, finish, forward) = match code.get(position) {
        Some('[') => ('[', ']', true),
        Some(']') => (']', '[', false),
        _ => return Err(InvariantViolation::NotOnBound { ip: position }),
    };

    let mut depth = 0usize;
    let mut at = position;
    loop {
        at = if forward {
            at + 1
        } else {
            at.checked_sub(1)
                .ok_or(InvariantViolation::RanOffEnd { ip: position })?
        };

        let Some(&c) = code.get(at) else {
            return Err(InvariantViolation::RanOffEnd { ip: position });
        };

        if c == begin {
            depth += 1;
        } else if c == finish {
            if depth == 0 {
                return Ok(at);
            }
            depth -= 1;
        }
    }
}

/// Precomputed partner index for every loop bound in a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JumpTable {
    // jumps[i] holds the matching index for '[' or ']' at index i.
    jumps: Vec<Option<usize>>,
}

impl JumpTable {
    /// Build the table with a stack of open positions.
    ///
    /// Unmatched bounds are left without an entry; callers validate first,
    /// so a missing entry at a bound surfaces as [`InvariantViolation`].
    pub fn build(code: &[char]) -> Self {
        let mut jumps = vec![None; code.len()];
        let mut stack: Vec<usize> = Vec::new();
        for (i, &c) in code.iter().enumerate() {
            if c == '[' {
                stack.push(i);
            } else if c == ']' {
                if let Some(open) = stack.pop() {
                    jumps[open] = Some(i);
                    jumps[i] = Some(open);
                }
            }
        }
        Self { jumps }
    }

    /// Partner of the bound at `position`.
    pub fn get(&self, position: usize) -> Result<usize, InvariantViolation> {
        self.jumps
            .get(position)
            .copied()
            .flatten()
            .ok_or(InvariantViolation::NotOnBound { ip: position })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn matches_simple_loop_both_ways() {
        let code = chars("+[-]");
        assert_eq!(find_match(&code, 1), Ok(3));
        assert_eq!(find_match(&code, 3), Ok(1));
    }

    #[test]
    fn skips_nested_loops() {
        let code = chars("[[][[]]+]");
        assert_eq!(find_match(&code, 0), Ok(8));
        assert_eq!(find_match(&code, 8), Ok(0));
        assert_eq!(find_match(&code, 3), Ok(6));
        assert_eq!(find_match(&code, 6), Ok(3));
        assert_eq!(find_match(&code, 1), Ok(2));
    }

    #[test]
    fn adjacent_sibling_loops_do_not_leak() {
        let code = chars("[][]");
        assert_eq!(find_match(&code, 1), Ok(0));
        assert_eq!(find_match(&code, 2), Ok(3));
    }

    #[test]
    fn off_bound_position_is_an_invariant_violation() {
        let code = chars("+[-]");
        assert_eq!(find_match(&code, 0), Err(InvariantViolation::NotOnBound { ip: 0 }));
        assert_eq!(find_match(&code, 9), Err(InvariantViolation::NotOnBound { ip: 9 }));
    }

    #[test]
    fn unbalanced_scan_stops_at_the_ends() {
        assert_eq!(find_match(&chars("[+"), 0), Err(InvariantViolation::RanOffEnd { ip: 0 }));
        assert_eq!(find_match(&chars("+]"), 1), Err(InvariantViolation::RanOffEnd { ip: 1 }));
        assert_eq!(find_match(&chars("]"), 0), Err(InvariantViolation::RanOffEnd { ip: 0 }));
    }

    #[test]
    fn table_has_no_entry_off_bounds() {
        let table = JumpTable::build(&chars("+[-]"));
        assert_eq!(table.get(1), Ok(3));
        assert_eq!(table.get(3), Ok(1));
        assert_eq!(table.get(0), Err(InvariantViolation::NotOnBound { ip: 0 }));
        assert_eq!(table.get(42), Err(InvariantViolation::NotOnBound { ip: 42 }));
    }

    #[test]
    fn strategy_parses_case_insensitively() {
        assert_eq!("SCAN".parse::<MatchStrategy>(), Ok(MatchStrategy::Scan));
        assert_eq!(" table ".parse::<MatchStrategy>(), Ok(MatchStrategy::Table));
        assert!("jit".parse::<MatchStrategy>().is_err());
    }
}
