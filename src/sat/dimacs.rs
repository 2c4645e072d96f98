use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use itertools::Itertools;

use super::clause::Triplet;
use super::formula::Formula;
use crate::error::{Error, Result};
use crate::var::{Lit, Var};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Header {
    vars: usize,
    clauses: usize,
}

fn parse_header(line: &str, line_no: usize) -> Result<Header> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() != 4 || parts[0] != "p" || parts[1] != "cnf" {
        return Err(Error::parse(line_no, "expected `p cnf <vars> <clauses>`"));
    }
    let number = |token: &str| {
        token
            .parse::<usize>()
            .map_err(|_| Error::parse(line_no, format!("`{token}` is not a count")))
    };
    Ok(Header {
        vars: number(parts[2])?,
        clauses: number(parts[3])?,
    })
}

fn parse_literal(token: &str, line_no: usize) -> Result<i32> {
    match token.parse::<i32>() {
        // its variable would be 2^31, which has no positive literal
        Ok(i32::MIN) => Err(Error::parse(
            line_no,
            format!("variable in `{token}` is out of range"),
        )),
        Ok(num) => Ok(num),
        Err(_) => Err(Error::parse(line_no, format!("`{token}` is not a literal"))),
    }
}

/// Parses a strict 3-SAT DIMACS text: a `p cnf` header, `c` comment lines,
/// clauses of exactly three literals ended by `0`, and an optional `%` line
/// ending the input.
pub fn parse_formula_from_dimacs_str(lines: &str) -> Result<Formula> {
    let mut header = None;
    let mut formula = Formula::new();
    let mut collector: Vec<i32> = Vec::new();
    let mut clauses = 0;
    let mut max_var = 0;
    let mut last_line = 0;

    for (idx, line) in lines.lines().enumerate() {
        let line_no = idx + 1;
        last_line = line_no;
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with('c') {
            continue;
        }
        if trimmed.starts_with('%') {
            break;
        }
        if trimmed.starts_with('p') {
            if header.is_some() {
                return Err(Error::parse(line_no, "duplicate `p cnf` header"));
            }
            header = Some(parse_header(trimmed, line_no)?);
            continue;
        }
        if header.is_none() {
            return Err(Error::parse(line_no, "clause before `p cnf` header"));
        }

        for token in trimmed.split_whitespace() {
            let num = parse_literal(token, line_no)?;
            if num != 0 {
                collector.push(num);
                continue;
            }
            // End of clause
            if collector.len() != 3 {
                return Err(Error::parse(
                    line_no,
                    format!("expected 3 literals, found {}", collector.len()),
                ));
            }
            if !collector.iter().map(|l| l.unsigned_abs()).all_unique() {
                return Err(Error::parse(line_no, "variable repeated inside a clause"));
            }
            max_var = collector
                .iter()
                .map(|l| l.unsigned_abs() as usize)
                .fold(max_var, usize::max);
            formula.add(&Triplet::from_dimacs([collector[0], collector[1], collector[2]]));
            clauses += 1;
            collector.clear();
        }
    }

    let Some(header) = header else {
        return Err(Error::parse(last_line, "missing `p cnf` header"));
    };
    if !collector.is_empty() {
        return Err(Error::parse(last_line, "clause is missing its `0` terminator"));
    }
    if header.clauses != clauses {
        log::warn!(
            "header declares {} clauses, found {clauses}",
            header.clauses
        );
    }
    if max_var > header.vars {
        log::warn!(
            "header declares {} variables, found variable {max_var}",
            header.vars
        );
    }
    log::debug!(
        "parsed {clauses} clauses over {} variables into {} tiers",
        formula.var_count(),
        formula.tier_count()
    );
    Ok(formula)
}

/// Writes every stored octant as a clause, in tier order.
pub fn formula_to_dimacs_string(formula: &Formula) -> String {
    let max_var = formula.permutation().iter().max().unwrap_or(0);
    let mut out = format!("p cnf {max_var} {}\n", formula.clause_count());
    for tier in formula.tiers() {
        for octant in tier.octants() {
            let clause = Triplet::from_octant(tier.triple(), octant);
            out.push_str(&format!("{clause} 0\n"));
        }
    }
    out
}

pub fn load_from_file(path: impl AsRef<Path>) -> Result<Formula> {
    let text = fs::read_to_string(path)?;
    parse_formula_from_dimacs_str(&text)
}

pub fn save_to_file(formula: &Formula, path: impl AsRef<Path>) -> Result<()> {
    fs::write(path, formula_to_dimacs_string(formula))?;
    Ok(())
}

/// Saves structure `i` to `<prefix>-cts-<i>.cnf` and returns the paths written.
pub fn save_structures(structures: &[Formula], prefix: &str) -> Result<Vec<PathBuf>> {
    structures
        .iter()
        .enumerate()
        .map(|(idx, structure)| {
            let path = PathBuf::from(format!("{prefix}-cts-{idx}.cnf"));
            save_to_file(structure, &path)?;
            log::debug!("saved structure #{idx} to {}", path.display());
            Ok(path)
        })
        .collect()
}

/// Inverse lookup from internal variables to the names used in the input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VarNames {
    original: Vec<i64>,
}

impl VarNames {
    /// Original name of internal variable `var`, or `-1` for variables the
    /// k-SAT reduction introduced.
    pub fn original_var_name(&self, var: u32) -> i64 {
        if var == 0 {
            return -1;
        }
        self.original
            .get(var as usize - 1)
            .copied()
            .unwrap_or(-1)
    }

    pub fn len(&self) -> usize {
        self.original.len()
    }

    pub fn is_empty(&self) -> bool {
        self.original.is_empty()
    }
}

/// A k-SAT input reduced to 3-SAT, with its variables renamed to `1..`.
#[derive(Debug, Clone)]
pub struct GenericInstance {
    pub formula: Formula,
    pub names: VarNames,
}

/// Parses DIMACS with clauses of any width. The header is optional and its
/// counts are not checked. Variables are renamed to `1..=n` in order of first
/// appearance; clauses that are not 3 wide are rewritten with fresh variables
/// numbered after `n`.
pub fn parse_generic_dimacs_str(lines: &str) -> Result<GenericInstance> {
    let mut raw: Vec<(usize, Vec<i32>)> = Vec::new();
    let mut collector: Vec<i32> = Vec::new();
    let mut last_line = 0;

    for (idx, line) in lines.lines().enumerate() {
        let line_no = idx + 1;
        last_line = line_no;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('c') || trimmed.starts_with('p') {
            continue;
        }
        if trimmed.starts_with('%') {
            break;
        }
        for token in trimmed.split_whitespace() {
            let num = parse_literal(token, line_no)?;
            if num == 0 {
                raw.push((line_no, std::mem::take(&mut collector)));
            } else {
                collector.push(num);
            }
        }
    }
    if !collector.is_empty() {
        raw.push((last_line, collector));
    }

    let mut renames: HashMap<u32, u32> = HashMap::new();
    let mut original: Vec<i64> = Vec::new();
    for literal in raw.iter().flat_map(|(_, clause)| clause.iter()) {
        let name = literal.unsigned_abs();
        renames.entry(name).or_insert_with(|| {
            original.push(i64::from(name));
            original.len() as u32
        });
    }

    let mut reducer = Reducer {
        next_var: original.len() as u32 + 1,
        clauses: Vec::new(),
    };
    for (line_no, clause) in raw {
        let lits: Vec<Lit> = clause
            .iter()
            .map(|l| {
                let renamed = renames[&l.unsigned_abs()] as i32;
                let lit = Lit::from_dimacs(renamed).expect("renamed variables start at 1");
                if *l < 0 {
                    lit.negate()
                } else {
                    lit
                }
            })
            .unique()
            .collect();
        if lits.is_empty() {
            return Err(Error::parse(line_no, "empty clause"));
        }
        if lits.iter().any(|l| lits.contains(&l.negate())) {
            log::debug!("dropping tautology on line {line_no}");
            continue;
        }
        reducer.reduce(&lits);
    }

    log::debug!(
        "reduced {} original variables to {} variables and {} clauses",
        original.len(),
        reducer.next_var - 1,
        reducer.clauses.len()
    );
    Ok(GenericInstance {
        formula: Formula::from_clauses(&reducer.clauses),
        names: VarNames { original },
    })
}

struct Reducer {
    next_var: u32,
    clauses: Vec<Triplet>,
}

impl Reducer {
    fn fresh(&mut self) -> Lit {
        let var = Var::new(self.next_var);
        self.next_var += 1;
        Lit::pos(var)
    }

    fn reduce(&mut self, lits: &[Lit]) {
        match lits {
            [l] => {
                let (y, z) = (self.fresh(), self.fresh());
                let (ny, nz) = (y.negate(), z.negate());
                for (a, b) in [(y, z), (y, nz), (ny, z), (ny, nz)] {
                    self.clauses.push(Triplet::new([*l, a, b]));
                }
            }
            [l1, l2] => {
                let y = self.fresh();
                self.clauses.push(Triplet::new([*l1, *l2, y]));
                self.clauses.push(Triplet::new([*l1, *l2, y.negate()]));
            }
            [l1, l2, l3] => self.clauses.push(Triplet::new([*l1, *l2, *l3])),
            [l1, l2, rest @ ..] => {
                // (l1 l2 y1) (-y1 l3 y2) ... (-yk l_{n-1} l_n)
                let mut link = self.fresh();
                self.clauses.push(Triplet::new([*l1, *l2, link]));
                let (last_two, middle) = (&rest[rest.len() - 2..], &rest[..rest.len() - 2]);
                for lit in middle {
                    let next = self.fresh();
                    self.clauses.push(Triplet::new([link.negate(), *lit, next]));
                    link = next;
                }
                self.clauses
                    .push(Triplet::new([link.negate(), last_two[0], last_two[1]]));
            }
            [] => unreachable!("empty clauses are rejected before reduction"),
        }
    }
}


#[cfg(test)]
mod dimacs_laws {
    use proptest::prelude::*;

    use super::{formula_to_dimacs_string, parse_formula_from_dimacs_str};
    use crate::sat::clause::Triplet;
    use crate::sat::formula::Formula;
    use crate::var::{Lit, Var};

    // Clauses over a small pool of arbitrary, non-contiguous names.
    fn sparse_clauses() -> impl Strategy<Value = Vec<Triplet>> {
        proptest::collection::btree_set(1u32..=i32::MAX as u32, 3..10).prop_flat_map(|pool| {
            let pool: Vec<u32> = pool.into_iter().collect();
            let clause = (
                proptest::sample::subsequence(pool, 3).prop_shuffle(),
                any::<[bool; 3]>(),
            )
                .prop_map(|(names, signs)| {
                    let mut lits = [Lit::pos(Var::new(names[0])); 3];
                    for ((slot, name), negated) in lits.iter_mut().zip(names).zip(signs) {
                        let var = Var::new(name);
                        *slot = if negated { Lit::neg(var) } else { Lit::pos(var) };
                    }
                    Triplet::new(lits)
                });
            proptest::collection::vec(clause, 1..25)
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn dimacs_text_restores_formula(clauses in sparse_clauses()) {
            let formula = Formula::from_clauses(&clauses);
            let text = formula_to_dimacs_string(&formula);
            let parsed = parse_formula_from_dimacs_str(&text).unwrap();
            prop_assert_eq!(parsed.var_count(), formula.var_count());
            prop_assert_eq!(parsed.clause_count(), formula.clause_count());
            prop_assert_eq!(parsed, formula);
        }
    }
}
