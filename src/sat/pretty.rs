//! Diagnostic rendering of formulas.

use std::fmt;

use super::formula::Formula;
use crate::config::PrettyOptions;

/// `a, b, ..., z, aa, ab, ...` for names `1, 2, ...`
fn letter_name(mut name: u32) -> String {
    let mut letters = Vec::new();
    while name > 0 {
        name -= 1;
        letters.push(char::from(b'a' + (name % 26) as u8));
        name /= 26;
    }
    letters.iter().rev().collect()
}

fn var_name(name: u32, options: &PrettyOptions) -> String {
    if options.universal_names {
        format!("x{name}")
    } else {
        letter_name(name)
    }
}

fn summary(formula: &Formula) -> String {
    format!(
        "VarCount: {}; ClausesCount: {}; TiersCount: {}",
        formula.var_count(),
        formula.clause_count(),
        formula.tier_count()
    )
}

/// Renders a summary line and, with `options.grid`, one row per octant
/// aligned under the permutation.
pub fn render(formula: &Formula, options: &PrettyOptions) -> String {
    let mut out = summary(formula);
    out.push('\n');
    if !options.grid {
        return out;
    }

    let names: Vec<String> = formula
        .permutation()
        .iter()
        .map(|name| var_name(name, options))
        .collect();
    let width = names.iter().map(String::len).max().unwrap_or(1);
    for name in names.iter() {
        out.push_str(&format!("{name:>width$} "));
    }
    out.push('\n');

    for tier in formula.tiers() {
        for octant in tier.octants() {
            let mut row = vec!["."; formula.var_count()];
            for (pos, name) in tier.triple().names().into_iter().enumerate() {
                if let Some(idx) = formula.permutation().index_of(name) {
                    row[idx] = if octant.value_at(pos) { "1" } else { "0" };
                }
            }
            for cell in row {
                out.push_str(&format!("{cell:>width$} "));
            }
            out.push('\n');
        }
    }
    out
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", summary(self))
    }
}
