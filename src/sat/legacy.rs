//! Legacy binary exchange format.
//!
//! Each formula is written as a run of clauses, three little-endian `i32`
//! literals per clause, followed by a `0, 0, 0` record. Formulas are
//! concatenated with no length prefix.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use itertools::Itertools;

use super::clause::Triplet;
use super::formula::Formula;
use crate::error::{Error, Result};

const RECORD: usize = 12;

pub fn write_legacy_binary<W: Write>(formulas: &[Formula], mut writer: W) -> Result<()> {
    for formula in formulas {
        for tier in formula.tiers() {
            for octant in tier.octants() {
                let clause = Triplet::from_octant(tier.triple(), octant);
                for literal in clause.to_dimacs() {
                    let literal = i32::try_from(literal)
                        .ok()
                        .filter(|l| *l != i32::MIN)
                        .ok_or(Error::LiteralOutOfRange(literal))?;
                    writer.write_all(&literal.to_le_bytes())?;
                }
            }
        }
        writer.write_all(&[0; RECORD])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn export_legacy_binary(formulas: &[Formula], path: impl AsRef<Path>) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    write_legacy_binary(formulas, writer)
}

pub fn read_legacy_binary<R: Read>(mut reader: R) -> Result<Vec<Formula>> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    if bytes.len() % RECORD != 0 {
        return Err(Error::parse(bytes.len() / RECORD + 1, "truncated legacy record"));
    }

    let mut formulas = Vec::new();
    let mut current = Formula::new();
    let mut open = false;
    for (idx, record) in bytes.chunks_exact(RECORD).enumerate() {
        let mut literals = [0i32; 3];
        for (slot, chunk) in literals.iter_mut().zip(record.chunks_exact(4)) {
            *slot = i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        if literals == [0, 0, 0] {
            formulas.push(std::mem::take(&mut current));
            open = false;
            continue;
        }
        if literals.contains(&0)
            || literals.contains(&i32::MIN)
            || !literals.iter().map(|l| l.unsigned_abs()).all_unique() {
            return Err(Error::parse(idx + 1, format!("invalid clause {literals:?}")));
        }
        current.add(&Triplet::from_dimacs(literals));
        open = true;
    }
    if open {
        return Err(Error::parse(
            bytes.len() / RECORD,
            "formula is missing its terminator record",
        ));
    }
    Ok(formulas)
}

pub fn import_legacy_binary(path: impl AsRef<Path>) -> Result<Vec<Formula>> {
    read_legacy_binary(BufReader::new(File::open(path)?))
}
