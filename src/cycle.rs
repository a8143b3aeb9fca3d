//! Grouping of catalog records into model reinitialization cycles.

use {
    crate::{
        catalog::{CycleBoundary, RawTimestepRecord},
        error::{RestackError, Result},
    },
    log::debug,
};

/// Contiguous run of records produced by one reinitialization of the model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cycle<'a> {
    /// Position of the first record in the full catalog
    pub start: usize,
    pub records: &'a [RawTimestepRecord],
}

impl<'a> Cycle<'a> {
    pub fn contains_year(&self, year: i32) -> bool {
        self.records.iter().any(|r| r.year == year)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Splits chronologically sorted records into cycles.
///
/// A new cycle opens at, and includes, every record tagged as a cycle start. Records
/// before the first cycle start form a (possibly short) leading cycle of their own.
pub fn group(records: &[RawTimestepRecord]) -> Vec<Cycle> {
    let mut cycles = vec![];
    let mut start = 0;

    for (i, record) in records.iter().enumerate() {
        if i > start && record.boundary == CycleBoundary::CycleStart {
            cycles.push(Cycle {
                start,
                records: &records[start..i],
            });
            start = i;
        }
    }

    if start < records.len() {
        cycles.push(Cycle {
            start,
            records: &records[start..],
        });
    }

    cycles
}

/// Indices of the cycles needed to restack `year` of an accumulation variable.
///
/// These are the cycles holding records of `year` plus the cycle immediately before and
/// after them, where such a cycle exists. At the first (last) year of the archive there is
/// nothing to borrow from before (after), so the window is only extended the other way.
pub fn window(cycles: &[Cycle], year: i32) -> Result<Vec<usize>> {
    let matched = cycles
        .iter()
        .enumerate()
        .filter(|(_, c)| c.contains_year(year))
        .map(|(i, _)| i)
        .collect::<Vec<usize>>();

    let (first, last) = match (matched.first(), matched.last()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => return Err(RestackError::YearNotInCatalog { year }),
    };

    if matched.windows(2).any(|w| w[1] != w[0] + 1) {
        return Err(RestackError::NonContiguousCycles {
            year,
            indices: matched,
        });
    }

    let lower = first.saturating_sub(1);
    let upper = (last + 1).min(cycles.len() - 1);

    debug!(
        "{}: cycles {}..={} overlap the year, restacking {}..={}",
        year, first, last, lower, upper
    );

    Ok((lower..=upper).collect())
}

/// Rows of the concatenated records of `cycles` whose timestamp falls in `year`
pub fn year_rows(cycles: &[Cycle], year: i32) -> Vec<usize> {
    cycles
        .iter()
        .flat_map(|c| c.records.iter())
        .enumerate()
        .filter(|(_, r)| r.year == year)
        .map(|(i, _)| i)
        .collect()
}
