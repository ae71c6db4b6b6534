use crate::{Error, Face, WeightedDie};
use claim::debug_assert_lt;
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use tabular::{Row, Table};

///////////
// Shape //
///////////

/// How a trial's result table is laid out.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    /// One row per roll, one column per die.
    #[default]
    Wide,
    /// One row per (roll, die) pair, with the outcome in its own column.
    Narrow,
}

impl FromStr for Shape {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wide" => Ok(Self::Wide),
            "narrow" => Ok(Self::Narrow),
            _ => Err(Error::invalid_argument(format!(
                "unrecognized result shape '{s}', must be 'wide' or 'narrow'"
            ))),
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wide => f.write_str("wide"),
            Self::Narrow => f.write_str("narrow"),
        }
    }
}

///////////////
// WideTable //
///////////////

/// The outcome of a roll batch: one row per roll, one column per die.
///
/// Rolls are numbered from `1`, dice from `0` (their position in the trial).
/// Cells are stored row-major.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WideTable {
    nrolls: usize,
    ndice: usize,
    cells: Vec<Face>,
}

impl WideTable {
    /// Assemble a table from one column of `nrolls` outcomes per die.
    fn from_columns(nrolls: usize, columns: Vec<Vec<Face>>) -> Self {
        let ndice = columns.len();
        debug_assert!(columns.iter().all(|column| column.len() == nrolls));

        let mut columns = columns
            .into_iter()
            .map(|column| column.into_iter())
            .collect::<Vec<_>>();

        let mut cells = Vec::with_capacity(nrolls * ndice);
        for _ in 0..nrolls {
            for column in columns.iter_mut() {
                cells.extend(column.next());
            }
        }
        debug_assert_eq!(nrolls * ndice, cells.len());

        Self {
            nrolls,
            ndice,
            cells,
        }
    }

    #[inline]
    pub fn nrolls(&self) -> usize {
        self.nrolls
    }

    #[inline]
    pub fn ndice(&self) -> usize {
        self.ndice
    }

    /// The outcomes of roll `roll` (1-based), in die order.
    pub fn row(&self, roll: usize) -> Option<&[Face]> {
        if roll == 0 || roll > self.nrolls {
            return None;
        }
        let start = (roll - 1) * self.ndice;
        Some(&self.cells[start..start + self.ndice])
    }

    /// The outcome of die `die` (0-based) on roll `roll` (1-based).
    pub fn get(&self, roll: usize, die: usize) -> Option<&Face> {
        if die >= self.ndice {
            return None;
        }
        self.row(roll).map(|row| &row[die])
    }

    /// Returns an `Iterator` of `(roll: usize, outcomes: &[Face])` tuples, in
    /// roll order.
    pub fn rows(&self) -> impl Iterator<Item = (usize, &[Face])> + ExactSizeIterator + '_ {
        (0..self.nrolls).map(move |idx| {
            let start = idx * self.ndice;
            (idx + 1, &self.cells[start..start + self.ndice])
        })
    }

    /// Every outcome of die `die` (0-based), in roll order.
    pub fn column(&self, die: usize) -> impl Iterator<Item = &Face> + '_ {
        debug_assert_lt!(die, self.ndice);
        self.cells.iter().skip(die).step_by(self.ndice.max(1))
    }

    /// Reshape into one row per (roll, die) pair, ordered by roll then die.
    pub fn to_narrow(&self) -> NarrowTable {
        let rows = self
            .rows()
            .flat_map(|(roll, outcomes)| {
                outcomes.iter().enumerate().map(move |(die, outcome)| NarrowRow {
                    roll,
                    die,
                    outcome: outcome.clone(),
                })
            })
            .collect::<Vec<_>>();
        debug_assert_eq!(self.nrolls * self.ndice, rows.len());
        NarrowTable { rows }
    }
}

impl fmt::Display for WideTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let spec = std::iter::once("{:>}")
            .chain(std::iter::repeat("  {:<}").take(self.ndice))
            .collect::<String>();

        let mut heading = Row::new().with_cell("roll");
        for die in 0..self.ndice {
            heading = heading.with_cell(die);
        }

        let mut table = Table::new(&spec).with_row(heading);
        for (roll, outcomes) in self.rows() {
            let row = outcomes
                .iter()
                .fold(Row::new().with_cell(roll), |row, outcome| {
                    row.with_cell(outcome)
                });
            table.add_row(row);
        }

        write!(f, "{}", table)
    }
}

/////////////////
// NarrowTable //
/////////////////

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrowRow {
    /// 1-based roll index
    pub roll: usize,
    /// 0-based die index
    pub die: usize,
    pub outcome: Face,
}

/// A roll batch's outcome, one row per (roll, die) pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrowTable {
    rows: Vec<NarrowRow>,
}

impl NarrowTable {
    #[inline]
    pub fn rows(&self) -> &[NarrowRow] {
        &self.rows
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl fmt::Display for NarrowTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut table = Table::new("{:>}  {:>}  {:<}").with_row(
            Row::new()
                .with_cell("roll")
                .with_cell("die")
                .with_cell("outcome"),
        );
        for NarrowRow { roll, die, outcome } in &self.rows {
            table.add_row(Row::new().with_cell(roll).with_cell(die).with_cell(outcome));
        }
        write!(f, "{}", table)
    }
}

/////////////////
// TrialResult //
/////////////////

/// A trial's last result, in the requested [`Shape`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TrialResult<'a> {
    Wide(&'a WideTable),
    Narrow(NarrowTable),
}

impl fmt::Display for TrialResult<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wide(table) => fmt::Display::fmt(table, f),
            Self::Narrow(table) => fmt::Display::fmt(table, f),
        }
    }
}

///////////
// Trial //
///////////

/// A set of "similar" dice that get rolled together in batches.
///
/// Similar dice share the same faces but may have different weights. This
/// isn't checked; mismatched dice just produce columns with different faces.
#[derive(Clone, Debug)]
pub struct Trial {
    dice: Vec<WeightedDie>,
    last_result: Option<WideTable>,
}

impl Trial {
    pub fn new(dice: Vec<WeightedDie>) -> Self {
        Self {
            dice,
            last_result: None,
        }
    }

    #[inline]
    pub fn dice(&self) -> &[WeightedDie] {
        &self.dice
    }

    #[inline]
    pub fn ndice(&self) -> usize {
        self.dice.len()
    }

    /// `true` once at least one roll batch has been played.
    #[inline]
    pub fn has_result(&self) -> bool {
        self.last_result.is_some()
    }

    /// Roll every die `count` times, replacing the previous result.
    ///
    /// # Errors
    /// * [`Error::InvalidArgument`] if `count` is zero.
    /// * [`Error::IllegalState`] if any die can't be rolled. The previous
    ///   result is kept.
    pub fn play_rolls<R: Rng + ?Sized>(&mut self, rng: &mut R, count: usize) -> Result<(), Error> {
        if count == 0 {
            return Err(Error::invalid_argument(
                "the number of rolls must be a positive integer",
            ));
        }

        let columns = self
            .dice
            .iter()
            .map(|die| die.roll(rng, count))
            .collect::<Result<Vec<_>, _>>()?;

        self.last_result = Some(WideTable::from_columns(count, columns));

        debug!("play_rolls -> nrolls: {count}, ndice: {}", self.ndice());
        Ok(())
    }

    /// The most recent roll batch, one row per roll and one column per die.
    ///
    /// # Errors
    /// [`Error::IllegalState`] if no rolls have been played yet.
    pub fn wide(&self) -> Result<&WideTable, Error> {
        self.last_result.as_ref().ok_or_else(|| {
            Error::illegal_state("no result yet, the trial must be played before reading it")
        })
    }

    /// The most recent roll batch, one row per (roll, die) pair.
    ///
    /// # Errors
    /// [`Error::IllegalState`] if no rolls have been played yet.
    pub fn narrow(&self) -> Result<NarrowTable, Error> {
        self.wide().map(WideTable::to_narrow)
    }

    /// The most recent roll batch, in the requested shape.
    pub fn result(&self, shape: Shape) -> Result<TrialResult<'_>, Error> {
        match shape {
            Shape::Wide => self.wide().map(TrialResult::Wide),
            Shape::Narrow => self.narrow().map(TrialResult::Narrow),
        }
    }
}

#[cfg(test)]
impl Trial {
    /// A trial without dice whose last result is exactly `rows`.
    pub(crate) fn with_rows(rows: &[Vec<Face>]) -> Self {
        let ndice = rows.first().map(Vec::len).unwrap_or(0);
        let columns = (0..ndice)
            .map(|die| rows.iter().map(|row| row[die].clone()).collect::<Vec<_>>())
            .collect::<Vec<_>>();
        Self {
            dice: Vec::new(),
            last_result: Some(WideTable::from_columns(rows.len(), columns)),
        }
    }
}


///////////
// Tests //
///////////
