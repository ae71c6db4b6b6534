use crate::{is_sorted_by, num_multisets, num_tuples, Error, Face, Trial, WideTable};
use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};
use std::{
    collections::{hash_map::Entry, HashMap},
    fmt, iter,
};
use tabular::{Row, Table};

////////////////
// FaceCounts //
////////////////

/// How many dice showed each face, per roll.
///
/// One row per roll (1-based) and one column per face value observed anywhere
/// in the trial, in sorted face order. Faces that didn't show up in a roll get
/// a count of `0`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceCounts {
    faces: Vec<Face>,
    nrolls: usize,
    /// row-major, `nrolls x faces.len()`
    counts: Vec<usize>,
}

impl FaceCounts {
    /// The column labels: every distinct face observed in the trial.
    #[inline]
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    #[inline]
    pub fn nrolls(&self) -> usize {
        self.nrolls
    }

    /// The counts of every face on roll `roll` (1-based), in [`faces`](Self::faces)
    /// order.
    pub fn row(&self, roll: usize) -> Option<&[usize]> {
        if roll == 0 || roll > self.nrolls {
            return None;
        }
        let nfaces = self.faces.len();
        let start = (roll - 1) * nfaces;
        Some(&self.counts[start..start + nfaces])
    }

    /// How many dice showed `face` on roll `roll`. `None` if the roll is out of
    /// range or the face never showed up in the trial at all.
    pub fn count(&self, roll: usize, face: &Face) -> Option<usize> {
        let face_idx = self.faces.binary_search(face).ok()?;
        self.row(roll).map(|row| row[face_idx])
    }

    /// Returns an `Iterator` of `(roll: usize, counts: &[usize])` tuples.
    pub fn rows(&self) -> impl Iterator<Item = (usize, &[usize])> + '_ {
        (1..=self.nrolls).filter_map(move |roll| self.row(roll).map(|row| (roll, row)))
    }
}

impl fmt::Display for FaceCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let spec = iter::once("{:>}")
            .chain(iter::repeat("  {:>}").take(self.faces.len()))
            .collect::<String>();

        let heading = self
            .faces
            .iter()
            .fold(Row::new().with_cell("roll"), |row, face| row.with_cell(face));

        let mut table = Table::new(&spec).with_row(heading);
        for (roll, counts) in self.rows() {
            table.add_row(
                counts
                    .iter()
                    .fold(Row::new().with_cell(roll), |row, count| row.with_cell(count)),
            );
        }

        write!(f, "{}", table)
    }
}

///////////////////
// OutcomeCounts //
///////////////////

/// Observed vs. theoretical outcome counts for a trial.
///
/// Each row is a distinct outcome key (a combination or permutation of faces)
/// and the number of rolls that produced it. Observed keys come first, in the
/// order they were first seen, followed by every key in the theoretical
/// outcome space that was never observed, with a count of `0`. No key appears
/// twice.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    rows: Vec<(Vec<Face>, usize)>,
    /// `rows[..nobserved]` are the observed keys
    nobserved: usize,
}

impl OutcomeCounts {
    /// Tally the `observed` keys, then append each key from `theoretical`
    /// that wasn't observed with a count of `0`.
    fn from_observed_and_theoretical(
        observed: impl IntoIterator<Item = Vec<Face>>,
        theoretical: impl IntoIterator<Item = Vec<Face>>,
    ) -> Self {
        let mut key_idxs = HashMap::<Vec<Face>, usize>::new();
        let mut rows = Vec::<(Vec<Face>, usize)>::new();

        for key in observed {
            match key_idxs.entry(key) {
                Entry::Occupied(entry) => rows[*entry.get()].1 += 1,
                Entry::Vacant(entry) => {
                    rows.push((entry.key().clone(), 1));
                    entry.insert(rows.len() - 1);
                }
            }
        }

        let nobserved = rows.len();

        rows.extend(
            theoretical
                .into_iter()
                .filter(|key| !key_idxs.contains_key(key))
                .map(|key| (key, 0)),
        );

        Self { rows, nobserved }
    }

    /// Every `(key, count)` row, observed keys first.
    #[inline]
    pub fn rows(&self) -> &[(Vec<Face>, usize)] {
        &self.rows
    }

    /// The rows with a count of at least one.
    #[inline]
    pub fn observed(&self) -> &[(Vec<Face>, usize)] {
        &self.rows[..self.nobserved]
    }

    /// The theoretically possible keys that were never observed.
    #[inline]
    pub fn unobserved(&self) -> impl Iterator<Item = &[Face]> + '_ {
        self.rows[self.nobserved..].iter().map(|(key, _)| key.as_slice())
    }

    /// How many times `key` was observed. `None` if `key` isn't in the table.
    pub fn count(&self, key: &[Face]) -> Option<usize> {
        self.rows
            .iter()
            .find(|(k, _)| k.as_slice() == key)
            .map(|(_, count)| *count)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The sum of all counts, i.e., the number of rolls tallied.
    pub fn total(&self) -> usize {
        self.observed().iter().map(|(_, count)| count).sum()
    }
}

impl fmt::Display for OutcomeCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut table =
            Table::new("{:<}  {:>}").with_row(Row::new().with_cell("outcome").with_cell("count"));

        for (key, count) in &self.rows {
            table.add_row(
                Row::new()
                    .with_cell(format!("({})", key.iter().join(", ")))
                    .with_cell(count),
            );
        }

        write!(f, "{}", table)
    }
}

//////////////
// Analyzer //
//////////////

/// Computes descriptive statistics over a [`Trial`]'s latest result.
///
/// Every method reads the trial's result at call time and returns a freshly
/// computed answer; nothing is cached. All of them fail with
/// [`Error::IllegalState`] if the trial hasn't been played yet.
#[derive(Copy, Clone, Debug)]
pub struct Analyzer<'a> {
    trial: &'a Trial,
}

impl<'a> Analyzer<'a> {
    pub fn new(trial: &'a Trial) -> Self {
        Self { trial }
    }

    #[inline]
    fn result(&self) -> Result<&'a WideTable, Error> {
        self.trial.wide()
    }

    /// The number of rolls where every die showed the same face.
    pub fn jackpot_count(&self) -> Result<usize, Error> {
        let result = self.result()?;
        let jackpots = result
            .rows()
            .filter(|(_, outcomes)| !outcomes.is_empty() && outcomes.iter().all_equal())
            .count();
        Ok(jackpots)
    }

    /// How many dice showed each face, for every roll.
    pub fn face_counts_per_roll(&self) -> Result<FaceCounts, Error> {
        let narrow = self.trial.narrow()?;
        let nrolls = self.result()?.nrolls();

        let faces = narrow
            .rows()
            .iter()
            .map(|row| &row.outcome)
            .sorted()
            .dedup()
            .cloned()
            .collect::<Vec<_>>();
        let nfaces = faces.len();

        let mut counts = vec![0_usize; nrolls * nfaces];
        for row in narrow.rows() {
            // every outcome is in `faces` by construction
            if let Ok(face_idx) = faces.binary_search(&row.outcome) {
                counts[(row.roll - 1) * nfaces + face_idx] += 1;
            }
        }

        Ok(FaceCounts {
            faces,
            nrolls,
            counts,
        })
    }

    /// Order-independent outcome counts: how many rolls produced each multiset
    /// of faces, plus every other multiset of the observed faces (count `0`).
    ///
    /// Keys are sorted in [`Face`] order.
    pub fn combination_count(&self) -> Result<OutcomeCounts, Error> {
        let result = self.result()?;
        let faces = distinct_faces(result);
        let ndice = result.ndice();

        debug!(
            "combination_count -> nfaces: {}, ndice: {ndice}, |space|: {:?}",
            faces.len(),
            num_multisets(faces.len() as u64, ndice as u64),
        );

        let observed = result
            .rows()
            .map(|(_, outcomes)| outcomes.iter().cloned().sorted().collect::<Vec<_>>());

        let counts = time!("combination_count", {
            OutcomeCounts::from_observed_and_theoretical(
                observed,
                all_combinations(&faces, ndice),
            )
        });

        debug_assert!(counts
            .rows()
            .iter()
            .all(|(key, _)| is_sorted_by(key.iter(), |a, b| Some(a.cmp(b)))));
        debug_assert_eq!(
            num_multisets(faces.len() as u64, ndice as u64),
            Some(counts.len() as u64)
        );

        Ok(counts)
    }

    /// Order-dependent outcome counts: how many rolls produced each tuple of
    /// faces in die order, plus every other tuple of the observed faces
    /// (count `0`).
    pub fn permutation_count(&self) -> Result<OutcomeCounts, Error> {
        let result = self.result()?;
        let faces = distinct_faces(result);
        let ndice = result.ndice();

        debug!(
            "permutation_count -> nfaces: {}, ndice: {ndice}, |space|: {:?}",
            faces.len(),
            num_tuples(faces.len() as u64, ndice as u64),
        );

        let observed = result.rows().map(|(_, outcomes)| outcomes.to_vec());

        let counts = time!("permutation_count", {
            OutcomeCounts::from_observed_and_theoretical(observed, all_permutations(&faces, ndice))
        });

        debug_assert_eq!(
            num_tuples(faces.len() as u64, ndice as u64),
            Some(counts.len() as u64)
        );

        Ok(counts)
    }
}

/// Every distinct face in the table, sorted.
fn distinct_faces(result: &WideTable) -> Vec<Face> {
    result
        .rows()
        .flat_map(|(_, outcomes)| outcomes.iter())
        .sorted()
        .dedup()
        .cloned()
        .collect()
}

/// All size-`k` combinations with replacement of the sorted `faces`, each in
/// sorted order.
fn all_combinations(faces: &[Face], k: usize) -> Box<dyn Iterator<Item = Vec<Face>> + '_> {
    if k == 0 {
        Box::new(iter::once(Vec::new()))
    } else {
        Box::new(faces.iter().cloned().combinations_with_replacement(k))
    }
}

/// The `k`-fold Cartesian product of `faces`.
fn all_permutations(faces: &[Face], k: usize) -> Box<dyn Iterator<Item = Vec<Face>> + '_> {
    if k == 0 {
        Box::new(iter::once(Vec::new()))
    } else {
        Box::new(
            iter::repeat(faces.iter().cloned())
                .take(k)
                .multi_cartesian_product(),
        )
    }
}

///////////
// Tests //
///////////
