use crate::Error;
use claim::debug_assert_ge;
use log::trace;
#[cfg(test)]
use proptest::{
    arbitrary::Arbitrary,
    strategy::{BoxedStrategy, Strategy},
};
use rand::{
    distributions::{Distribution, Open01},
    Rng,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, convert::Infallible, fmt, str::FromStr};

//////////
// Face //
//////////

/// One distinct labeled outcome of a die, either a number or some text.
///
/// Faces are totally ordered: all `Int` faces sort before all `Text` faces,
/// ints compare numerically and text compares lexicographically. This is the
/// order combinations are canonicalized in.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Face {
    Int(i64),
    Text(String),
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Anything that parses as an integer is an `Int` face, everything else is
/// taken verbatim as `Text`.
impl FromStr for Face {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.parse::<i64>() {
            Ok(x) => Self::Int(x),
            Err(_) => Self::Text(s.to_owned()),
        })
    }
}

impl From<i64> for Face {
    #[inline]
    fn from(x: i64) -> Self {
        Self::Int(x)
    }
}

impl From<i32> for Face {
    #[inline]
    fn from(x: i32) -> Self {
        Self::Int(x as i64)
    }
}

impl From<&str> for Face {
    #[inline]
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for Face {
    #[inline]
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

#[cfg(test)]
impl Arbitrary for Face {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        proptest::prop_oneof![
            (-3_i64..=9).prop_map(Face::Int),
            "[a-f]{1,2}".prop_map(Face::Text),
        ]
        .boxed()
    }
}

///////////////
// FaceDistr //
///////////////

/// A die's face distribution, as a cumulative distribution function (CDF)
/// over face indices, for more efficient sampling.
#[derive(Clone, Debug)]
struct FaceDistr {
    cdf: Vec<f64>,
    /// The last face with positive weight. Rounding can leave `cdf.last()`
    /// just shy of 1.0; samples past it land here.
    last_positive: usize,
}

impl FaceDistr {
    fn from_weights(weights: &[f64]) -> Result<Self, Error> {
        let total: f64 = weights.iter().sum();
        if !(total.is_finite() && total > 0.0) {
            return Err(Error::illegal_state(format!(
                "die weights must sum to a positive, finite number to roll: sum: {total}"
            )));
        }

        let cdf = weights
            .iter()
            .scan(0.0, |acc, &w| {
                *acc += w;
                Some(*acc / total)
            })
            .collect::<Vec<_>>();

        // since total > 0.0, at least one weight is positive
        let last_positive = weights.iter().rposition(|&w| w > 0.0).unwrap_or(0);

        Ok(Self { cdf, last_positive })
    }

    #[inline]
    fn p_face(&self, idx: usize) -> f64 {
        if idx == 0 {
            self.cdf[0]
        } else {
            self.cdf[idx] - self.cdf[idx - 1]
        }
    }

    /// convert a standard sample r ∈ (0, 1) to a face index, according to this
    /// CDF.
    #[inline]
    fn sample_to_face_idx(&self, r: f64) -> usize {
        // not a binary search; negative weights can make the CDF non-monotonic.
        self.cdf
            .iter()
            .position(|&c| r <= c)
            .unwrap_or(self.last_positive)
    }
}

impl Distribution<usize> for FaceDistr {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        // sample r ∈ (0, 1)
        let r = Open01.sample(rng);
        self.sample_to_face_idx(r)
    }
}

/////////////////
// WeightedDie //
/////////////////

/// A die with a fixed, ordered set of distinct faces and a mutable weight per
/// face.
///
/// A face's weight is its relative probability of being rolled. Weights start
/// at `1.0` (a fair die) and may be set to any number, including zero or
/// negative values; a die whose weights don't sum to a positive total can't be
/// rolled.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightedDie {
    faces: Vec<Face>,
    weights: Vec<f64>,
}

impl WeightedDie {
    /// Create a fair die from an ordered collection of distinct faces.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] if `faces` is empty or two faces share the
    /// same label.
    pub fn new<I>(faces: I) -> Result<Self, Error>
    where
        I: IntoIterator,
        I::Item: Into<Face>,
    {
        let faces = faces.into_iter().map(Into::into).collect::<Vec<Face>>();

        if faces.is_empty() {
            return Err(Error::invalid_argument("a die must have at least one face"));
        }

        // faces are compared by label, so `1` and `"1"` are the same face
        let mut seen = HashSet::with_capacity(faces.len());
        if let Some(dup) = faces.iter().find(|&face| !seen.insert(face.to_string())) {
            return Err(Error::invalid_argument(format!(
                "all faces on a die must be distinct: repeated face: '{dup}'"
            )));
        }

        let weights = vec![1.0; faces.len()];
        Ok(Self { faces, weights })
    }

    #[inline]
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// The number of faces on this die.
    #[inline]
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    /// Always `false`; a die has at least one face.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    fn face_idx(&self, face: &Face) -> Option<usize> {
        self.faces.iter().position(|f| f == face)
    }

    pub fn weight(&self, face: &Face) -> Option<f64> {
        self.face_idx(face).map(|idx| self.weights[idx])
    }

    /// Change the weight of a single face.
    ///
    /// # Errors
    /// * [`Error::NotFound`] if `face` isn't on this die.
    /// * [`Error::InvalidArgument`] if `weight` is NaN.
    pub fn set_weight(&mut self, face: &Face, weight: f64) -> Result<(), Error> {
        let idx = self
            .face_idx(face)
            .ok_or_else(|| Error::not_found(format!("face '{face}' is not on this die")))?;

        if weight.is_nan() {
            return Err(Error::invalid_argument(format!(
                "the weight for face '{face}' must be numeric"
            )));
        }

        self.weights[idx] = weight;
        Ok(())
    }

    /// Like [`set_weight`](Self::set_weight), but parses the new weight from
    /// text first.
    ///
    /// # Errors
    /// Same as [`set_weight`](Self::set_weight); text that isn't a number is
    /// an [`Error::InvalidArgument`].
    pub fn set_weight_str(&mut self, face: &Face, weight: &str) -> Result<(), Error> {
        if self.face_idx(face).is_none() {
            return Err(Error::not_found(format!("face '{face}' is not on this die")));
        }

        let weight = weight.trim().parse::<f64>().map_err(|err| {
            Error::invalid_argument(format!(
                "the weight for face '{face}' must be numeric: '{weight}': {err}"
            ))
        })?;

        self.set_weight(face, weight)
    }

    fn distr(&self) -> Result<FaceDistr, Error> {
        FaceDistr::from_weights(&self.weights)
    }

    /// Roll the die `count` times with replacement, returning the faces in
    /// draw order.
    ///
    /// # Errors
    /// [`Error::IllegalState`] if the weights don't sum to a positive, finite
    /// number.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R, count: usize) -> Result<Vec<Face>, Error> {
        let distr = self.distr()?;

        let rolls = (0..count)
            .map(|_| self.faces[distr.sample(rng)].clone())
            .collect::<Vec<_>>();

        trace!("roll -> count: {count}, rolls: {rolls:?}");
        Ok(rolls)
    }

    /// Roll the die a single time.
    pub fn roll_once<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Face, Error> {
        let distr = self.distr()?;
        Ok(self.faces[distr.sample(rng)].clone())
    }

    /// The die's current state: every face and its weight, in face order.
    pub fn current_state(&self) -> impl ExactSizeIterator<Item = (&Face, f64)> + '_ {
        self.faces.iter().zip(self.weights.iter().copied())
    }

    /// Every face and its probability of being rolled, in face order.
    ///
    /// # Errors
    /// [`Error::IllegalState`] if the die can't be rolled.
    pub fn probabilities(&self) -> Result<Vec<(&Face, f64)>, Error> {
        let distr = self.distr()?;
        let probs = self
            .faces
            .iter()
            .enumerate()
            .map(|(idx, face)| (face, distr.p_face(idx)))
            .collect::<Vec<_>>();
        debug_assert_ge!(probs.len(), 1);
        Ok(probs)
    }
}


///////////
// Tests //
///////////
