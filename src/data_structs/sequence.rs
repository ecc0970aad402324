use arcstr::ArcStr;

use crate::data_structs::typedef::ValueType;

/// Ordered container of probe measurements, the basic unit every operation
/// in this crate works on.
///
/// A sequence is a list of `(name, value)` pairs. The names are optional as
/// a whole: a sequence built purely from unnamed pushes keeps an empty name
/// vector, while the first named push starts it. Names are shared immutable
/// strings, so the identical probe identifiers of a cohort of tracks point
/// at the same allocations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sequence {
    names:  Vec<ArcStr>,
    values: Vec<ValueType>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Sequence {
            names:  Vec::new(),
            values: Vec::with_capacity(capacity),
        }
    }

    pub fn from_values(values: Vec<ValueType>) -> Self {
        Sequence {
            names: Vec::new(),
            values,
        }
    }

    /// Appends one probe. An absent name on a named sequence appends an
    /// empty placeholder so the two vectors stay in step; an absent name on
    /// an unnamed sequence appends nothing to the name vector.
    pub fn push(
        &mut self,
        name: Option<ArcStr>,
        value: ValueType,
    ) {
        if let Some(name) = name {
            self.names.push(name);
        }
        else if !self.names.is_empty() {
            self.names.push(ArcStr::new());
        }
        self.values.push(value);
    }

    pub fn push_value(
        &mut self,
        value: ValueType,
    ) {
        self.push(None, value);
    }

    pub fn names(&self) -> &[ArcStr] {
        &self.names
    }

    pub fn values(&self) -> &[ValueType] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_named(&self) -> bool {
        !self.names.is_empty()
    }

    /// Name of the probe at `index`, with empty placeholders reported as
    /// absent.
    pub fn name_at(
        &self,
        index: usize,
    ) -> Option<&ArcStr> {
        self.names.get(index).filter(|name| !name.is_empty())
    }

    pub fn iter(&self) -> SequenceIter<'_> {
        SequenceIter {
            sequence: self,
            index:    0,
        }
    }
}

impl FromIterator<(ArcStr, ValueType)> for Sequence {
    fn from_iter<T: IntoIterator<Item = (ArcStr, ValueType)>>(iter: T) -> Self {
        let mut sequence = Sequence::new();
        for (name, value) in iter {
            sequence.push(Some(name), value);
        }
        sequence
    }
}

pub struct SequenceIter<'a> {
    sequence: &'a Sequence,
    index:    usize,
}

impl<'a> Iterator for SequenceIter<'a> {
    type Item = (Option<&'a ArcStr>, ValueType);

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.sequence.len() {
            return None;
        }
        let item = (
            self.sequence.name_at(self.index),
            self.sequence.values[self.index],
        );
        self.index += 1;
        Some(item)
    }
}

/// Finds the nearest position at which two name slices share an identifier.
///
/// Offsets grow together, and at each radius the cross pairs are checked
/// before the diagonal, so the match minimizing the larger of the two
/// offsets wins and the first sequence is preferred on ties. Once the
/// shorter slice is exhausted the remainder of the longer one is scanned
/// against the whole shorter one. Returns the pair of offsets to advance by,
/// `(0, 0)` when nothing matches.
fn find_match_offsets(
    left: &[ArcStr],
    right: &[ArcStr],
) -> (usize, usize) {
    let common = left.len().min(right.len());
    for off1 in 0..common {
        for off2 in 0..off1 {
            if left[off1] == right[off2] {
                return (off1, off2);
            }
            else if left[off2] == right[off1] {
                return (off2, off1);
            }
        }
        if left[off1] == right[off1] {
            return (off1, off1);
        }
    }

    for off1 in common..left.len() {
        for off2 in 0..right.len() {
            if left[off1] == right[off2] {
                return (off1, off2);
            }
        }
    }
    for off1 in common..right.len() {
        for off2 in 0..left.len() {
            if left[off2] == right[off1] {
                return (off2, off1);
            }
        }
    }
    (0, 0)
}

/// Advances a value cursor by the distance its name cursor just moved,
/// saturating at the end of the value vector.
fn advance_clamped(
    cursor: usize,
    moved: usize,
    len: usize,
) -> usize {
    if moved > len - cursor {
        len
    }
    else {
        cursor + moved
    }
}

/// Walks two sequences at once, pairing up probes that share a name.
///
/// When both sequences are named, each step searches forward for the nearest
/// shared identifier; rows without a counterpart are skipped on the side
/// that ran ahead. When either sequence is unnamed, or no shared identifier
/// can be found, the cursors fall back to moving in lockstep. Iteration ends
/// as soon as either side runs out of values.
pub struct PairedIter<'a> {
    first:      &'a Sequence,
    second:     &'a Sequence,
    name_idx1:  usize,
    name_idx2:  usize,
    value_idx1: usize,
    value_idx2: usize,
}

impl<'a> PairedIter<'a> {
    pub fn new(
        first: &'a Sequence,
        second: &'a Sequence,
    ) -> Self {
        let mut iter = PairedIter {
            first,
            second,
            name_idx1: 0,
            name_idx2: 0,
            value_idx1: 0,
            value_idx2: 0,
        };
        iter.find_match();
        iter
    }

    fn is_valid(&self) -> bool {
        self.value_idx1 < self.first.values.len()
            && self.value_idx2 < self.second.values.len()
    }

    fn find_match(&mut self) {
        let (moved1, moved2) = find_match_offsets(
            &self.first.names[self.name_idx1..],
            &self.second.names[self.name_idx2..],
        );
        self.name_idx1 += moved1;
        self.name_idx2 += moved2;
        self.value_idx1 =
            advance_clamped(self.value_idx1, moved1, self.first.values.len());
        self.value_idx2 =
            advance_clamped(self.value_idx2, moved2, self.second.values.len());
    }

    fn advance(&mut self) {
        if self.name_idx1 < self.first.names.len() {
            self.name_idx1 += 1;
        }
        if self.value_idx1 < self.first.values.len() {
            self.value_idx1 += 1;
        }
        if self.name_idx2 < self.second.names.len() {
            self.name_idx2 += 1;
        }
        if self.value_idx2 < self.second.values.len() {
            self.value_idx2 += 1;
        }
        self.find_match();
    }

    fn name(&self) -> Option<&'a ArcStr> {
        self.first.name_at(self.name_idx1)
    }
}

impl<'a> Iterator for PairedIter<'a> {
    type Item = (Option<&'a ArcStr>, ValueType, ValueType);

    fn next(&mut self) -> Option<Self::Item> {
        if !self.is_valid() {
            return None;
        }
        let item = (
            self.name(),
            self.first.values[self.value_idx1],
            self.second.values[self.value_idx2],
        );
        self.advance();
        Some(item)
    }
}

/// Walks any number of sequences at once.
///
/// Each step matches the sequences pairwise around a ring (every sequence
/// against its successor, even pairs first, then odd pairs) and repeats the
/// sweep until no cursor moves, so one full row of mutually matching probes
/// is lined up before it is yielded. Iteration ends as soon as any member
/// runs out of values.
pub struct MultiIter<'a> {
    sequences:  Vec<&'a Sequence>,
    name_idx:   Vec<usize>,
    value_idx:  Vec<usize>,
}

impl<'a> MultiIter<'a> {
    pub fn new(sequences: &[&'a Sequence]) -> Self {
        let mut iter = MultiIter {
            sequences:  sequences.to_vec(),
            name_idx:   vec![0; sequences.len()],
            value_idx:  vec![0; sequences.len()],
        };
        iter.find_match();
        iter
    }

    pub fn is_valid(&self) -> bool {
        if self.sequences.is_empty() {
            return false;
        }
        self.sequences
            .iter()
            .zip(&self.value_idx)
            .all(|(sequence, &cursor)| cursor < sequence.values.len())
    }

    /// Value of member `index` in the current row, 0 once that member is
    /// exhausted.
    pub fn value(
        &self,
        index: usize,
    ) -> ValueType {
        match self.sequences.get(index) {
            Some(sequence) => {
                match sequence.values.get(self.value_idx[index]) {
                    Some(&value) => value,
                    None => 0.0,
                }
            },
            None => 0.0,
        }
    }

    /// Name of the current row, taken from the first member.
    pub fn name(&self) -> Option<&'a ArcStr> {
        self.sequences
            .first()
            .and_then(|sequence| sequence.name_at(self.name_idx[0]))
    }

    pub fn advance(&mut self) {
        for (index, sequence) in self.sequences.iter().enumerate() {
            if self.name_idx[index] < sequence.names.len() {
                self.name_idx[index] += 1;
            }
            if self.value_idx[index] < sequence.values.len() {
                self.value_idx[index] += 1;
            }
        }
        self.find_match();
    }

    fn match_pair(
        &mut self,
        index: usize,
    ) -> bool {
        let partner = (index + 1) % self.sequences.len();
        if partner == index {
            return false;
        }
        let (moved1, moved2) = find_match_offsets(
            &self.sequences[index].names[self.name_idx[index]..],
            &self.sequences[partner].names[self.name_idx[partner]..],
        );
        self.name_idx[index] += moved1;
        self.name_idx[partner] += moved2;
        moved1 > 0 || moved2 > 0
    }

    fn find_match(&mut self) {
        let previous = self.name_idx.clone();

        let mut again = true;
        while again {
            again = false;
            for index in (0..self.sequences.len()).step_by(2) {
                if self.match_pair(index) {
                    again = true;
                }
            }
            for index in (1..self.sequences.len()).step_by(2) {
                if self.match_pair(index) {
                    again = true;
                }
            }
        }

        for index in 0..self.sequences.len() {
            let moved = self.name_idx[index] - previous[index];
            self.value_idx[index] = advance_clamped(
                self.value_idx[index],
                moved,
                self.sequences[index].values.len(),
            );
        }
    }
}

/// Materializes the rows of a [`MultiIter`] into one sequence per member,
/// all carrying the first member's names.
pub fn align(sequences: &[&Sequence]) -> Vec<Sequence> {
    let mut out = vec![Sequence::new(); sequences.len()];
    let mut iter = MultiIter::new(sequences);
    while iter.is_valid() {
        let name = iter.name().cloned();
        for (index, sequence) in out.iter_mut().enumerate() {
            sequence.push(name.clone(), iter.value(index));
        }
        iter.advance();
    }
    out
}
