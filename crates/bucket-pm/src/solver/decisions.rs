use super::pool::PackageId;
use super::rule::Literal;

/// Tracks decisions made during SAT solving.
///
/// Each decision records:
/// - Whether a package is installed (+) or not installed (-)
/// - At what decision level it was decided
/// - Which rule caused the decision, if any
///
/// The decision map is a flat Vec indexed by PackageId:
/// 0 = undecided, +N = installed at level N, -N = not installed at level N.
/// The queue is the trail of decisions in the order they were made.
#[derive(Debug, Default)]
pub struct Decisions {
    decision_map: Vec<i32>,

    /// Trail of (literal, rule id)
    decision_queue: Vec<(Literal, Option<u32>)>,
}

impl Decisions {
    /// Create a tracker able to hold ids up to `max_package_id` without growing
    pub fn with_capacity(max_package_id: usize) -> Self {
        Self {
            decision_map: vec![0; max_package_id + 1],
            decision_queue: Vec::with_capacity(max_package_id),
        }
    }

    #[inline]
    fn value(&self, package_id: PackageId) -> i32 {
        self.decision_map
            .get(package_id.unsigned_abs() as usize)
            .copied()
            .unwrap_or(0)
    }

    /// Records `literal` at `level`.
    ///
    /// # Panics
    ///
    /// Deciding a package twice is a solver bug and panics.
    pub fn decide(&mut self, literal: Literal, level: i32, rule_id: Option<u32>) {
        let id = literal.unsigned_abs() as usize;
        let previous = self.value(literal);
        if previous != 0 {
            panic!(
                "solver bug: trying to decide {} on level {}, even though {} was previously decided as {}",
                literal, level, id, previous
            );
        }

        if id >= self.decision_map.len() {
            self.decision_map.resize(id + 1, 0);
        }
        self.decision_map[id] = if literal > 0 { level } else { -level };
        self.decision_queue.push((literal, rule_id));

        log::trace!("Decided {} on level {}", literal, level);
    }

    /// The literal is true under the current decisions
    #[inline]
    pub fn satisfy(&self, literal: Literal) -> bool {
        let value = self.value(literal);
        (literal > 0 && value > 0) || (literal < 0 && value < 0)
    }

    /// The literal is false under the current decisions
    #[inline]
    pub fn conflict(&self, literal: Literal) -> bool {
        let value = self.value(literal);
        (literal > 0 && value < 0) || (literal < 0 && value > 0)
    }

    #[inline]
    pub fn decided(&self, literal_or_id: i32) -> bool {
        self.value(literal_or_id) != 0
    }

    #[inline]
    pub fn undecided(&self, literal_or_id: i32) -> bool {
        self.value(literal_or_id) == 0
    }

    #[inline]
    pub fn decided_install(&self, literal_or_id: i32) -> bool {
        self.value(literal_or_id) > 0
    }

    /// Level the package was decided on; 0 when undecided
    #[inline]
    pub fn decision_level(&self, literal_or_id: i32) -> i32 {
        self.value(literal_or_id).abs()
    }

    /// Rule that caused the decision about this package
    pub fn decision_rule(&self, literal_or_id: i32) -> Option<u32> {
        let id = literal_or_id.abs();
        self.decision_queue
            .iter()
            .find(|(literal, _)| literal.abs() == id)
            .and_then(|(_, rule_id)| *rule_id)
    }

    pub fn at_offset(&self, offset: usize) -> (Literal, Option<u32>) {
        self.decision_queue[offset]
    }

    pub fn valid_offset(&self, offset: usize) -> bool {
        offset < self.decision_queue.len()
    }

    pub fn last_reason(&self) -> Option<u32> {
        self.decision_queue.last().and_then(|(_, rule_id)| *rule_id)
    }

    pub fn last_literal(&self) -> Option<Literal> {
        self.decision_queue.last().map(|(literal, _)| *literal)
    }

    pub fn len(&self) -> usize {
        self.decision_queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decision_queue.is_empty()
    }

    pub fn reset(&mut self) {
        while self.revert_last().is_some() {}
    }

    /// Undoes everything decided after the entry at `offset`
    pub fn reset_to_offset(&mut self, offset: usize) {
        while self.decision_queue.len() > offset + 1 {
            self.revert_last();
        }
    }

    /// Undoes the newest decision and returns it
    pub fn revert_last(&mut self) -> Option<(Literal, Option<u32>)> {
        let decision = self.decision_queue.pop()?;
        if let Some(value) = self.decision_map.get_mut(decision.0.unsigned_abs() as usize) {
            *value = 0;
        }
        Some(decision)
    }

    /// The trail, newest decision first
    pub fn iter(&self) -> impl Iterator<Item = &(Literal, Option<u32>)> {
        self.decision_queue.iter().rev()
    }
}
