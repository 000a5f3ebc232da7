use crate::flow::ActivePositions;

/// Result of moving forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Moved(usize),
    /// No active position follows; the survey is ready to submit.
    EndOfFlow,
}

/// Current catalog position; only ever moves across active positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    position: usize,
}

impl Cursor {
    pub fn at(position: usize) -> Self {
        Self { position }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn advance(&mut self, active: &ActivePositions) -> Advance {
        match active.next_after(self.position) {
            Some(next) => {
                self.position = next;
                Advance::Moved(next)
            }
            None => Advance::EndOfFlow,
        }
    }

    /// Moves to the previous active position; stays put at the first one.
    pub fn retreat(&mut self, active: &ActivePositions) -> usize {
        if let Some(previous) = active.previous_before(self.position) {
            self.position = previous;
        }
        self.position
    }

    /// Moves onto an active position if the current one left the flow.
    pub fn snap(&mut self, active: &ActivePositions) {
        if active.contains(self.position) {
            return;
        }
        self.position = active
            .next_after(self.position)
            .or_else(|| active.previous_before(self.position))
            .or_else(|| active.first())
            .unwrap_or(0);
    }

    /// `(ordinal, total)` of the cursor within the active positions.
    pub fn progress(&self, active: &ActivePositions) -> (usize, usize) {
        let ordinal = active
            .ordinal_of(self.position)
            .unwrap_or_else(|| active.iter().filter(|&p| p < self.position).count() + 1);
        (ordinal, active.len())
    }
}
