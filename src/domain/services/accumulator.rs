#[cfg(test)]
#[path = "accumulator_test.rs"]
mod tests;

use crate::domain::models::SessionError;

/// Folds the deltas of a single generation into one growing code buffer.
///
/// An accumulator is attached to one generation at a time. Deltas are
/// appended in the order they are pushed, untouched. Once completed, the
/// buffer is final and further deltas are refused until the accumulator is
/// attached to the next generation.
#[derive(Debug)]
pub struct DeltaAccumulator {
    generation: u64,
    buffer: String,
    deltas: usize,
    completed: bool,
}

impl Default for DeltaAccumulator {
    fn default() -> DeltaAccumulator {
        return DeltaAccumulator {
            generation: 0,
            buffer: String::new(),
            deltas: 0,
            completed: true,
        };
    }
}

impl DeltaAccumulator {
    /// Clears the buffer and starts accepting deltas for `generation`. Any
    /// generation previously attached is dropped.
    pub fn attach(&mut self, generation: u64) {
        self.generation = generation;
        self.buffer.clear();
        self.deltas = 0;
        self.completed = false;
    }

    pub fn push(&mut self, delta: &str) -> Result<&str, SessionError> {
        if self.completed {
            return Err(SessionError::StreamCompleted(self.generation));
        }

        self.buffer.push_str(delta);
        self.deltas += 1;

        return Ok(&self.buffer);
    }

    pub fn complete(&mut self) -> Result<&str, SessionError> {
        if self.completed {
            return Err(SessionError::StreamCompleted(self.generation));
        }

        self.completed = true;
        return Ok(&self.buffer);
    }

    /// Puts back the final code of an earlier generation, e.g. after the
    /// generation that replaced it failed.
    pub fn restore(&mut self, generation: u64, code: String) {
        self.generation = generation;
        self.buffer = code;
        self.deltas = 0;
        self.completed = true;
    }

    pub fn code(&self) -> &str {
        return &self.buffer;
    }

    pub fn generation(&self) -> u64 {
        return self.generation;
    }

    pub fn delta_count(&self) -> usize {
        return self.deltas;
    }

    pub fn is_completed(&self) -> bool {
        return self.completed;
    }
}
