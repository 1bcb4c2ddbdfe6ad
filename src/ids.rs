// Identifier generation for newly recorded visits

use rand::Rng;

/// Source of generated note identifiers.
///
/// The production draw is random, so anything that needs reproducible
/// output (tests, fixtures) swaps in a deterministic implementation.
pub trait IdSource: Send + std::fmt::Debug {
    /// Next note id, six decimal digits as stored on disk.
    fn next_note_id(&mut self) -> String;
}

/// Random six-digit ids, matching the historical file contents.
#[derive(Debug, Default)]
pub struct RandomIds;

impl IdSource for RandomIds {
    fn next_note_id(&mut self) -> String {
        rand::thread_rng().gen_range(100_000..=999_999).to_string()
    }
}

/// Monotonic ids counting up from a starting value.
#[derive(Debug)]
pub struct SequentialIds(pub u32);

impl IdSource for SequentialIds {
    fn next_note_id(&mut self) -> String {
        self.0 += 1;
        format!("{:06}", self.0)
    }
}

/// Visit ids are positional within their patient: `V` plus the
/// zero-padded sequence number of the new visit.
pub fn visit_sequence_id(existing_visits: usize) -> String {
    format!("V{:03}", existing_visits + 1)
}
