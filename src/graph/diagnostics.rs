use log::{log, Level};

/// Default number of occurrences logged before further ones are counted silently.
pub const DEFAULT_WARN_LIMIT: usize = 10;

/// Per-run record of data problems encountered while traversing the
/// element graph.
///
/// One instance is created per conflation run and passed down the
/// call chain, so that concurrent runs in the same process never share
/// counters.
#[derive(Clone, Debug)]
pub struct Diagnostics {
    warn_limit: usize,
    circular_references: usize,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Diagnostics::new(DEFAULT_WARN_LIMIT)
    }
}

impl Diagnostics {
    pub fn new(warn_limit: usize) -> Self {
        Self {
            warn_limit,
            circular_references: 0,
        }
    }

    /// Records a circular reference to `relation`, logging at `level`
    /// until the warning limit is reached.
    pub fn circular_reference(&mut self, relation: i64, level: Level) {
        if self.circular_references < self.warn_limit {
            log!(
                level,
                "Invalid data. Relation {relation} contains a circular reference."
            );
        } else if self.circular_references == self.warn_limit {
            log!(
                level,
                "Relation: reached the limit of {} circular reference messages, further occurrences are not logged.",
                self.warn_limit
            );
        }

        self.circular_references += 1;
    }

    /// Total circular references seen, including those not logged.
    pub fn circular_references(&self) -> usize {
        self.circular_references
    }

    pub fn warn_limit(&self) -> usize {
        self.warn_limit
    }
}
