//! Fixed-size rolling history of per-period drop counts.

use crate::HISTORY_LEN;

/// Ring buffer of the last `N` drop counts.
///
/// The slot under the cursor is always the oldest sample, which is the one the
/// next [`record`](Self::record) overwrites. Slots start at zero, so until the
/// buffer has wrapped once the total only covers the periods seen so far.
///
/// # Example
/// ```
/// use rain_gauge_lib::history::RollingHistory;
///
/// let mut history = RollingHistory::<3>::new();
/// for drops in [5, 7, 2, 9] {
///     history.record(drops);
/// }
///
/// assert_eq!(history.oldest_to_newest(), vec![7, 2, 9]);
/// assert_eq!(history.total(), 18);
/// ```
#[derive(Clone, Debug)]
pub struct RollingHistory<const N: usize> {
    slots: [u64; N],
    cursor: usize,
}

/// One hour of minute-by-minute drop counts.
pub type DropHistory = RollingHistory<HISTORY_LEN>;

impl<const N: usize> RollingHistory<N> {
    pub fn new() -> Self {
        assert!(N > 0, "history needs at least one slot");
        Self {
            slots: [0; N],
            cursor: 0,
        }
    }

    pub fn record(&mut self, drops: u64) {
        self.slots[self.cursor] = drops;
        self.cursor = (self.cursor + 1) % N;
    }

    /// Index of the slot the next `record` writes to
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// All `N` slots starting at the cursor and wrapping forward, so the most
    /// recent sample comes last.
    pub fn oldest_to_newest(&self) -> Vec<u64> {
        let (newer, older) = self.slots.split_at(self.cursor);
        older.iter().chain(newer).copied().collect()
    }

    /// Sum of every slot
    pub fn total(&self) -> u64 {
        self.slots.iter().sum()
    }

    /// Space-separated rendering of [`oldest_to_newest`](Self::oldest_to_newest)
    pub fn render(&self) -> String {
        self.oldest_to_newest()
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl<const N: usize> Default for RollingHistory<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wraps_once() {
        let mut history = RollingHistory::<3>::new();
        for drops in [5, 7, 2, 9] {
            history.record(drops);
        }

        assert_eq!(history.cursor(), 1);
        assert_eq!(history.oldest_to_newest(), vec![7, 2, 9]);
        assert_eq!(history.total(), 18);
        assert_eq!(history.render(), "7 2 9");
    }

    #[test]
    fn test_partially_filled_keeps_zero_slots_first() {
        let mut history = RollingHistory::<4>::new();
        history.record(3);
        history.record(1);

        assert_eq!(history.cursor(), 2);
        assert_eq!(history.oldest_to_newest(), vec![0, 0, 3, 1]);
        assert_eq!(history.total(), 4);
    }

    #[test]
    fn test_full_cycle_returns_cursor_to_start() {
        let mut history = RollingHistory::<3>::new();
        for drops in [1, 2, 3] {
            history.record(drops);
        }

        assert_eq!(history.cursor(), 0);
        assert_eq!(history.oldest_to_newest(), vec![1, 2, 3]);
    }

    #[test]
    fn test_default_history_is_one_hour_of_zeros() {
        let history = DropHistory::new();
        let rendered = history.oldest_to_newest();
        assert_eq!(rendered.len(), 60);
        assert!(rendered.iter().all(|&d| d == 0));
        assert_eq!(history.total(), 0);
    }
}
