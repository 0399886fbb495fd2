use std::collections::VecDeque;

/// Strict FIFO work queue used for load dispatch.
///
/// Key properties:
/// - Items pop in insertion order. There is no priority.
/// - Once closed, the queue rejects pushes instead of accepting work that
///   would never run.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkId(pub u64);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct QueueClosed;

impl std::fmt::Display for QueueClosed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "work queue is closed")
    }
}

impl std::error::Error for QueueClosed {}

#[derive(Debug)]
pub struct WorkQueue<T> {
    next_id: u64,
    items: VecDeque<(WorkId, T)>,
    closed: bool,
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            items: VecDeque::new(),
            closed: false,
        }
    }
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn push(&mut self, payload: T) -> Result<WorkId, QueueClosed> {
        if self.closed {
            return Err(QueueClosed);
        }
        let id = WorkId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.items.push_back((id, payload));
        Ok(id)
    }

    /// Pops the oldest item.
    pub fn pop_next(&mut self) -> Option<(WorkId, T)> {
        self.items.pop_front()
    }

    /// Closes the queue and hands back whatever was still waiting, oldest first.
    pub fn close(&mut self) -> Vec<T> {
        self.closed = true;
        self.items.drain(..).map(|(_, payload)| payload).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{QueueClosed, WorkId, WorkQueue};

    #[test]
    fn pops_in_insertion_order() {
        let mut q = WorkQueue::new();
        q.push("a").unwrap();
        q.push("b").unwrap();
        q.push("c").unwrap();

        let (_, a) = q.pop_next().unwrap();
        let (_, b) = q.pop_next().unwrap();
        let (_, c) = q.pop_next().unwrap();
        assert_eq!((a, b, c), ("a", "b", "c"));
        assert!(q.pop_next().is_none());
    }

    #[test]
    fn ids_are_monotonic() {
        let mut q = WorkQueue::new();
        assert_eq!(q.push(1).unwrap(), WorkId(0));
        assert_eq!(q.push(2).unwrap(), WorkId(1));
    }

    #[test]
    fn closed_queue_rejects_pushes_and_returns_leftovers() {
        let mut q = WorkQueue::new();
        q.push("a").unwrap();
        q.push("b").unwrap();

        assert_eq!(q.close(), vec!["a", "b"]);
        assert!(q.is_closed());
        assert!(q.is_empty());
        assert_eq!(q.push("c"), Err(QueueClosed));
    }
}
