//! Decrease-key binary min-heap for the frontier.
//!
//! Entries are identified by their grid index, which stays stable across
//! operations so a relaxation can reposition an already-queued cell. Ties on
//! time break on a monotonically increasing insertion sequence, giving a
//! reproducible total order independent of memory layout.

#[derive(Debug, Clone, Copy)]
struct QueueKey {
    time: f64,
    seq: u64,
}

impl QueueKey {
    fn less_than(&self, other: &QueueKey) -> bool {
        match self.time.total_cmp(&other.time) {
            std::cmp::Ordering::Less => true,
            std::cmp::Ordering::Greater => false,
            std::cmp::Ordering::Equal => self.seq < other.seq,
        }
    }
}

const NOT_QUEUED: usize = usize::MAX;

#[derive(Debug)]
pub struct FrontierQueue {
    /// Heap-ordered node indices.
    heap: Vec<usize>,
    /// node index -> slot in `heap`, NOT_QUEUED when absent.
    pos: Vec<usize>,
    /// node index -> current key. Only meaningful while queued.
    keys: Vec<QueueKey>,
    next_seq: u64,
}

impl FrontierQueue {
    /// A queue able to hold any of `capacity` node indices.
    pub fn new(capacity: usize) -> Self {
        Self {
            heap: Vec::with_capacity(capacity),
            pos: vec![NOT_QUEUED; capacity],
            keys: vec![
                QueueKey {
                    time: f64::INFINITY,
                    seq: 0,
                };
                capacity
            ],
            next_seq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn contains(&self, node: usize) -> bool {
        self.pos[node] != NOT_QUEUED
    }

    /// O(log n). `node` must not already be queued.
    pub fn insert(&mut self, node: usize, time: f64) {
        assert!(!self.contains(node), "node {node} inserted twice");
        self.keys[node] = QueueKey {
            time,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        let slot = self.heap.len();
        self.heap.push(node);
        self.pos[node] = slot;
        self.sift_up(slot);
    }

    /// Remove and return the node with the smallest (time, sequence) key.
    /// O(log n).
    pub fn extract_min(&mut self) -> Option<(usize, f64)> {
        let min = *self.heap.first()?;
        let last = self.heap.pop().expect("non-empty heap");
        if !self.heap.is_empty() {
            self.heap[0] = last;
            self.pos[last] = 0;
            self.sift_down(0);
        }
        self.pos[min] = NOT_QUEUED;
        Some((min, self.keys[min].time))
    }

    /// Lower `node`'s time and restore heap order. O(log n).
    ///
    /// The new time must be strictly smaller than the queued time; anything
    /// else is a caller bug and trips the assertion. The insertion sequence
    /// is retained so the tie order stays deterministic.
    pub fn decrease_key(&mut self, node: usize, time: f64) {
        let slot = self.pos[node];
        assert!(slot != NOT_QUEUED, "decrease_key on node {node} not in queue");
        assert!(
            time < self.keys[node].time,
            "decrease_key requires a strictly smaller key ({} >= {})",
            time,
            self.keys[node].time
        );
        self.keys[node].time = time;
        self.sift_up(slot);
    }

    fn sift_up(&mut self, mut slot: usize) {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if !self.key_less(self.heap[slot], self.heap[parent]) {
                break;
            }
            self.swap_slots(slot, parent);
            slot = parent;
        }
    }

    fn sift_down(&mut self, mut slot: usize) {
        loop {
            let left = 2 * slot + 1;
            if left >= self.heap.len() {
                break;
            }
            let right = left + 1;
            let mut smallest = left;
            if right < self.heap.len() && self.key_less(self.heap[right], self.heap[left]) {
                smallest = right;
            }
            if !self.key_less(self.heap[smallest], self.heap[slot]) {
                break;
            }
            self.swap_slots(slot, smallest);
            slot = smallest;
        }
    }

    fn key_less(&self, a: usize, b: usize) -> bool {
        self.keys[a].less_than(&self.keys[b])
    }

    fn swap_slots(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.pos[self.heap[a]] = a;
        self.pos[self.heap[b]] = b;
    }
}
