//! Disjoint-set union over `0..size` with union by rank and path compression.

/// Disjoint-set forest over the integers `0..size`.
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u32>,
}

impl UnionFind {
    pub fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Representative of the component containing `x`.
    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        // compress the path walked above
        let mut current = x;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }

    /// Merges the components of `x` and `y`.
    ///
    /// The root of higher rank becomes the parent. On equal ranks the root of
    /// `y` becomes the parent and its rank grows by one.
    pub fn union(&mut self, x: usize, y: usize) {
        let a = self.find(x);
        let b = self.find(y);
        if a == b {
            return;
        }
        if self.rank[a] > self.rank[b] {
            self.parent[b] = a;
        } else if self.rank[a] < self.rank[b] {
            self.parent[a] = b;
        } else {
            self.parent[a] = b;
            self.rank[b] += 1;
        }
    }

    pub fn same(&mut self, x: usize, y: usize) -> bool {
        self.find(x) == self.find(y)
    }
}
