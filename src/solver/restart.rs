/// Luby sequence scaled by `base`, see https://oeis.org/A182105.
struct Luby {
    base: usize,
    uv: (isize, isize),
}

impl Iterator for Luby {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        let (u, v) = self.uv;
        // Knuth's reluctant doubling
        self.uv = if u & -u == v { (u + 1, 1) } else { (u, 2 * v) };
        Some(self.base * v as usize)
    }
}

/// Counts conflicts against the current Luby interval.
pub struct Restarts {
    luby: Luby,
    limit: usize,
    conflicts: usize,
    total: usize,
}

impl Restarts {
    pub fn new(base: usize) -> Self {
        let mut luby = Luby {
            base: base.max(1),
            uv: (1, 1),
        };
        let limit = luby.next().unwrap_or(1);
        Self {
            luby,
            limit,
            conflicts: 0,
            total: 0,
        }
    }

    pub fn conflict(&mut self) {
        self.conflicts += 1;
        self.total += 1;
    }

    /// Returns `true` once the interval is used up and moves to the next one.
    pub fn due(&mut self) -> bool {
        if self.conflicts < self.limit {
            return false;
        }
        self.conflicts = 0;
        self.limit = self.luby.next().unwrap_or(self.limit);
        true
    }

    pub fn total_conflicts(&self) -> usize {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::{Luby, Restarts};

    #[test]
    fn sequence() {
        let expected = vec![1, 1, 2, 1, 1, 2, 4, 1, 1, 2, 1, 1, 2, 4, 8, 1, 1, 2, 1, 1];
        let luby = Luby {
            base: 1,
            uv: (1, 1),
        };
        let actual: Vec<usize> = luby.take(20).collect();
        assert_eq!(expected, actual);
    }

    #[test]
    fn intervals() {
        let mut restarts = Restarts::new(2);
        let mut due_after = vec![];
        let mut since = 0;
        for _ in 0..20 {
            restarts.conflict();
            since += 1;
            if restarts.due() {
                due_after.push(since);
                since = 0;
            }
        }
        assert_eq!(due_after, vec![2, 2, 4, 2, 2, 4]);
        assert_eq!(restarts.total_conflicts(), 20);
    }
}
