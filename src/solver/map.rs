use std::ops::{Index, IndexMut};

use crate::types::{to_var, Lit};

/// Per-variable storage indexed by `Var`, slot 0 unused.
pub type VarMap<T> = Vec<T>;

pub fn var_map<T: Clone + Default>(var_count: usize) -> VarMap<T> {
    vec![Default::default(); var_count + 1]
}

/// Per-literal storage, `lit` and `-lit` are adjacent.
pub struct LitMap<T>(Vec<T>);

impl<T> LitMap<T> {
    fn position(lit: Lit) -> usize {
        2 * to_var(lit) - (lit.is_negative() as usize)
    }
}

impl<T: Clone + Default> LitMap<T> {
    pub fn new(var_count: usize) -> Self {
        Self(vec![Default::default(); 2 * var_count + 1])
    }

    pub fn grow(&mut self, var_count: usize) {
        self.0.resize(2 * var_count + 1, Default::default());
    }
}

impl<T> Index<Lit> for LitMap<T> {
    type Output = T;

    fn index(&self, index: Lit) -> &Self::Output {
        &self.0[LitMap::<T>::position(index)]
    }
}

impl<T> IndexMut<Lit> for LitMap<T> {
    fn index_mut(&mut self, index: Lit) -> &mut Self::Output {
        &mut self.0[LitMap::<T>::position(index)]
    }
}

#[cfg(test)]
mod tests {
    use super::LitMap;

    #[test]
    fn grow_keeps_entries() {
        let mut map = LitMap::<Vec<usize>>::new(2);
        map[-2].push(7);
        map[1].push(3);
        map.grow(5);
        map[-5].push(1);
        assert_eq!(map[-2], vec![7]);
        assert_eq!(map[1], vec![3]);
        assert_eq!(map[-5], vec![1]);
        assert!(map[5].is_empty());
    }
}
