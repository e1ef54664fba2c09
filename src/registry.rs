use crate::{
    error::HandleError,
    solver::{Interrupt, Solver},
};

/// Opaque reference to a registry slot. A handle outlives its value only
/// as a stale handle: once the slot is freed or reused, lookups fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    pub fn index(self) -> u32 {
        self.index
    }
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Owned table of values addressed by generation-checked handles.
pub struct Registry<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            slots: vec![],
            free: vec![],
        }
    }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, value: T) -> Handle {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return Handle {
                index,
                generation: slot.generation,
            };
        }

        let index = u32::try_from(self.slots.len()).expect("registry exceeds u32 slots");
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        Handle {
            index,
            generation: 0,
        }
    }

    fn slot(&self, handle: Handle) -> Result<&Slot<T>, HandleError> {
        let slot = self
            .slots
            .get(handle.index as usize)
            .ok_or(HandleError::Unknown(handle.index))?;
        if slot.generation != handle.generation || slot.value.is_none() {
            return Err(HandleError::Stale(handle.index));
        }
        Ok(slot)
    }

    pub fn get(&self, handle: Handle) -> Result<&T, HandleError> {
        self.slot(handle)?
            .value
            .as_ref()
            .ok_or(HandleError::Stale(handle.index))
    }

    pub fn get_mut(&mut self, handle: Handle) -> Result<&mut T, HandleError> {
        self.slot(handle)?;
        self.slots[handle.index as usize]
            .value
            .as_mut()
            .ok_or(HandleError::Stale(handle.index))
    }

    /// Frees the slot; every copy of `handle` becomes stale.
    pub fn remove(&mut self, handle: Handle) -> Result<T, HandleError> {
        self.slot(handle)?;
        let slot = &mut self.slots[handle.index as usize];
        let value = slot.value.take().ok_or(HandleError::Stale(handle.index))?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            let value = slot.value.as_ref()?;
            let handle = Handle {
                index: index as u32,
                generation: slot.generation,
            };
            Some((handle, value))
        })
    }
}

impl Registry<Solver> {
    /// Stop flag of a registered solver; raising it makes its running or
    /// next `solve` return `Unknown`.
    pub fn interrupt(&self, handle: Handle) -> Result<Interrupt, HandleError> {
        self.get(handle).map(Solver::interrupt)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        error::HandleError,
        solver::Solver,
        types::Solution,
    };

    use super::Registry;

    #[test]
    fn stale_after_reuse() {
        let mut registry = Registry::new();
        let a = registry.insert("a");
        let b = registry.insert("b");
        assert_eq!(registry.len(), 2);

        assert_eq!(registry.remove(a), Ok("a"));
        assert_eq!(registry.get(a), Err(HandleError::Stale(a.index())));
        assert_eq!(registry.remove(a), Err(HandleError::Stale(a.index())));

        let c = registry.insert("c");
        assert_eq!(c.index(), a.index());
        assert_ne!(c, a);
        assert_eq!(registry.get(a), Err(HandleError::Stale(a.index())));
        assert_eq!(registry.get(c), Ok(&"c"));

        *registry.get_mut(b).unwrap() = "B";
        let values: Vec<&str> = registry.iter().map(|(_, &value)| value).collect();
        assert_eq!(values, vec!["c", "B"]);
    }

    #[test]
    fn unknown_index() {
        let mut first = Registry::new();
        let mut second: Registry<u8> = Registry::new();
        first.insert(1u8);
        let handle = first.insert(2u8);
        second.insert(3);
        assert_eq!(second.get(handle), Err(HandleError::Unknown(1)));
    }

    #[test]
    fn terminate_solver() {
        let mut registry = Registry::new();
        let mut solver = Solver::default();
        solver.add_clause(&[1, 2]);
        let handle = registry.insert(solver);

        registry.interrupt(handle).unwrap().raise();
        let solver = registry.get_mut(handle).unwrap();
        assert_eq!(solver.solve(), Solution::Unknown);

        registry.remove(handle).unwrap();
        assert!(registry.interrupt(handle).is_err());
        assert!(registry.is_empty());
    }
}
