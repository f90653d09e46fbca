use slotmap::new_key_type;

new_key_type! {
    /// Identifies a module name in a [`ModuleGraph`](crate::graph::ModuleGraph).
    ///
    /// Every name mentioned by the graph gets an id, including undeclared
    /// destinations that only act as sinks.
    pub struct ModuleId;
}

/// One-based index of a push. Push 0 means "nothing has run yet".
pub type PushIndex = u64;

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn module_ids_are_distinct() {
        let mut names = SlotMap::<ModuleId, &str>::with_key();
        let a = names.insert("a");
        let b = names.insert("b");
        assert_ne!(a, b);
        assert_eq!(names[a], "a");
    }

    #[test]
    fn module_ids_are_ordered_by_insertion() {
        let mut names = SlotMap::<ModuleId, ()>::with_key();
        let first = names.insert(());
        let second = names.insert(());
        assert!(first < second);
    }
}
