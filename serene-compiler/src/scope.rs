// Lexical scopes and the accessor discipline
//
// INVARIANT: at most one logical owner may mutate a value. Move invalidates
// the source binding; Mutate requires a binding that is itself mutable.

use std::collections::HashMap;

use crate::ast::Accessor;
use crate::error::CompileError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// `var` (mutable) or `const` (immutable) local.
    Variable { mutable: bool },
    /// Function parameter, with the accessor it was declared with.
    Parameter(Accessor),
    /// Loop variable: an immutable integer for ranges, a shared reference
    /// when iterating a collection.
    LoopItem { borrowed: bool },
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub kind: BindingKind,
    pub moved: bool,
    /// Loop nesting at the point of declaration.
    loop_depth: usize,
}

impl Binding {
    /// The Rust binding holds a `&T` / `&mut T` rather than a `T`.
    pub fn reference(&self) -> Option<Accessor> {
        match self.kind {
            BindingKind::Parameter(accessor) if accessor.is_reference() => Some(accessor),
            BindingKind::LoopItem { borrowed: true } => Some(Accessor::Look),
            _ => None,
        }
    }

    pub fn settable(&self) -> bool {
        match self.kind {
            BindingKind::Variable { mutable } => mutable,
            BindingKind::Parameter(accessor) => accessor != Accessor::Look,
            BindingKind::LoopItem { .. } => false,
        }
    }

    fn movable(&self) -> bool {
        match self.kind {
            BindingKind::Variable { mutable } => mutable,
            BindingKind::Parameter(accessor) => {
                matches!(accessor, Accessor::Move | Accessor::Copy)
            }
            BindingKind::LoopItem { .. } => false,
        }
    }
}

#[derive(Debug)]
pub struct ScopeStack {
    frames: Vec<HashMap<String, Binding>>,
    loop_depth: usize,
}

impl Default for ScopeStack {
    fn default() -> Self {
        ScopeStack::new()
    }
}

impl ScopeStack {
    pub fn new() -> Self {
        ScopeStack {
            frames: vec![HashMap::new()],
            loop_depth: 0,
        }
    }

    pub fn enter_loop(&mut self) {
        self.loop_depth += 1;
        self.push();
    }

    pub fn exit_loop(&mut self) {
        self.pop();
        self.loop_depth = self.loop_depth.saturating_sub(1);
    }

    pub fn in_loop(&self) -> bool {
        self.loop_depth > 0
    }

    pub fn push(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub fn pop(&mut self) {
        // The function frame is never popped.
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    pub fn declare(&mut self, name: &str, kind: BindingKind) -> Result<(), CompileError> {
        let loop_depth = self.loop_depth;
        let frame = self
            .frames
            .last_mut()
            .ok_or_else(|| CompileError::scope("no open scope"))?;
        if frame.contains_key(name) {
            return Err(CompileError::scope(format!(
                "Variable '{}' is already defined in this scope.",
                name
            )));
        }
        frame.insert(
            name.to_string(),
            Binding {
                kind,
                moved: false,
                loop_depth,
            },
        );
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    fn lookup_mut(&mut self, name: &str) -> Option<&mut Binding> {
        self.frames
            .iter_mut()
            .rev()
            .find_map(|frame| frame.get_mut(name))
    }

    pub fn check_read(&self, name: &str) -> Result<&Binding, CompileError> {
        match self.lookup(name) {
            Some(binding) if binding.moved => Err(CompileError::scope(format!(
                "Variable '{}' is used after being moved.",
                name
            ))),
            Some(binding) => Ok(binding),
            None => Err(CompileError::scope(format!(
                "Variable '{}' is not defined.",
                name
            ))),
        }
    }

    pub fn check_set(&self, name: &str) -> Result<&Binding, CompileError> {
        let binding = self.check_read(name)?;
        if binding.settable() {
            Ok(binding)
        } else {
            Err(CompileError::scope(format!(
                "Variable '{}' cannot be mutated.",
                name
            )))
        }
    }

    /// Check that `name` may be handed over with `accessor`; a move
    /// invalidates the binding for every later read.
    pub fn check_pass(&mut self, name: &str, accessor: Accessor) -> Result<(), CompileError> {
        let binding = self.check_read(name)?;
        let allowed = match accessor {
            Accessor::Look | Accessor::Copy => true,
            Accessor::Mutate => binding.settable(),
            Accessor::Move => binding.movable(),
        };
        if !allowed {
            return Err(CompileError::scope(format!(
                "Variable '{}' cannot be passed with accessor '{}'.",
                name,
                accessor.name()
            )));
        }
        if accessor == Accessor::Move && binding.loop_depth < self.loop_depth {
            return Err(CompileError::scope(format!(
                "Variable '{}' is moved in a loop where it may be accessed again.",
                name
            )));
        }
        if accessor == Accessor::Move {
            if let Some(binding) = self.lookup_mut(name) {
                binding.moved = true;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_scope_shadows_and_pops() {
        let mut scope = ScopeStack::new();
        scope.declare("x", BindingKind::Variable { mutable: false }).unwrap();
        scope.push();
        scope.declare("x", BindingKind::Variable { mutable: true }).unwrap();
        assert!(scope.check_set("x").is_ok());
        scope.pop();
        assert!(scope.check_set("x").is_err());
    }

    #[test]
    fn redeclare_in_same_scope_fails() {
        let mut scope = ScopeStack::new();
        scope.declare("x", BindingKind::Variable { mutable: true }).unwrap();
        assert!(scope.declare("x", BindingKind::Variable { mutable: true }).is_err());
    }

    #[test]
    fn look_parameter_is_read_only() {
        let mut scope = ScopeStack::new();
        scope.declare("p", BindingKind::Parameter(Accessor::Look)).unwrap();
        assert!(scope.check_read("p").is_ok());
        assert!(scope.check_set("p").is_err());
        assert!(scope.check_pass("p", Accessor::Mutate).is_err());
        assert!(scope.check_pass("p", Accessor::Move).is_err());
        assert!(scope.check_pass("p", Accessor::Copy).is_ok());
    }

    #[test]
    fn move_invalidates_source() {
        let mut scope = ScopeStack::new();
        scope.declare("v", BindingKind::Variable { mutable: true }).unwrap();
        scope.check_pass("v", Accessor::Move).unwrap();
        let err = scope.check_read("v").unwrap_err();
        assert!(err.to_string().contains("moved"));
    }

    #[test]
    fn const_cannot_be_moved_or_mutated() {
        let mut scope = ScopeStack::new();
        scope.declare("c", BindingKind::Variable { mutable: false }).unwrap();
        assert!(scope.check_pass("c", Accessor::Move).is_err());
        assert!(scope.check_pass("c", Accessor::Mutate).is_err());
        assert!(scope.check_pass("c", Accessor::Look).is_ok());
    }

    #[test]
    fn owned_parameters_can_move() {
        let mut scope = ScopeStack::new();
        scope.declare("a", BindingKind::Parameter(Accessor::Move)).unwrap();
        scope.declare("b", BindingKind::Parameter(Accessor::Copy)).unwrap();
        scope.declare("m", BindingKind::Parameter(Accessor::Mutate)).unwrap();
        assert!(scope.check_pass("a", Accessor::Move).is_ok());
        assert!(scope.check_pass("b", Accessor::Move).is_ok());
        assert!(scope.check_pass("m", Accessor::Move).is_err());
        assert!(scope.check_pass("m", Accessor::Mutate).is_ok());
    }

    #[test]
    fn move_inside_loop_of_outer_binding_fails() {
        let mut scope = ScopeStack::new();
        scope.declare("v", BindingKind::Variable { mutable: true }).unwrap();
        scope.enter_loop();
        scope.declare("w", BindingKind::Variable { mutable: true }).unwrap();
        assert!(scope.check_pass("w", Accessor::Move).is_ok());
        let err = scope.check_pass("v", Accessor::Move).unwrap_err();
        assert!(err.to_string().contains("in a loop"));
        scope.exit_loop();
        assert!(!scope.in_loop());
        assert!(scope.check_pass("v", Accessor::Move).is_ok());
    }

    #[test]
    fn undefined_name() {
        let scope = ScopeStack::new();
        assert!(scope.check_read("ghost").unwrap_err().to_string().contains("not defined"));
    }
}
