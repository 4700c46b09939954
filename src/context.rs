use crate::{Blackboard, FromParam, NodeParameters, Symbol};
use std::{any::Any, rc::Rc};

/// Per-tick access to the blackboard.
///
/// While a leaf is being ticked, the context also carries that leaf's
/// parameters so [`Context::get_param`] resolves them without the leaf
/// knowing whether they are literals or blackboard references.
#[derive(Default)]
pub struct Context {
    blackboard: Blackboard,
    pub(crate) params: NodeParameters,
}

impl Context {
    pub fn new(blackboard: Blackboard) -> Self {
        Self {
            blackboard,
            params: NodeParameters::new(),
        }
    }

    pub fn take_blackboard(self) -> Blackboard {
        self.blackboard
    }

    pub fn get<T: 'static>(&self, key: impl Into<Symbol>) -> Option<&T> {
        self.blackboard
            .get(&key.into())
            .and_then(|val| val.downcast_ref())
    }

    /// Like [`Context::get`], but falls back to parsing a stored `String` or
    /// `&'static str` when the value is not already a `T`.
    pub fn get_parse<T>(&self, key: impl Into<Symbol>) -> Option<T>
    where
        T: FromParam + Clone + 'static,
    {
        let val = self.blackboard.get(&key.into())?;
        if let Some(val) = val.downcast_ref::<T>() {
            return Some(val.clone());
        }
        if let Some(s) = val.downcast_ref::<String>() {
            return T::from_param(s);
        }
        val.downcast_ref::<&'static str>()
            .and_then(|s| T::from_param(s))
    }

    pub fn set<T: 'static>(&mut self, key: impl Into<Symbol>, val: T) {
        self.blackboard.insert(key.into(), Rc::new(val) as Rc<dyn Any>);
    }

    pub fn remove(&mut self, key: impl Into<Symbol>) -> bool {
        self.blackboard.remove(&key.into()).is_some()
    }

    /// Resolves a parameter of the leaf currently being ticked.
    pub fn get_param<T>(&self, key: &str) -> Option<T>
    where
        T: FromParam + Clone + 'static,
    {
        self.params.binding(key)?.resolve(self)
    }
}
