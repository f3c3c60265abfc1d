//! Path-addressable form store
//!
//! The rule tree lives in a host form as nested plain data. Editors only
//! ever touch it through the path-keyed operations of [`FormStore`].

mod memory;
mod path;

#[cfg(test)]
mod property_tests;

pub use memory::*;
pub use path::*;

use serde_json::Value;

use crate::error::Result;

/// Options for [`FormStore::set_value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetValueOptions {
    pub should_dirty: bool,
}

impl SetValueOptions {
    pub const DIRTY: SetValueOptions = SetValueOptions { should_dirty: true };
    pub const PRISTINE: SetValueOptions = SetValueOptions {
        should_dirty: false,
    };
}

impl Default for SetValueOptions {
    fn default() -> Self {
        Self::DIRTY
    }
}

/// Host form state container
pub trait FormStore {
    /// Current value at `path`, read fresh
    fn get_value(&self, path: &FieldPath) -> Option<Value>;

    /// Write `value` at `path`, creating intermediate objects
    fn set_value(&mut self, path: &FieldPath, value: Value, options: SetValueOptions) -> Result<()>;

    /// Read `path` and subscribe to writes that overlap it
    fn watch(&mut self, path: &FieldPath) -> Option<Value>;

    /// Clear validation errors at and below `path`, or all of them
    fn clear_errors(&mut self, path: Option<&FieldPath>);

    /// Record a validation error; hosts call this when validating
    fn set_error(&mut self, path: &FieldPath, message: String);

    fn error(&self, path: &FieldPath) -> Option<String>;

    fn is_dirty(&self, path: &FieldPath) -> bool;

    /// Push `item` onto the array at `array_path`, returning its index
    fn append(&mut self, array_path: &FieldPath, item: Value) -> Result<usize>;

    /// Splice the element at `index` out of the array at `array_path`
    fn remove(&mut self, array_path: &FieldPath, index: usize) -> Result<Value>;
}
