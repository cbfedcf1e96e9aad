//! The shared value table a plan executes against.
//!
//! Channels are resolved to dense slot indices at build time; at run time each
//! slot holds the type-erased value its producing module stored. On a
//! validated plan the typed accessors here cannot fail, but they stay fallible
//! so a misused context surfaces a diagnostic instead of a panic.

use miette::Diagnostic;
use std::any::Any;
use thiserror::Error;

/// A slot access went wrong.
///
/// None of these occur when a context of the plan's channel count is driven by
/// a scheduler: the builder has already proven every index in range and every
/// read type-identical to its producer.
#[derive(Debug, Error, Diagnostic)]
pub enum SlotError {
    /// The slot index is outside the context.
    #[error("slot {slot} is out of range for a context of {len} channels")]
    #[diagnostic(
        code(flowplan::context::out_of_range),
        help("Contexts must be created with the plan's num_channels().")
    )]
    OutOfRange { slot: usize, len: usize },

    /// The slot has not been written yet.
    #[error("slot {slot} holds no value")]
    #[diagnostic(
        code(flowplan::context::vacant),
        help("A consumer ran before its producer; the plan order is broken.")
    )]
    Vacant { slot: usize },

    /// The slot holds a value of a different type.
    #[error("slot {slot} does not hold a value of type {expected}")]
    #[diagnostic(
        code(flowplan::context::wrong_type),
        help("Producer and consumer types diverged after the plan was built.")
    )]
    WrongType { slot: usize, expected: &'static str },
}

/// Dense sequence of type-erased value slots, one per channel.
///
/// # Examples
///
/// ```
/// use flowplan::context::ValueContext;
///
/// let mut slots = ValueContext::new(2);
/// slots.set(0, 41_i64).unwrap();
/// assert_eq!(slots.get::<i64>(0).unwrap(), 41);
/// assert!(slots.is_vacant(1));
/// ```
#[derive(Debug, Default)]
pub struct ValueContext {
    slots: Vec<Option<Box<dyn Any + Send>>>,
}

impl ValueContext {
    /// Creates a context of `len` vacant slots.
    #[must_use]
    pub fn new(len: usize) -> Self {
        let mut slots = Vec::with_capacity(len);
        slots.resize_with(len, || None);
        Self { slots }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// True when the slot has not been written in this run.
    #[must_use]
    pub fn is_vacant(&self, slot: usize) -> bool {
        matches!(self.slots.get(slot), Some(None) | None)
    }

    /// Clones the value out of a slot.
    ///
    /// Inputs are read by value, so `T` must be `Clone`; several consumers may
    /// read the same slot.
    pub fn get<T>(&self, slot: usize) -> Result<T, SlotError>
    where
        T: Clone + 'static,
    {
        let held = self
            .slots
            .get(slot)
            .ok_or(SlotError::OutOfRange {
                slot,
                len: self.slots.len(),
            })?
            .as_ref()
            .ok_or(SlotError::Vacant { slot })?;
        held.downcast_ref::<T>()
            .cloned()
            .ok_or(SlotError::WrongType {
                slot,
                expected: std::any::type_name::<T>(),
            })
    }

    /// Stores a value into a slot, replacing whatever it held.
    pub fn set<T>(&mut self, slot: usize, value: T) -> Result<(), SlotError>
    where
        T: Send + 'static,
    {
        let len = self.slots.len();
        let held = self
            .slots
            .get_mut(slot)
            .ok_or(SlotError::OutOfRange { slot, len })?;
        *held = Some(Box::new(value));
        Ok(())
    }

    /// Clears every slot back to vacant, keeping the length.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
    }
}
