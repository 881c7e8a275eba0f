use tracing::debug;

use super::bytecode::Addr;
use super::error::FaultKind;
use super::value::{ObjectRef, Value};

/// Untyped property storage plus a table of method addresses. Every read and
/// write goes through a type tag chosen at the call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    props: Vec<Value>,
    methods: Vec<Addr>,
}

impl Object {
    pub fn new(prop_count: usize, method_count: usize) -> Self {
        Self {
            props: vec![Value::default(); prop_count],
            methods: vec![0; method_count],
        }
    }

    pub fn prop_count(&self) -> usize {
        self.props.len()
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    pub fn props(&self) -> &[Value] {
        &self.props
    }

    pub fn methods(&self) -> &[Addr] {
        &self.methods
    }

    pub fn prop(&self, idx: usize) -> Result<Value, FaultKind> {
        self.props
            .get(idx)
            .copied()
            .ok_or(FaultKind::OperandOutOfRange {
                operand: "property",
                index: idx,
                limit: self.props.len(),
            })
    }

    pub fn set_prop(&mut self, idx: usize, val: Value) -> Result<(), FaultKind> {
        let limit = self.props.len();
        let slot = self.props.get_mut(idx).ok_or(FaultKind::OperandOutOfRange {
            operand: "property",
            index: idx,
            limit,
        })?;

        *slot = val;
        Ok(())
    }

    pub fn method(&self, idx: usize) -> Result<Addr, FaultKind> {
        self.methods
            .get(idx)
            .copied()
            .ok_or(FaultKind::OperandOutOfRange {
                operand: "method",
                index: idx,
                limit: self.methods.len(),
            })
    }

    pub fn set_method(&mut self, idx: usize, addr: Addr) -> Result<(), FaultKind> {
        let limit = self.methods.len();
        let slot = self.methods.get_mut(idx).ok_or(FaultKind::OperandOutOfRange {
            operand: "method",
            index: idx,
            limit,
        })?;

        *slot = addr;
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    object: Option<Object>,
}

/// Fixed capacity arena of objects. Freed slots go on a free list and are
/// handed out again before the arena grows. Freeing a slot bumps its
/// generation, so handles to the destroyed object stop resolving.
#[derive(Debug, Clone)]
pub struct Heap {
    slots: Vec<Slot>,
    free: Vec<usize>,
    live: usize,
    capacity: usize,
}

impl Heap {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![],
            free: vec![],
            live: 0,
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of objects allocated and not yet destroyed.
    pub fn live(&self) -> usize {
        self.live
    }

    pub fn alloc(&mut self, object: Object) -> Result<ObjectRef, FaultKind> {
        if self.live >= self.capacity {
            return Err(FaultKind::HeapExhausted {
                capacity: self.capacity,
            });
        }

        let (slot, generation) = match self.free.pop() {
            Some(slot) => {
                let entry = &mut self.slots[slot];

                entry.object = Some(object);
                (slot, entry.generation)
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    object: Some(object),
                });
                (self.slots.len() - 1, 0)
            }
        };

        self.live += 1;
        debug!(slot, generation, live = self.live, "allocated object");

        Ok(ObjectRef::new(slot, generation))
    }

    /// Destroys the object behind `obj`. Any copy of the handle still sitting
    /// in a register faults on its next use.
    pub fn free(&mut self, obj: ObjectRef) -> Result<Object, FaultKind> {
        let stale = self.stale(obj);
        let Some(entry) = self
            .slots
            .get_mut(obj.slot())
            .filter(|entry| entry.generation == obj.generation())
        else {
            return Err(stale);
        };
        let Some(object) = entry.object.take() else {
            return Err(stale);
        };

        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(obj.slot());
        self.live -= 1;
        debug!(slot = obj.slot(), live = self.live, "destroyed object");

        Ok(object)
    }

    pub fn get(&self, obj: ObjectRef) -> Result<&Object, FaultKind> {
        self.slots
            .get(obj.slot())
            .filter(|entry| entry.generation == obj.generation())
            .and_then(|entry| entry.object.as_ref())
            .ok_or_else(|| self.stale(obj))
    }

    pub fn get_mut(&mut self, obj: ObjectRef) -> Result<&mut Object, FaultKind> {
        let stale = self.stale(obj);

        self.slots
            .get_mut(obj.slot())
            .filter(|entry| entry.generation == obj.generation())
            .and_then(|entry| entry.object.as_mut())
            .ok_or(stale)
    }

    /// Live objects in slot order.
    pub fn objects(&self) -> impl Iterator<Item = (ObjectRef, &Object)> {
        self.slots.iter().enumerate().filter_map(|(slot, entry)| {
            entry
                .object
                .as_ref()
                .map(|o| (ObjectRef::new(slot, entry.generation), o))
        })
    }

    fn stale(&self, obj: ObjectRef) -> FaultKind {
        FaultKind::OperandOutOfRange {
            operand: "object",
            index: obj.slot(),
            limit: self.slots.len(),
        }
    }
}
