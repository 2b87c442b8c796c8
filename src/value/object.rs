use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::trace;

/// Heap payload. Strings are the only object kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Obj {
    String(Rc<str>),
}

impl fmt::Display for Obj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Obj::String(s) => f.write_str(s),
        }
    }
}

/// Non-owning handle to an object in a [`Heap`]. A handle outlives its object
/// harmlessly: once the slot is freed the generation no longer matches and
/// lookups return `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjRef {
    index: u32,
    generation: u32,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    object: Option<Obj>,
    /// Next live object in allocation order, newest first.
    next: Option<u32>,
}

/// Arena owning every object a VM allocates, plus the string intern table.
///
/// Live objects are threaded through `head`/`next` so teardown can visit each
/// one exactly once. Freed slots are recycled with a bumped generation.
#[derive(Debug, Default)]
pub struct Heap {
    slots: Vec<Slot>,
    free: Vec<u32>,
    head: Option<u32>,
    strings: HashMap<Rc<str>, ObjRef>,
    live: usize,
}

impl Heap {
    pub fn new() -> Self {
        Heap::default()
    }

    /// Place `obj` in the arena without consulting the intern table.
    pub fn alloc(&mut self, obj: Obj) -> ObjRef {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot { generation: 0, object: None, next: None });
                (self.slots.len() - 1) as u32
            }
        };
        let slot = &mut self.slots[index as usize];
        slot.object = Some(obj);
        slot.next = self.head;
        self.head = Some(index);
        self.live += 1;
        ObjRef { index, generation: slot.generation }
    }

    /// Canonical string object for `text`, allocating it on first sight.
    pub fn intern(&mut self, text: &str) -> ObjRef {
        if let Some(&existing) = self.strings.get(text) {
            trace!("intern hit {text:?}");
            return existing;
        }
        self.insert_string(Rc::from(text))
    }

    /// Like [`Heap::intern`] but takes ownership of a freshly built string.
    pub fn intern_owned(&mut self, text: String) -> ObjRef {
        if let Some(&existing) = self.strings.get(text.as_str()) {
            trace!("intern hit {text:?}");
            return existing;
        }
        self.insert_string(Rc::from(text))
    }

    fn insert_string(&mut self, text: Rc<str>) -> ObjRef {
        trace!("intern miss {text:?}");
        let r = self.alloc(Obj::String(Rc::clone(&text)));
        self.strings.insert(text, r);
        r
    }

    pub fn get(&self, r: ObjRef) -> Option<&Obj> {
        self.slots
            .get(r.index as usize)
            .filter(|slot| slot.generation == r.generation)
            .and_then(|slot| slot.object.as_ref())
    }

    pub fn as_str(&self, r: ObjRef) -> Option<&str> {
        match self.get(r)? {
            Obj::String(s) => Some(s),
        }
    }

    pub fn interned(&self, text: &str) -> Option<ObjRef> {
        self.strings.get(text).copied()
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Release every object: walk the object list from its head detaching each
    /// node, then clear the intern table. Outstanding handles become stale.
    pub fn free_objects(&mut self) {
        let mut cursor = self.head.take();
        while let Some(index) = cursor {
            let slot = &mut self.slots[index as usize];
            cursor = slot.next.take();
            slot.object = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(index);
        }
        self.strings.clear();
        self.live = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_returns_canonical_handle() {
        let mut heap = Heap::new();
        let a = heap.intern("lox");
        let b = heap.intern("lox");
        let c = heap.intern_owned(String::from("lox"));
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(heap.len(), 1);
        assert_eq!(heap.interned("lox"), Some(a));
        assert_eq!(heap.interned("absent"), None);
    }

    #[test]
    fn free_objects_invalidates_handles() {
        let mut heap = Heap::new();
        let a = heap.intern("gone");
        heap.intern("also gone");
        heap.free_objects();
        assert!(heap.is_empty());
        assert_eq!(heap.get(a), None);
        assert_eq!(heap.as_str(a), None);
        assert_eq!(heap.interned("gone"), None);
    }

    #[test]
    fn freed_slots_are_reused_with_new_generation() {
        let mut heap = Heap::new();
        let old = heap.intern("first");
        heap.free_objects();
        let new = heap.intern("second");
        assert_ne!(old, new);
        assert_eq!(heap.as_str(new), Some("second"));
        assert_eq!(heap.as_str(old), None);
        assert_eq!(heap.len(), 1);
    }
}
