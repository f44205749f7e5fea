use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use kat_utils::hash::{fold_eq, fold_hash, name_hash};

use crate::access::Accessor;

const INITIAL_WIDTH: usize = 4;

/// The three roles a name can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Reads the property while writing.
    Getter,
    /// Applies the property while reading.
    Setter,
    /// Fills a constructor argument while reading.
    Argument,
}

// -----------------------------------------------------------------------------
// Slot

/// The accessors bound to one name.
#[derive(Clone, Default)]
pub struct Slot {
    name: Box<str>,
    hash: u64,
    fold: u64,
    next: Option<usize>,
    fold_next: Option<usize>,
    getter: Option<Arc<dyn Accessor>>,
    setter: Option<Arc<dyn Accessor>>,
    argument: Option<Arc<dyn Accessor>>,
    required: bool,
}

impl Slot {
    /// An unbound slot, to be handed to
    /// [`PropertyTable::insert_or_get`] as a spare.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a token that cannot be coerced fails the read instead of
    /// falling back to the zero value.
    #[inline]
    pub fn is_required(&self) -> bool {
        self.required
    }

    #[inline]
    pub fn get(&self, role: Role) -> Option<&Arc<dyn Accessor>> {
        self.role(role).as_ref()
    }

    #[inline]
    fn role(&self, role: Role) -> &Option<Arc<dyn Accessor>> {
        match role {
            Role::Getter => &self.getter,
            Role::Setter => &self.setter,
            Role::Argument => &self.argument,
        }
    }

    #[inline]
    fn role_mut(&mut self, role: Role) -> &mut Option<Arc<dyn Accessor>> {
        match role {
            Role::Getter => &mut self.getter,
            Role::Setter => &mut self.setter,
            Role::Argument => &mut self.argument,
        }
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("name", &self.name)
            .field("getter", &self.getter.is_some())
            .field("setter", &self.setter.is_some())
            .field("argument", &self.argument.is_some())
            .field("required", &self.required)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// PropertyTable

/// A chained hash table from names to [`Slot`]s.
///
/// The width starts at 4 and doubles whenever a chain would grow longer
/// than the width. On growth each bucket splits into two, keeping the
/// relative order of its chain.
///
/// Names are keyed by [`name_hash`]. Every slot is also chained under its
/// [`fold_hash`], in a second set of buckets of the same width. When a lookup
/// asks for folding and the literal name misses, that chain is searched, so
/// `user_name` finds `userName`. Only the literal chains trigger growth.
///
/// # Examples
///
/// ```
/// use kat_schema::table::{PropertyTable, Slot};
///
/// let mut table = PropertyTable::new();
/// let mut spare = Some(Slot::new());
///
/// let a = table.insert_or_get("name", &mut spare);
/// assert!(spare.is_none());
///
/// spare = Some(Slot::new());
/// assert_eq!(table.insert_or_get("name", &mut spare), a);
/// assert!(spare.is_some());
/// ```
#[derive(Clone)]
pub struct PropertyTable {
    slots: Vec<Slot>,
    buckets: Vec<Option<usize>>,
    folds: Vec<Option<usize>>,
}

impl PropertyTable {
    #[inline]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            buckets: vec![None; INITIAL_WIDTH],
            folds: vec![None; INITIAL_WIDTH],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Current number of buckets.
    #[inline]
    pub fn width(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    pub fn slot(&self, id: usize) -> Option<&Slot> {
        self.slots.get(id)
    }

    /// All slots, in insertion order.
    #[inline]
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    #[inline]
    fn bucket(&self, hash: u64) -> usize {
        (hash & (self.buckets.len() as u64 - 1)) as usize
    }

    fn chain(&self, bucket: usize) -> impl Iterator<Item = usize> + '_ {
        core::iter::successors(self.buckets[bucket], |&id| self.slots[id].next)
    }

    fn fold_chain(&self, bucket: usize) -> impl Iterator<Item = usize> + '_ {
        core::iter::successors(self.folds[bucket], |&id| self.slots[id].fold_next)
    }

    /// Length of the longest literal chain.
    pub fn longest_chain(&self) -> usize {
        (0..self.width()).map(|bucket| self.chain(bucket).count()).max().unwrap_or(0)
    }

    /// Returns the id of the slot for `name`, creating it if absent.
    ///
    /// A new slot is made from `spare` when one is supplied, which is then
    /// left `None`. When the name already exists the spare is untouched.
    pub fn insert_or_get(&mut self, name: &str, spare: &mut Option<Slot>) -> usize {
        let hash = name_hash(name);

        let mut len = 0;
        for id in self.chain(self.bucket(hash)) {
            let slot = &self.slots[id];
            if slot.hash == hash && *slot.name == *name {
                return id;
            }
            len += 1;
        }

        if len + 1 > self.width() {
            self.grow();
        }

        let mut slot = spare.take().unwrap_or_default();
        slot.name = name.into();
        slot.hash = hash;
        slot.fold = fold_hash(name);
        slot.next = None;
        slot.fold_next = None;
        slot.required = false;
        let fold = slot.fold;

        let id = self.slots.len();
        let bucket = self.bucket(hash);
        match self.chain(bucket).last() {
            Some(last) => self.slots[last].next = Some(id),
            None => self.buckets[bucket] = Some(id),
        }
        let bucket = self.bucket(fold);
        match self.fold_chain(bucket).last() {
            Some(last) => self.slots[last].fold_next = Some(id),
            None => self.folds[bucket] = Some(id),
        }
        self.slots.push(slot);
        id
    }

    fn grow(&mut self) {
        let width = self.width() * 2;
        let buckets = core::mem::take(&mut self.buckets);
        self.buckets = self.split(buckets, width, |slot| slot.hash, |slot| &mut slot.next);
        let folds = core::mem::take(&mut self.folds);
        self.folds = self.split(folds, width, |slot| slot.fold, |slot| &mut slot.fold_next);
        log::trace!("property table grown to {width} buckets");
    }

    /// Redistributes `heads` over `width` buckets, keeping chain order.
    fn split(
        &mut self,
        heads: Vec<Option<usize>>,
        width: usize,
        key: fn(&Slot) -> u64,
        link: fn(&mut Slot) -> &mut Option<usize>,
    ) -> Vec<Option<usize>> {
        let mask = width as u64 - 1;
        let mut buckets = vec![None; width];
        let mut tails: Vec<Option<usize>> = vec![None; width];

        for head in heads {
            let mut cursor = head;
            while let Some(id) = cursor {
                cursor = link(&mut self.slots[id]).take();
                let bucket = (key(&self.slots[id]) & mask) as usize;
                match tails[bucket] {
                    Some(tail) => *link(&mut self.slots[tail]) = Some(id),
                    None => buckets[bucket] = Some(id),
                }
                tails[bucket] = Some(id);
            }
        }
        buckets
    }

    /// Binds `accessor` to `name` unless the role is already bound.
    ///
    /// Returns `false` when an earlier binding wins.
    pub fn add(&mut self, name: &str, role: Role, accessor: Arc<dyn Accessor>) -> bool {
        let id = self.insert_or_get(name, &mut None);
        let bound = self.slots[id].role_mut(role);
        if bound.is_some() {
            return false;
        }
        *bound = Some(accessor);
        true
    }

    /// Binds `accessor` to `name`, returning the accessor it replaces.
    pub fn set(&mut self, name: &str, role: Role, accessor: Arc<dyn Accessor>) -> Option<Arc<dyn Accessor>> {
        let id = self.insert_or_get(name, &mut None);
        self.slots[id].role_mut(role).replace(accessor)
    }

    #[inline]
    pub fn add_getter(&mut self, name: &str, accessor: Arc<dyn Accessor>) -> bool {
        self.add(name, Role::Getter, accessor)
    }

    #[inline]
    pub fn add_setter(&mut self, name: &str, accessor: Arc<dyn Accessor>) -> bool {
        self.add(name, Role::Setter, accessor)
    }

    #[inline]
    pub fn add_argument(&mut self, name: &str, accessor: Arc<dyn Accessor>) -> bool {
        self.add(name, Role::Argument, accessor)
    }

    #[inline]
    pub fn set_getter(&mut self, name: &str, accessor: Arc<dyn Accessor>) -> Option<Arc<dyn Accessor>> {
        self.set(name, Role::Getter, accessor)
    }

    #[inline]
    pub fn set_setter(&mut self, name: &str, accessor: Arc<dyn Accessor>) -> Option<Arc<dyn Accessor>> {
        self.set(name, Role::Setter, accessor)
    }

    #[inline]
    pub fn set_argument(&mut self, name: &str, accessor: Arc<dyn Accessor>) -> Option<Arc<dyn Accessor>> {
        self.set(name, Role::Argument, accessor)
    }

    /// Finds the slot named `name`.
    pub fn find(&self, name: &str) -> Option<&Slot> {
        let hash = name_hash(name);
        self.chain(self.bucket(hash))
            .map(|id| &self.slots[id])
            .find(|slot| slot.hash == hash && *slot.name == *name)
    }

    /// Marks the slot of `name` as required.
    pub fn require(&mut self, name: &str) {
        let id = self.insert_or_get(name, &mut None);
        self.slots[id].required = true;
    }

    /// Looks up the slot of `name` having `role` bound.
    ///
    /// With `fold`, a name that matches no slot literally is retried with
    /// the folding hash.
    pub fn lookup_slot(&self, name: &str, role: Role, fold: bool) -> Option<&Slot> {
        if let Some(slot) = self.find(name) {
            return slot.get(role).map(|_| slot);
        }
        if !fold {
            return None;
        }

        let folded = fold_hash(name);
        if folded == 0 {
            return None;
        }
        self.fold_chain(self.bucket(folded))
            .map(|id| &self.slots[id])
            .find(|slot| slot.fold == folded && slot.get(role).is_some() && fold_eq(&slot.name, name))
    }

    /// Looks up the accessor bound to `name` for `role`.
    #[inline]
    pub fn lookup(&self, name: &str, role: Role, fold: bool) -> Option<&Arc<dyn Accessor>> {
        self.lookup_slot(name, role, fold).and_then(|slot| slot.get(role))
    }

    #[inline]
    pub fn getter(&self, name: &str, fold: bool) -> Option<&Arc<dyn Accessor>> {
        self.lookup(name, Role::Getter, fold)
    }

    #[inline]
    pub fn setter(&self, name: &str, fold: bool) -> Option<&Arc<dyn Accessor>> {
        self.lookup(name, Role::Setter, fold)
    }

    #[inline]
    pub fn argument(&self, name: &str, fold: bool) -> Option<&Arc<dyn Accessor>> {
        self.lookup(name, Role::Argument, fold)
    }
}

impl Default for PropertyTable {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PropertyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyTable")
            .field("width", &self.width())
            .field("slots", &self.slots)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use alloc::format;
    use alloc::sync::Arc;

    use super::{PropertyTable, Role, Slot};
    use crate::access::{Accessor, Caps, ElementCodec};
    use crate::info::{TypeInfo, Typed};

    struct Marker(ElementCodec);

    impl Accessor for Marker {
        fn caps(&self) -> Caps {
            Caps::READ
        }

        fn info(&self) -> &'static TypeInfo {
            i32::type_info()
        }

        fn element(&self) -> &ElementCodec {
            &self.0
        }
    }

    fn accessor() -> Arc<dyn Accessor> {
        Arc::new(Marker(ElementCodec::new(None)))
    }

    #[test]
    fn thousand_keys() {
        let mut table = PropertyTable::new();
        assert_eq!(table.width(), 4);

        for i in 0..1000 {
            let name = format!("key{i}");
            assert!(table.add_setter(&name, accessor()));
        }
        assert_eq!(table.len(), 1000);
        assert!(table.width() > 4);
        assert!(table.width().is_power_of_two());

        for i in 0..1000 {
            let name = format!("key{i}");
            let slot = table.find(&name).unwrap();
            assert_eq!(slot.name(), name);
            assert!(table.setter(&name, false).is_some());
        }
        assert!(table.find("key1000").is_none());
    }

    #[test]
    fn insert_or_get_is_idempotent() {
        let mut table = PropertyTable::new();
        let mut spare = Some(Slot::new());
        let id = table.insert_or_get("id", &mut spare);
        assert!(spare.is_none());

        let mut spare = Some(Slot::new());
        assert_eq!(table.insert_or_get("id", &mut spare), id);
        assert!(spare.is_some());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn add_keeps_first() {
        let mut table = PropertyTable::new();
        let first = accessor();
        assert!(table.add_getter("x", first.clone()));
        assert!(!table.add_getter("x", accessor()));
        assert!(Arc::ptr_eq(table.getter("x", false).unwrap(), &first));

        // Roles are independent.
        assert!(table.add_setter("x", accessor()));
        assert!(table.argument("x", false).is_none());
    }

    #[test]
    fn set_replaces() {
        let mut table = PropertyTable::new();
        let first = accessor();
        assert!(table.set_setter("x", first.clone()).is_none());

        let second = accessor();
        let previous = table.set_setter("x", second.clone()).unwrap();
        assert!(Arc::ptr_eq(&previous, &first));
        assert!(Arc::ptr_eq(table.setter("x", false).unwrap(), &second));
    }

    #[test]
    fn folded_lookup() {
        let mut table = PropertyTable::new();
        table.add("userName", Role::Setter, accessor());

        assert!(table.setter("user_name", false).is_none());
        assert!(table.setter("user_name", true).is_some());
        assert!(table.setter("USERNAME", true).is_some());
        assert!(table.setter("_username", true).is_none());
        assert!(table.setter("user__name", true).is_none());
    }

    #[test]
    fn required_marks_slot() {
        let mut table = PropertyTable::new();
        table.add_setter("id", accessor());
        table.require("id");

        assert!(table.lookup_slot("id", Role::Setter, false).unwrap().is_required());
        assert!(table.lookup_slot("id", Role::Getter, false).is_none());
    }

    /// Names whose literal hash lands in bucket `0` of a `width` table.
    fn colliding(width: u64, count: usize) -> alloc::vec::Vec<alloc::string::String> {
        (0..)
            .map(|i| format!("field{i}"))
            .filter(|name| kat_utils::hash::name_hash(name) & (width - 1) == 0)
            .take(count)
            .collect()
    }

    #[test]
    fn grows_when_a_chain_exceeds_width() {
        let mut table = PropertyTable::new();
        let names = colliding(4, 5);

        for name in &names[..4] {
            table.add_setter(name, accessor());
        }
        assert_eq!(table.width(), 4);
        assert_eq!(table.longest_chain(), 4);

        table.add_setter(&names[4], accessor());
        assert_eq!(table.width(), 8);
        assert!(table.longest_chain() <= table.width());
        for name in &names {
            assert!(table.setter(name, false).is_some());
        }
    }

    #[test]
    fn folded_lookup_in_large_table() {
        let mut table = PropertyTable::new();
        for i in 0..500 {
            table.add_setter(&format!("created_at{i}"), accessor());
        }
        assert!(table.longest_chain() <= table.width());

        for i in 0..500 {
            let slot = table.lookup_slot(&format!("CreatedAt{i}"), Role::Setter, true).unwrap();
            assert_eq!(slot.name(), format!("created_at{i}"));
        }
        assert!(table.lookup_slot("CreatedAt500", Role::Setter, true).is_none());
        assert!(table.lookup_slot("CreatedAt1", Role::Getter, true).is_none());
    }
}
