use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::time::Instant;
use tracing::trace;

/// Identifies which field of the [`TableState`] a write touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Visible,
    Columns,
    Rows,
}

/// The shared table state record.
///
/// `rows` maps a column name to the cell values of that column. Neither the
/// relation between `rows` keys and `columns` nor the lengths of the value
/// vectors are checked anywhere; consumers have to tolerate missing columns
/// and ragged data (the ui renders missing cells as empty).
#[derive(Debug, Clone, PartialEq)]
pub struct TableState {
    pub visible: bool,
    pub columns: Vec<String>,
    pub rows: HashMap<String, Vec<String>>,
}

impl Default for TableState {
    fn default() -> Self {
        TableState {
            visible: false,
            columns: Vec::new(),
            rows: HashMap::new(),
        }
    }
}

pub type SubscriptionId = usize;

struct Subscribers {
    next_id: SubscriptionId,
    entries: Vec<(SubscriptionId, Box<dyn FnMut(Field)>)>,
}

/// Handle to the one table state instance shared by all ui collaborators.
///
/// Cloning a `Store` clones the handle, not the state: every clone aliases
/// the same record, so a write through one handle is observed by reads
/// through every other handle. Reads return snapshots, writes replace the
/// field wholesale and then invoke every registered subscriber with the
/// written [`Field`]. Writes perform no validation and cannot fail.
///
/// The store is single threaded by construction (`Rc`/`RefCell`); it lives
/// on the event loop thread together with its consumers.
#[derive(Clone)]
pub struct Store {
    state: Rc<RefCell<TableState>>,
    subscribers: Rc<RefCell<Subscribers>>,
    last_update: Rc<Cell<Instant>>,
    // Writes performed from inside a callback queue up here and are
    // delivered by the outer notification loop.
    pending: Rc<RefCell<VecDeque<Field>>>,
    notifying: Rc<Cell<bool>>,
}

impl Store {
    pub fn new() -> Self {
        Store {
            state: Rc::new(RefCell::new(TableState::default())),
            subscribers: Rc::new(RefCell::new(Subscribers {
                next_id: 0,
                entries: Vec::new(),
            })),
            last_update: Rc::new(Cell::new(Instant::now())),
            pending: Rc::new(RefCell::new(VecDeque::new())),
            notifying: Rc::new(Cell::new(false)),
        }
    }

    // ------------------------------ Reads ------------------------------ //

    pub fn visible(&self) -> bool {
        self.state.borrow().visible
    }

    pub fn columns(&self) -> Vec<String> {
        self.state.borrow().columns.clone()
    }

    pub fn rows(&self) -> HashMap<String, Vec<String>> {
        self.state.borrow().rows.clone()
    }

    /// Cell values of a single column, if `rows` holds it.
    pub fn column(&self, name: &str) -> Option<Vec<String>> {
        self.state.borrow().rows.get(name).cloned()
    }

    pub fn snapshot(&self) -> TableState {
        self.state.borrow().clone()
    }

    /// Instant of the last write through any handle. Lets render loops skip
    /// repaints when nothing changed.
    pub fn last_update(&self) -> Instant {
        self.last_update.get()
    }

    // ------------------------------ Writes ----------------------------- //

    pub fn set_visible(&self, visible: bool) {
        self.state.borrow_mut().visible = visible;
        self.touch(Field::Visible);
    }

    pub fn set_columns(&self, columns: Vec<String>) {
        self.state.borrow_mut().columns = columns;
        self.touch(Field::Columns);
    }

    pub fn set_rows(&self, rows: HashMap<String, Vec<String>>) {
        self.state.borrow_mut().rows = rows;
        self.touch(Field::Rows);
    }

    // --------------------------- Subscriptions ------------------------- //

    /// Register a callback invoked after each field write. Callbacks run on
    /// the writing thread, in subscription order, and may read or write the
    /// store; a write performed from inside a callback takes effect
    /// immediately and is notified after the current round of callbacks.
    /// Callbacks must not subscribe or unsubscribe from within the callback.
    pub fn subscribe(&self, callback: impl FnMut(Field) + 'static) -> SubscriptionId {
        let mut subs = self.subscribers.borrow_mut();
        let id = subs.next_id;
        subs.next_id += 1;
        subs.entries.push((id, Box::new(callback)));
        trace!("Registered store subscription {id}");
        id
    }

    /// Remove a subscription. Returns false if the id is unknown.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.subscribers.borrow_mut();
        let before = subs.entries.len();
        subs.entries.retain(|(sid, _)| *sid != id);
        subs.entries.len() != before
    }

    fn touch(&self, field: Field) {
        self.last_update.set(Instant::now());
        trace!("Store write: {:?}", field);
        self.pending.borrow_mut().push_back(field);
        if self.notifying.get() {
            // Write from inside a callback, the outer loop delivers it.
            return;
        }

        // The state borrow is released before callbacks run, so subscribers
        // can read and write the store.
        self.notifying.set(true);
        loop {
            let next = self.pending.borrow_mut().pop_front();
            let Some(field) = next else { break };
            let mut subs = self.subscribers.borrow_mut();
            for (_, callback) in subs.entries.iter_mut() {
                callback(field);
            }
        }
        self.notifying.set(false);
    }
}

impl Default for Store {
    fn default() -> Self {
        Store::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_defaults() {
        let store = Store::new();
        assert!(!store.visible());
        assert!(store.columns().is_empty());
        assert!(store.rows().is_empty());
    }

    #[test]
    fn write_then_read_each_field() {
        let store = Store::new();

        store.set_visible(true);
        assert!(store.visible());
        store.set_visible(false);
        assert!(!store.visible());

        let columns = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        store.set_columns(columns.clone());
        assert_eq!(store.columns(), columns);

        let mut rows = HashMap::new();
        rows.insert("a".to_string(), vec!["1".to_string(), "2".to_string()]);
        store.set_rows(rows.clone());
        assert_eq!(store.rows(), rows);
    }

    #[test]
    fn writes_are_visible_across_handles() {
        let a = Store::new();
        let before = a.clone();
        a.set_columns(vec!["x".to_string()]);
        let after = a.clone();

        assert_eq!(before.columns(), vec!["x".to_string()]);
        assert_eq!(after.columns(), vec!["x".to_string()]);

        before.set_visible(true);
        assert!(a.visible());
        assert!(after.visible());
    }

    #[test]
    fn subscribers_see_each_write_once() {
        let store = Store::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&seen);
        store.subscribe(move |field| sink.borrow_mut().push(field));

        store.set_visible(true);
        store.set_columns(vec!["a".to_string()]);
        store.set_rows(HashMap::new());

        assert_eq!(
            *seen.borrow(),
            vec![Field::Visible, Field::Columns, Field::Rows]
        );
    }

    #[test]
    fn subscribers_can_read_the_store() {
        let store = Store::new();
        let observed = Rc::new(Cell::new(false));

        let handle = store.clone();
        let sink = Rc::clone(&observed);
        store.subscribe(move |field| {
            if field == Field::Visible {
                sink.set(handle.visible());
            }
        });

        store.set_visible(true);
        assert!(observed.get());
    }

    #[test]
    fn subscribers_may_write_back_into_the_store() {
        let store = Store::new();

        // First subscriber reacts to a columns write by showing the table.
        let writer = store.clone();
        store.subscribe(move |field| {
            if field == Field::Columns {
                writer.set_visible(true);
            }
        });

        // Second subscriber records the notification order.
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        store.subscribe(move |field| sink.borrow_mut().push(field));

        store.set_columns(vec!["a".to_string()]);

        // The nested write took effect and was notified after the columns
        // round completed.
        assert!(store.visible());
        assert_eq!(*seen.borrow(), vec![Field::Columns, Field::Visible]);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let store = Store::new();
        let count = Rc::new(Cell::new(0usize));

        let sink = Rc::clone(&count);
        let id = store.subscribe(move |_| sink.set(sink.get() + 1));

        store.set_visible(true);
        assert_eq!(count.get(), 1);

        assert!(store.unsubscribe(id));
        store.set_visible(false);
        assert_eq!(count.get(), 1);

        // Unknown id is reported, not an error.
        assert!(!store.unsubscribe(id));
    }

    #[test]
    fn ragged_rows_are_accepted_unchecked() {
        let store = Store::new();
        store.set_columns(vec!["a".to_string()]);

        // Keys disjoint from columns and mismatched lengths go through as is.
        let mut rows = HashMap::new();
        rows.insert("zz".to_string(), vec!["1".to_string()]);
        rows.insert("a".to_string(), Vec::new());
        store.set_rows(rows.clone());
        assert_eq!(store.rows(), rows);
    }

    #[test]
    fn last_update_moves_forward_on_writes() {
        let store = Store::new();
        let t0 = store.last_update();
        store.set_visible(true);
        assert!(store.last_update() >= t0);
    }

    #[test]
    fn show_two_column_table() {
        let store = Store::new();
        assert!(!store.visible());

        store.set_columns(vec!["Name".to_string(), "Age".to_string()]);
        assert_eq!(
            store.columns(),
            vec!["Name".to_string(), "Age".to_string()]
        );

        let mut rows = HashMap::new();
        rows.insert(
            "Name".to_string(),
            vec!["Alice".to_string(), "Bob".to_string()],
        );
        rows.insert("Age".to_string(), vec!["30".to_string(), "25".to_string()]);
        store.set_rows(rows);
        assert_eq!(
            store.column("Age"),
            Some(vec!["30".to_string(), "25".to_string()])
        );

        store.set_visible(true);
        assert!(store.visible());
    }
}
