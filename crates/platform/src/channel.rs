//! Unbounded multi-producer, single-consumer FIFO channel.
//!
//! This is the two-lock queue of Michael and Scott. The list always holds a
//! dummy node at the head; the first real value lives in `head.next`. The head
//! and tail are guarded by two separate mutexes, so producers only ever
//! contend with each other and never with the consumer.
//!
//! # Example
//! ```
//! let (tx, rx) = modeler_platform::channel();
//! tx.push(1);
//! tx.push(2);
//! assert_eq!(rx.try_pop(), Some(1));
//! assert_eq!(rx.try_pop(), Some(2));
//! assert_eq!(rx.try_pop(), None);
//! ```

use std::cell::UnsafeCell;
use std::marker::PhantomData;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

struct Node<T> {
    value: UnsafeCell<Option<T>>,
    next: AtomicPtr<Node<T>>,
}

impl<T> Node<T> {
    fn alloc(value: Option<T>) -> *mut Node<T> {
        Box::into_raw(Box::new(Node {
            value: UnsafeCell::new(value),
            next: AtomicPtr::new(ptr::null_mut()),
        }))
    }
}

/// Raw node pointer stored behind a mutex.
struct NodePtr<T>(*mut Node<T>);

struct Queue<T> {
    head: Mutex<NodePtr<T>>,
    tail: Mutex<NodePtr<T>>,
}

// SAFETY: nodes are only reachable through `head` and `tail`, each guarded by
// its own mutex. A value is written before its node is published with a
// Release store and taken by the consumer after an Acquire load, so moving
// `T` between threads is the only requirement.
unsafe impl<T: Send> Send for Queue<T> {}
unsafe impl<T: Send> Sync for Queue<T> {}

fn lock<U>(mutex: &Mutex<U>) -> MutexGuard<'_, U> {
    // Critical sections below never panic, so a poisoned lock still guards a
    // consistent list.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T> Queue<T> {
    fn new() -> Self {
        let dummy = Node::alloc(None);
        Self {
            head: Mutex::new(NodePtr(dummy)),
            tail: Mutex::new(NodePtr(dummy)),
        }
    }

    fn push(&self, value: T) {
        let node = Node::alloc(Some(value));

        let mut tail = lock(&self.tail);
        // SAFETY: the tail node is alive. The consumer frees a node only after
        // it has a successor, and the tail node has none until the store below.
        unsafe {
            (*tail.0).next.store(node, Ordering::Release);
        }
        tail.0 = node;
    }

    fn try_pop(&self) -> Option<T> {
        let old_head = {
            let mut head = lock(&self.head);
            let dummy = head.0;

            // SAFETY: the head node is alive; only this critical section frees it.
            let next = unsafe { (*dummy).next.load(Ordering::Acquire) };
            if next.is_null() {
                return None;
            }

            // SAFETY: `next` was published by a producer after its value was
            // written. Only the holder of the head lock touches the value of the
            // node after the dummy.
            let value = unsafe { (*(*next).value.get()).take() };
            head.0 = next;
            (dummy, value)
        };

        let (dummy, value) = old_head;
        // SAFETY: the old dummy is unreachable from both head and tail now, and
        // no producer reads it once its `next` is set.
        unsafe {
            drop(Box::from_raw(dummy));
        }
        value
    }

    fn is_empty(&self) -> bool {
        let head = lock(&self.head);
        // SAFETY: the head node is alive while the head lock is held.
        unsafe { (*head.0).next.load(Ordering::Acquire).is_null() }
    }
}

impl<T> Drop for Queue<T> {
    fn drop(&mut self) {
        let mut current = self
            .head
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .0;
        while !current.is_null() {
            // SAFETY: `&mut self` means no other handle exists; every node in
            // the list was allocated by `Node::alloc` and is freed exactly once.
            let node = unsafe { Box::from_raw(current) };
            current = node.next.load(Ordering::Relaxed);
        }
    }
}

/// Producer half of the channel. Cheap to clone; any number may push concurrently.
pub struct Sender<T> {
    queue: Arc<Queue<T>>,
}

impl<T> Clone for Sender<T> {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
        }
    }
}

impl<T: Send> Sender<T> {
    /// Append a value. Never blocks on the consumer and never fails.
    pub fn push(&self, value: T) {
        self.queue.push(value);
    }
}

/// Consumer half of the channel. There is exactly one per channel.
pub struct Receiver<T> {
    queue: Arc<Queue<T>>,
    // Not Sync: the dequeue side must have a single caller.
    _not_sync: PhantomData<std::cell::Cell<()>>,
}

impl<T: Send> Receiver<T> {
    /// Take the oldest value, or `None` if the channel is empty. Never blocks
    /// on producers.
    pub fn try_pop(&self) -> Option<T> {
        self.queue.try_pop()
    }

    /// Iterate over every value currently queued without blocking.
    pub fn drain(&self) -> impl Iterator<Item = T> + '_ {
        std::iter::from_fn(move || self.try_pop())
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Create a new channel.
pub fn channel<T: Send>() -> (Sender<T>, Receiver<T>) {
    let queue = Arc::new(Queue::new());
    tracing::trace!("Event channel created");
    (
        Sender {
            queue: Arc::clone(&queue),
        },
        Receiver {
            queue,
            _not_sync: PhantomData,
        },
    )
}
