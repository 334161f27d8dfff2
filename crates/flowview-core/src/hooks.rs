//! Named interceptor registries.
//!
//! Every hook keeps an ordered list of named taps. Calling a hook takes a
//! snapshot of the registered taps first, so a tap is free to register more
//! taps or to call back into the component that owns the hook.
//!
//! * [`SyncHook`] runs every tap for its side effects.
//! * [`SyncBailHook`] stops at the first tap returning `Some`.
//! * [`SyncWaterfallHook`] threads a value through every tap.
//! * [`FallibleWaterfallHook`] threads a value and stops on the first `Err`.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

struct Tap<F: ?Sized> {
    name: String,
    callback: Rc<F>,
}

struct TapList<F: ?Sized> {
    taps: RefCell<Vec<Tap<F>>>,
}

impl<F: ?Sized> TapList<F> {
    fn new() -> Self {
        Self {
            taps: RefCell::new(Vec::new()),
        }
    }

    fn push(&self, name: String, callback: Rc<F>) {
        self.taps.borrow_mut().push(Tap { name, callback });
    }

    fn snapshot(&self) -> Vec<Rc<F>> {
        self.taps
            .borrow()
            .iter()
            .map(|tap| Rc::clone(&tap.callback))
            .collect()
    }

    fn names(&self) -> Vec<String> {
        self.taps.borrow().iter().map(|tap| tap.name.clone()).collect()
    }

    fn remove(&self, name: &str) -> usize {
        let mut taps = self.taps.borrow_mut();
        let before = taps.len();
        taps.retain(|tap| tap.name != name);
        before - taps.len()
    }

    fn len(&self) -> usize {
        self.taps.borrow().len()
    }
}

macro_rules! hook_common {
    ($hook:ident) => {
        impl<F: ?Sized> $hook<F> {
            /// Create a hook with no taps
            pub fn new() -> Self {
                Self {
                    taps: TapList::new(),
                }
            }

            /// Names of the registered taps, in call order
            pub fn tap_names(&self) -> Vec<String> {
                self.taps.names()
            }

            /// Whether any tap is registered
            pub fn is_used(&self) -> bool {
                self.taps.len() > 0
            }

            /// Remove every tap registered under `name`, returning how many were removed
            pub fn untap(&self, name: &str) -> usize {
                self.taps.remove(name)
            }
        }

        impl<F: ?Sized> Default for $hook<F> {
            fn default() -> Self {
                Self::new()
            }
        }

        impl<F: ?Sized> fmt::Debug for $hook<F> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($hook))
                    .field("taps", &self.taps.names())
                    .finish()
            }
        }
    };
}

/// Hook whose taps are called in registration order for their side effects
pub struct SyncHook<F: ?Sized> {
    taps: TapList<F>,
}

/// Hook that returns the first `Some` produced by a tap
pub struct SyncBailHook<F: ?Sized> {
    taps: TapList<F>,
}

/// Hook that folds a value through every tap
pub struct SyncWaterfallHook<F: ?Sized> {
    taps: TapList<F>,
}

/// Waterfall hook whose taps may fail; the first error stops the chain
pub struct FallibleWaterfallHook<F: ?Sized> {
    taps: TapList<F>,
}

hook_common!(SyncHook);
hook_common!(SyncBailHook);
hook_common!(SyncWaterfallHook);
hook_common!(FallibleWaterfallHook);

impl<A: ?Sized> SyncHook<dyn Fn(&A)> {
    /// Register a tap
    pub fn tap(&self, name: impl Into<String>, callback: impl Fn(&A) + 'static) {
        self.taps.push(name.into(), Rc::new(callback));
    }

    /// Call every tap
    pub fn call(&self, a: &A) {
        for callback in self.taps.snapshot() {
            callback(a);
        }
    }
}

impl<A: ?Sized, B: ?Sized> SyncHook<dyn Fn(&A, &B)> {
    /// Register a tap
    pub fn tap(&self, name: impl Into<String>, callback: impl Fn(&A, &B) + 'static) {
        self.taps.push(name.into(), Rc::new(callback));
    }

    /// Call every tap
    pub fn call(&self, a: &A, b: &B) {
        for callback in self.taps.snapshot() {
            callback(a, b);
        }
    }
}

impl<A: ?Sized, B: ?Sized, C: ?Sized> SyncHook<dyn Fn(&A, &B, &C)> {
    /// Register a tap
    pub fn tap(&self, name: impl Into<String>, callback: impl Fn(&A, &B, &C) + 'static) {
        self.taps.push(name.into(), Rc::new(callback));
    }

    /// Call every tap
    pub fn call(&self, a: &A, b: &B, c: &C) {
        for callback in self.taps.snapshot() {
            callback(a, b, c);
        }
    }
}

impl<A: ?Sized, R> SyncBailHook<dyn Fn(&A) -> Option<R>> {
    /// Register a tap
    pub fn tap(&self, name: impl Into<String>, callback: impl Fn(&A) -> Option<R> + 'static) {
        self.taps.push(name.into(), Rc::new(callback));
    }

    /// Call taps until one of them bails with a value
    pub fn call(&self, a: &A) -> Option<R> {
        self.taps.snapshot().into_iter().find_map(|callback| callback(a))
    }
}

impl<A: ?Sized, B: ?Sized, R> SyncBailHook<dyn Fn(&A, &B) -> Option<R>> {
    /// Register a tap
    pub fn tap(
        &self,
        name: impl Into<String>,
        callback: impl Fn(&A, &B) -> Option<R> + 'static,
    ) {
        self.taps.push(name.into(), Rc::new(callback));
    }

    /// Call taps until one of them bails with a value
    pub fn call(&self, a: &A, b: &B) -> Option<R> {
        self.taps
            .snapshot()
            .into_iter()
            .find_map(|callback| callback(a, b))
    }
}

impl<T> SyncWaterfallHook<dyn Fn(T) -> T> {
    /// Register a tap
    pub fn tap(&self, name: impl Into<String>, callback: impl Fn(T) -> T + 'static) {
        self.taps.push(name.into(), Rc::new(callback));
    }

    /// Fold `initial` through every tap
    pub fn call(&self, initial: T) -> T {
        self.taps
            .snapshot()
            .into_iter()
            .fold(initial, |acc, callback| callback(acc))
    }
}

impl<T, A: ?Sized> SyncWaterfallHook<dyn Fn(T, &A) -> T> {
    /// Register a tap
    pub fn tap(&self, name: impl Into<String>, callback: impl Fn(T, &A) -> T + 'static) {
        self.taps.push(name.into(), Rc::new(callback));
    }

    /// Fold `initial` through every tap
    pub fn call(&self, initial: T, a: &A) -> T {
        self.taps
            .snapshot()
            .into_iter()
            .fold(initial, |acc, callback| callback(acc, a))
    }
}

impl<T, A: ?Sized, B: ?Sized> SyncWaterfallHook<dyn Fn(T, &A, &B) -> T> {
    /// Register a tap
    pub fn tap(&self, name: impl Into<String>, callback: impl Fn(T, &A, &B) -> T + 'static) {
        self.taps.push(name.into(), Rc::new(callback));
    }

    /// Fold `initial` through every tap
    pub fn call(&self, initial: T, a: &A, b: &B) -> T {
        self.taps
            .snapshot()
            .into_iter()
            .fold(initial, |acc, callback| callback(acc, a, b))
    }
}

impl<T, A: ?Sized, E> FallibleWaterfallHook<dyn Fn(T, &A) -> Result<T, E>> {
    /// Register a tap
    pub fn tap(
        &self,
        name: impl Into<String>,
        callback: impl Fn(T, &A) -> Result<T, E> + 'static,
    ) {
        self.taps.push(name.into(), Rc::new(callback));
    }

    /// Fold `initial` through every tap, stopping at the first error
    pub fn call(&self, initial: T, a: &A) -> Result<T, E> {
        let mut acc = initial;
        for callback in self.taps.snapshot() {
            acc = callback(acc, a)?;
        }
        Ok(acc)
    }
}

impl<T, A: ?Sized, B: ?Sized, E> FallibleWaterfallHook<dyn Fn(T, &A, &B) -> Result<T, E>> {
    /// Register a tap
    pub fn tap(
        &self,
        name: impl Into<String>,
        callback: impl Fn(T, &A, &B) -> Result<T, E> + 'static,
    ) {
        self.taps.push(name.into(), Rc::new(callback));
    }

    /// Fold `initial` through every tap, stopping at the first error
    pub fn call(&self, initial: T, a: &A, b: &B) -> Result<T, E> {
        let mut acc = initial;
        for callback in self.taps.snapshot() {
            acc = callback(acc, a, b)?;
        }
        Ok(acc)
    }
}
