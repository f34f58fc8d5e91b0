//! Key derivation: turning an argument tuple into a canonical lookup key
//!
//! Arguments are first deep-copied into an immutable snapshot (callables are
//! dropped, shared nodes are followed with cycle detection) and the snapshot
//! is then rendered as compact JSON. Structurally equal argument lists render
//! to the same string.

use std::cell::{Ref, RefCell, RefMut};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;
use ahash::RandomState;
use serde_json::{Map, Value};

/// Canonical key for an argument tuple
pub type KeyString = String;

/// Opaque function value passed as an argument.
///
/// Callables are handed to the memoized computation like any other argument
/// but never take part in key derivation.
#[derive(Clone)]
pub struct Callable(Rc<dyn Fn(&[Arg]) -> Arg>);

impl Callable {
    /// Wrap a closure
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Arg]) -> Arg + 'static,
    {
        Self(Rc::new(f))
    }

    /// Call the wrapped closure
    pub fn call(&self, args: &[Arg]) -> Arg {
        (self.0)(args)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callable({:p})", Rc::as_ptr(&self.0))
    }
}

/// Mutable node that may be referenced from several places, including itself.
///
/// Reference cycles built from shared nodes are never reclaimed; break them
/// by hand if that matters.
#[derive(Clone)]
pub struct SharedArg(Rc<RefCell<Arg>>);

impl SharedArg {
    /// Create a new shared node
    pub fn new(arg: Arg) -> Self {
        Self(Rc::new(RefCell::new(arg)))
    }

    /// Borrow the node's value
    pub fn borrow(&self) -> Ref<'_, Arg> {
        self.0.borrow()
    }

    /// Mutably borrow the node's value
    pub fn borrow_mut(&self) -> RefMut<'_, Arg> {
        self.0.borrow_mut()
    }

    fn identity(&self) -> *const RefCell<Arg> {
        Rc::as_ptr(&self.0)
    }
}

impl fmt::Debug for SharedArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedArg({:p})", self.identity())
    }
}

/// A single call argument
#[derive(Debug, Clone)]
pub enum Arg {
    /// Absent value
    Null,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Unsigned integer; values that fit in `i64` key the same as `Int`
    UInt(u64),
    /// Floating point number
    Float(f64),
    /// UTF-8 string
    Str(String),
    /// Ordered sequence
    List(Vec<Arg>),
    /// String-keyed record
    Map(BTreeMap<String, Arg>),
    /// Aliasable node
    Shared(SharedArg),
    /// Function value, excluded from keys
    Callable(Callable),
}

impl Arg {
    /// Wrap a value in a fresh shared node
    pub fn shared(arg: Arg) -> Self {
        Arg::Shared(SharedArg::new(arg))
    }

    /// Integer value, if this is an `Int` or an `i64`-sized `UInt`
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Arg::Int(n) => Some(*n),
            Arg::UInt(n) => i64::try_from(*n).ok(),
            _ => None,
        }
    }

    /// Numeric value of any number, possibly rounded
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Arg::Int(n) => Some(*n as f64),
            Arg::UInt(n) => Some(*n as f64),
            Arg::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// String slice, if this is a `Str`
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Arg::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for Arg {
    fn from(b: bool) -> Self {
        Arg::Bool(b)
    }
}

impl From<i64> for Arg {
    fn from(n: i64) -> Self {
        Arg::Int(n)
    }
}

impl From<i32> for Arg {
    fn from(n: i32) -> Self {
        Arg::Int(n as i64)
    }
}

impl From<u64> for Arg {
    fn from(n: u64) -> Self {
        Arg::UInt(n)
    }
}

impl From<f64> for Arg {
    fn from(x: f64) -> Self {
        Arg::Float(x)
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Arg::Str(s.to_string())
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Arg::Str(s)
    }
}

impl From<Vec<Arg>> for Arg {
    fn from(items: Vec<Arg>) -> Self {
        Arg::List(items)
    }
}

impl From<Callable> for Arg {
    fn from(c: Callable) -> Self {
        Arg::Callable(c)
    }
}

/// JSON integers outside the `u64`/`i64` range are already floats by the
/// time `serde_json` hands them over.
impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Arg::Null,
            Value::Bool(b) => Arg::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Arg::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Arg::UInt(u)
                } else {
                    Arg::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => Arg::Str(s),
            Value::Array(items) => Arg::List(items.into_iter().map(Arg::from).collect()),
            Value::Object(fields) => {
                Arg::Map(fields.into_iter().map(|(k, v)| (k, Arg::from(v))).collect())
            }
        }
    }
}

/// Immutable deep copy of an argument with callables removed
#[derive(Debug, Clone, PartialEq)]
enum Snapshot {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    List(Vec<Snapshot>),
    Map(BTreeMap<String, Snapshot>),
    /// Back-reference to an enclosing shared node; 0 is the nearest one
    Cycle(usize),
}

/// One deep-copy pass.
///
/// `in_progress` maps each shared node currently being copied (by identity)
/// to its nesting depth, so re-entering it yields a back-reference instead
/// of recursing forever.
struct Snapshotter {
    in_progress: HashMap<*const RefCell<Arg>, usize, RandomState>,
    depth: usize,
}

impl Snapshotter {
    fn new() -> Self {
        Self {
            in_progress: HashMap::with_hasher(RandomState::new()),
            depth: 0,
        }
    }

    fn copy_all(&mut self, args: &[Arg]) -> Vec<Snapshot> {
        args.iter().filter_map(|arg| self.copy(arg)).collect()
    }

    fn copy(&mut self, arg: &Arg) -> Option<Snapshot> {
        let snapshot = match arg {
            Arg::Callable(_) => return None,
            Arg::Null => Snapshot::Null,
            Arg::Bool(b) => Snapshot::Bool(*b),
            Arg::Int(n) => Snapshot::Int(*n),
            Arg::UInt(n) => match i64::try_from(*n) {
                Ok(i) => Snapshot::Int(i),
                Err(_) => Snapshot::UInt(*n),
            },
            Arg::Float(x) => Snapshot::Float(*x),
            Arg::Str(s) => Snapshot::Str(s.clone()),
            Arg::List(items) => Snapshot::List(self.copy_all(items)),
            Arg::Map(fields) => Snapshot::Map(
                fields
                    .iter()
                    .filter_map(|(k, v)| self.copy(v).map(|copy| (k.clone(), copy)))
                    .collect(),
            ),
            Arg::Shared(node) => {
                let identity = node.identity();
                if let Some(&depth) = self.in_progress.get(&identity) {
                    return Some(Snapshot::Cycle(self.depth - depth));
                }

                self.depth += 1;
                self.in_progress.insert(identity, self.depth);
                let inner = self.copy(&node.borrow());
                self.in_progress.remove(&identity);
                self.depth -= 1;
                return inner;
            }
        };
        Some(snapshot)
    }
}

impl Snapshot {
    fn to_json(&self) -> Value {
        match self {
            Snapshot::Null => Value::Null,
            Snapshot::Bool(b) => Value::Bool(*b),
            Snapshot::Int(n) => Value::from(*n),
            Snapshot::UInt(n) => Value::from(*n),
            Snapshot::Float(x) if x.is_finite() => Value::from(*x),
            Snapshot::Float(x) => tagged("$float", Value::String(x.to_string())),
            Snapshot::Str(s) => Value::String(s.clone()),
            Snapshot::List(items) => Value::Array(items.iter().map(Snapshot::to_json).collect()),
            Snapshot::Map(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (escape_field(k), v.to_json()))
                    .collect(),
            ),
            Snapshot::Cycle(distance) => tagged("$cycle", Value::from(*distance)),
        }
    }
}

/// Prefix `$`-leading field names with another `$` so no user map can spell
/// a tag
fn escape_field(name: &str) -> String {
    if name.starts_with('$') {
        format!("${}", name)
    } else {
        name.to_string()
    }
}

fn tagged(tag: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(tag.to_string(), value);
    Value::Object(map)
}

/// Derive the lookup key for an argument tuple.
///
/// Callable arguments are excluded at every nesting level; everything else
/// contributes in order.
///
/// A shared node reached more than once outside a cycle is expanded at each
/// occurrence, so the key grows with the fully unfolded argument tree. Deeply
/// nested aliasing (a chain of nodes each referencing the next twice) yields
/// keys exponential in the chain length.
pub fn derive_key(args: &[Arg]) -> KeyString {
    let snapshot = Snapshotter::new().copy_all(args);
    Value::Array(snapshot.iter().map(Snapshot::to_json).collect()).to_string()
}
