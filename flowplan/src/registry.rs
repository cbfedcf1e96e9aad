//! Process-wide catalogue of module factories.
//!
//! Module types register here under a name; the plan builder looks the name
//! up and asks the factory for fresh instances. A registry is parameterized
//! by the extra-run-argument type `X` and the extra-constructor-argument type
//! `C`, so a registered module type is only reachable from plans and
//! schedulers that agree on both.
//!
//! [`ModuleRegistry::global`] hands out one lazily-created process-wide
//! registry per `(X, C)` pair. There is no registration before `main`: hosts
//! register their module types explicitly at startup, which keeps
//! initialization order visible.

use crate::module::{Module, ModuleType};
use crate::signature::ArgSpec;
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use std::any::{Any, TypeId};
use std::collections::hash_map::Entry;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, OnceLock, RwLock};
use thiserror::Error;

/// Registration or lookup failed.
#[derive(Debug, Error, Diagnostic)]
pub enum RegistryError {
    /// The name is already taken; entries are never replaced.
    #[error("module \"{name}\" is already registered")]
    #[diagnostic(
        code(flowplan::registry::already_registered),
        help("Each module type name may be registered once per registry.")
    )]
    AlreadyRegistered { name: String },

    /// No factory is registered under the name.
    #[error("module \"{name}\" not found")]
    #[diagnostic(
        code(flowplan::registry::unknown_module),
        help("Register the module type before building plans that use it.")
    )]
    UnknownModule { name: String },
}

/// Creates module instances for one registered type name.
pub trait ModuleFactory<X = (), C = ()>: Send + Sync {
    /// The signature shared by every instance this factory creates.
    fn signature(&self) -> &'static [ArgSpec];

    /// Creates an instance with the given plan-unique id.
    fn create(&self, id: &str, ctor: &C) -> Box<dyn Module<X>>;
}

impl<X, C> std::fmt::Debug for dyn ModuleFactory<X, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleFactory")
            .field("signature", &self.signature())
            .finish()
    }
}

/// The one factory implementation, generic over the declared module type.
///
/// # Examples
///
/// ```
/// use flowplan::module::{Module, ModuleResult};
/// use flowplan::registry::{ModuleFactory, TypedFactory};
///
/// #[derive(Default)]
/// struct Start;
///
/// impl Start {
///     fn run(&mut self, seed: &mut i64, _extra: &mut ()) -> ModuleResult {
///         *seed = 3;
///         Ok(())
///     }
/// }
///
/// flowplan::module! {
///     struct StartModule(Start);
///     args { out seed: i64 = 0 }
/// }
///
/// let factory = TypedFactory::<StartModule>::new();
/// assert_eq!(factory.signature().len(), 1);
/// let module = factory.create("s", &());
/// assert_eq!(module.id(), "s");
/// ```
pub struct TypedFactory<M> {
    _marker: PhantomData<fn() -> M>,
}

impl<M> TypedFactory<M> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<M> Default for TypedFactory<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<X, C, M> ModuleFactory<X, C> for TypedFactory<M>
where
    M: ModuleType<X, C>,
{
    fn signature(&self) -> &'static [ArgSpec] {
        <M as ModuleType<X, C>>::signature()
    }

    fn create(&self, id: &str, ctor: &C) -> Box<dyn Module<X>> {
        Box::new(M::instantiate(id, ctor))
    }
}

/// Mapping from module type name to factory.
///
/// Lookups vastly outnumber insertions, so the map sits behind a
/// reader/writer lock. Names are unique: a second `register` under the same
/// name fails and the first entry stays.
///
/// # Examples
///
/// ```
/// use flowplan::module::ModuleResult;
/// use flowplan::registry::ModuleRegistry;
///
/// #[derive(Default)]
/// struct Start;
///
/// impl Start {
///     fn run(&mut self, seed: &mut i64, _extra: &mut ()) -> ModuleResult {
///         *seed = 3;
///         Ok(())
///     }
/// }
///
/// flowplan::module! {
///     struct StartModule(Start);
///     args { out seed: i64 = 0 }
/// }
///
/// let registry = ModuleRegistry::new();
/// registry.register::<StartModule>("StartModule").unwrap();
/// assert!(registry.find("StartModule").is_ok());
/// assert!(registry.find("Nope").is_err());
/// ```
pub struct ModuleRegistry<X = (), C = ()> {
    factories: RwLock<FxHashMap<String, Arc<dyn ModuleFactory<X, C>>>>,
}

impl<X, C> Default for ModuleRegistry<X, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<X, C> ModuleRegistry<X, C> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: RwLock::new(FxHashMap::default()),
        }
    }

    /// Registers a declared module type under `name`.
    pub fn register<M>(&self, name: impl Into<String>) -> Result<(), RegistryError>
    where
        M: ModuleType<X, C>,
    {
        self.register_factory(name, TypedFactory::<M>::new())
    }

    /// Registers an arbitrary factory under `name`.
    pub fn register_factory(
        &self,
        name: impl Into<String>,
        factory: impl ModuleFactory<X, C> + 'static,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        let mut factories = self.factories.write().expect("registry lock poisoned");
        match factories.entry(name) {
            Entry::Occupied(taken) => Err(RegistryError::AlreadyRegistered {
                name: taken.key().clone(),
            }),
            Entry::Vacant(open) => {
                open.insert(Arc::new(factory));
                Ok(())
            }
        }
    }

    /// Looks up the factory registered under `name`.
    pub fn find(&self, name: &str) -> Result<Arc<dyn ModuleFactory<X, C>>, RegistryError> {
        self.factories
            .read()
            .expect("registry lock poisoned")
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownModule {
                name: name.to_owned(),
            })
    }

    /// Name-sorted snapshot of every registered factory.
    #[must_use]
    pub fn all(&self) -> Vec<(String, Arc<dyn ModuleFactory<X, C>>)> {
        let factories = self.factories.read().expect("registry lock poisoned");
        let mut snapshot: Vec<_> = factories
            .iter()
            .map(|(name, factory)| (name.clone(), Arc::clone(factory)))
            .collect();
        snapshot.sort_by(|a, b| a.0.cmp(&b.0));
        snapshot
    }
}

/// One leaked registry per `(X, C)` pair, created on first access.
static GLOBAL_REGISTRIES: OnceLock<Mutex<FxHashMap<TypeId, &'static (dyn Any + Send + Sync)>>> =
    OnceLock::new();

impl<X: 'static, C: 'static> ModuleRegistry<X, C> {
    /// The process-wide registry for this `(X, C)` pair.
    ///
    /// Entries live for the life of the process; registration through this
    /// handle is how hosts make module types available to
    /// [`Plan::build`](crate::plans::Plan::build).
    #[must_use]
    pub fn global() -> &'static Self {
        let table = GLOBAL_REGISTRIES.get_or_init(|| Mutex::new(FxHashMap::default()));
        let mut table = table.lock().expect("global registry table poisoned");
        let entry = table.entry(TypeId::of::<Self>()).or_insert_with(|| {
            Box::leak(Box::new(Self::new())) as &'static (dyn Any + Send + Sync)
        });
        let registry: &'static (dyn Any + Send + Sync) = *entry;
        drop(table);
        registry
            .downcast_ref::<Self>()
            .expect("global registry table keyed by registry type")
    }
}
