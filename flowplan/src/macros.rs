//! The `module!` declaration macro.
//!
//! A declaration names the generated module struct, the user functor type,
//! and the ordered argument list; optional clauses fix the extra-run-argument
//! type (`extra = T;`) and the constructor-argument type with a constructor
//! expression (`ctor = T, |c| ...;`). The expansion produces the
//! struct-of-arguments, a [`ModuleType`](crate::module::ModuleType) impl with
//! a once-built signature, and the [`Module`](crate::module::Module)
//! resolve/invoke trampolines.
//!
//! The user functor exposes `run(&mut self, args…, extra: &mut X)` with the
//! declared arguments in order: inputs by value (their types must be `Clone`),
//! outputs by `&mut`. Without a `ctor` clause the functor is built with
//! `Default::default()`.
//!
//! ```
//! use flowplan::module::ModuleResult;
//!
//! #[derive(Default)]
//! struct Add;
//!
//! impl Add {
//!     fn run(&mut self, a: i64, b: i64, c: &mut i64, _extra: &mut ()) -> ModuleResult {
//!         *c = a + b;
//!         Ok(())
//!     }
//! }
//!
//! flowplan::module! {
//!     /// Sums two input channels.
//!     pub struct AddModule(Add);
//!     args {
//!         in  a: i64,
//!         in  b: i64,
//!         out c: i64 = 0,
//!     }
//! }
//! ```

/// Declares a module type: generated struct, signature, and trampolines.
#[macro_export]
macro_rules! module {
    // Entry arms normalize the optional clauses, then delegate to @define.
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident($functor:ty);
        args { $($args:tt)* }
    ) => {
        $crate::module! {
            @define
            meta { $(#[$meta])* }
            vis { $vis }
            name { $name }
            functor { $functor }
            extra { () }
            ctor { () }
            make { |_ctor: &()| <$functor as ::core::default::Default>::default() }
            args { $($args)* }
        }
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident($functor:ty);
        extra = $extra:ty;
        args { $($args:tt)* }
    ) => {
        $crate::module! {
            @define
            meta { $(#[$meta])* }
            vis { $vis }
            name { $name }
            functor { $functor }
            extra { $extra }
            ctor { () }
            make { |_ctor: &()| <$functor as ::core::default::Default>::default() }
            args { $($args)* }
        }
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident($functor:ty);
        ctor = $ctor:ty, $make:expr;
        args { $($args:tt)* }
    ) => {
        $crate::module! {
            @define
            meta { $(#[$meta])* }
            vis { $vis }
            name { $name }
            functor { $functor }
            extra { () }
            ctor { $ctor }
            make { $make }
            args { $($args)* }
        }
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident($functor:ty);
        extra = $extra:ty;
        ctor = $ctor:ty, $make:expr;
        args { $($args:tt)* }
    ) => {
        $crate::module! {
            @define
            meta { $(#[$meta])* }
            vis { $vis }
            name { $name }
            functor { $functor }
            extra { $extra }
            ctor { $ctor }
            make { $make }
            args { $($args)* }
        }
    };

    (
        @define
        meta { $(#[$meta:meta])* }
        vis { $vis:vis }
        name { $name:ident }
        functor { $functor:ty }
        extra { $extra:ty }
        ctor { $ctor:ty }
        make { $make:expr }
        args { $( $dir:tt $arg:ident : $ty:ty $(= $default:expr)? ),* $(,)? }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            id: ::std::string::String,
            func: $functor,
            index_table: $crate::__private::FxHashMap<&'static str, usize>,
        }

        impl $name {
            fn slot(&self, arg: &'static str) -> ::core::result::Result<usize, $crate::module::ModuleError> {
                self.index_table.get(arg).copied().ok_or_else(|| {
                    $crate::module::ModuleError::Unresolved {
                        module: self.id.clone(),
                        arg,
                    }
                })
            }
        }

        impl $crate::module::ModuleType<$extra, $ctor> for $name {
            fn signature() -> &'static [$crate::signature::ArgSpec] {
                static SIGNATURE: ::std::sync::OnceLock<::std::vec::Vec<$crate::signature::ArgSpec>> =
                    ::std::sync::OnceLock::new();
                SIGNATURE.get_or_init(|| {
                    ::std::vec![
                        $( $crate::module!(@spec $dir $arg : $ty $(= $default)?) ),*
                    ]
                })
            }

            fn instantiate(id: &str, ctor: &$ctor) -> Self {
                let make = $make;
                Self {
                    id: id.to_owned(),
                    func: make(ctor),
                    index_table: $crate::__private::FxHashMap::default(),
                }
            }
        }

        impl $crate::module::Module<$extra> for $name {
            fn id(&self) -> &str {
                &self.id
            }

            fn signature(&self) -> &'static [$crate::signature::ArgSpec] {
                <Self as $crate::module::ModuleType<$extra, $ctor>>::signature()
            }

            fn resolve(
                &mut self,
                bindings: &$crate::__private::FxHashMap<::std::string::String, usize>,
            ) -> ::core::result::Result<(), $crate::module::BindError> {
                $(
                    let slot = bindings.get(::core::stringify!($arg)).copied().ok_or_else(
                        || $crate::module::BindError::MissingBinding {
                            module: self.id.clone(),
                            arg: ::core::stringify!($arg),
                        },
                    )?;
                    self.index_table.insert(::core::stringify!($arg), slot);
                )*
                ::core::result::Result::Ok(())
            }

            fn invoke(
                &mut self,
                slots: &mut $crate::context::ValueContext,
                extra: &mut $extra,
            ) -> ::core::result::Result<(), $crate::module::ModuleError> {
                $crate::__private::tracing::trace!(module = %self.id, "invoking");
                let started = ::std::time::Instant::now();
                $( $crate::module! { @fetch $dir $arg : $ty $(= $default)? ; self, slots } )*
                self.func.run($( $crate::module!(@pass $dir $arg) ),* , extra)?;
                $( $crate::module! { @store $dir $arg ; self, slots } )*
                $crate::__private::tracing::trace!(
                    module = %self.id,
                    elapsed_us = started.elapsed().as_micros() as u64,
                    "invoked"
                );
                ::core::result::Result::Ok(())
            }
        }
    };

    // Per-argument helpers, dispatched on direction.
    (@spec in $arg:ident : $ty:ty) => {
        $crate::signature::ArgSpec::input(
            ::core::stringify!($ty),
            ::core::stringify!($arg),
            ::std::any::TypeId::of::<$ty>(),
        )
    };
    (@spec out $arg:ident : $ty:ty = $default:expr) => {
        $crate::signature::ArgSpec::output(
            ::core::stringify!($ty),
            ::core::stringify!($arg),
            ::core::stringify!($default),
            ::std::any::TypeId::of::<$ty>(),
        )
    };
    (@fetch in $arg:ident : $ty:ty ; $slf:ident, $slots:ident) => {
        let $arg: $ty = $slots.get::<$ty>($slf.slot(::core::stringify!($arg))?)?;
    };
    (@fetch out $arg:ident : $ty:ty = $default:expr ; $slf:ident, $slots:ident) => {
        let mut $arg: $ty = $default;
    };
    (@pass in $arg:ident) => {
        $arg
    };
    (@pass out $arg:ident) => {
        &mut $arg
    };
    (@store in $arg:ident ; $slf:ident, $slots:ident) => {};
    (@store out $arg:ident ; $slf:ident, $slots:ident) => {
        $slots.set($slf.slot(::core::stringify!($arg))?, $arg)?;
    };
}
