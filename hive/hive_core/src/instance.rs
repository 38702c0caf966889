//! Type-erased instances.
//!
//! The registry cannot know concrete component types, so it stores a
//! [`Constructor`]: a closure turning a declaration's raw `Options` and `Refs`
//! into a ready [`Instance`]. [`constructor`] derives one from a typed factory.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::capability::{Binder, Exports, Refs};
use crate::component::{Base, Component, Identity};
use crate::context::Context;
use crate::error::{BindError, SetupError};

/// Raw declaration data handed to a constructor.
#[derive(Debug, Clone)]
pub struct Setup<'a> {
    /// Identity of the instance being built
    pub identity: Identity,

    /// Raw `Options`; `Null` when the declaration has none
    pub options: &'a Value,

    /// Raw `Refs`: label to target UUID
    pub refs: &'a BTreeMap<String, String>,
}

/// Builds one instance from a declaration.
pub type Constructor =
    Arc<dyn Fn(Setup<'_>) -> Result<Arc<dyn Instance>, SetupError> + Send + Sync>;

/// What the runtime holds for each declared instance.
#[async_trait]
pub trait Instance: Send + Sync {
    fn identity(&self) -> &Identity;

    /// Capabilities the instance exports.
    fn exports(&self) -> &Exports;

    /// Bind the instance's references.
    fn bind(&self, binder: &mut Binder<'_>) -> Result<(), BindError>;

    async fn init(&self, ctx: &Context) -> anyhow::Result<()>;

    async fn start(&self, ctx: &Context) -> anyhow::Result<()>;

    async fn shutdown(&self, ctx: &Context) -> anyhow::Result<()>;

    async fn uninit(&self, ctx: &Context) -> anyhow::Result<()>;
}

struct Managed<C> {
    component: Arc<C>,
    exports: Exports,
}

#[async_trait]
impl<C: Component> Instance for Managed<C> {
    fn identity(&self) -> &Identity {
        self.component.base().identity()
    }

    fn exports(&self) -> &Exports {
        &self.exports
    }

    fn bind(&self, binder: &mut Binder<'_>) -> Result<(), BindError> {
        self.component.base().refs().bind(binder)
    }

    async fn init(&self, ctx: &Context) -> anyhow::Result<()> {
        self.component.init(ctx).await
    }

    async fn start(&self, ctx: &Context) -> anyhow::Result<()> {
        self.component.start(ctx).await
    }

    async fn shutdown(&self, ctx: &Context) -> anyhow::Result<()> {
        self.component.shutdown(ctx).await
    }

    async fn uninit(&self, ctx: &Context) -> anyhow::Result<()> {
        self.component.uninit(ctx).await
    }
}

/// Derive a [`Constructor`] from a factory that wraps a decoded [`Base`].
///
/// # Arguments
///
/// * `factory` - Builds the component around its base. Called once per
///   declaration that names the component.
///
/// # Returns
///
/// A constructor decoding `Options` (null yields the default value) and
/// `Refs`, then publishing the component's exports.
pub fn constructor<C, F>(factory: F) -> Constructor
where
    C: Component,
    F: Fn(Base<C::Options, C::Refs>) -> C + Send + Sync + 'static,
{
    let build = move |setup: Setup<'_>| -> Result<Arc<dyn Instance>, SetupError> {
        let options = if setup.options.is_null() {
            C::Options::default()
        } else {
            <C::Options as Deserialize>::deserialize(setup.options).map_err(SetupError::Options)?
        };

        let raw_refs = Value::Object(
            setup
                .refs
                .iter()
                .map(|(label, uuid)| (label.clone(), Value::String(uuid.clone())))
                .collect(),
        );
        let refs = <C::Refs as Deserialize>::deserialize(&raw_refs).map_err(SetupError::Refs)?;

        let component = Arc::new(factory(Base::new(setup.identity, options, refs)));
        let mut exports = Exports::new();
        C::export(&component, &mut exports);

        Ok(Arc::new(Managed { component, exports }))
    };
    Arc::new(build)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{Capability, NoRefs, Reference, Resolve};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    trait Counter: Send + Sync {
        fn count(&self) -> usize;
    }

    impl Capability for dyn Counter {
        const NAME: &'static str = "test.counter";
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct CounterOptions {
        start: usize,
    }

    struct CounterComponent {
        base: Base<CounterOptions>,
        hits: AtomicUsize,
    }

    impl Counter for CounterComponent {
        fn count(&self) -> usize {
            self.base.options().start + self.hits.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Component for CounterComponent {
        type Options = CounterOptions;
        type Refs = NoRefs;

        fn base(&self) -> &Base<CounterOptions> {
            &self.base
        }

        fn export(this: &Arc<Self>, exports: &mut Exports) {
            exports.export::<dyn Counter>(this.clone());
        }

        async fn start(&self, _ctx: &Context) -> anyhow::Result<()> {
            self.hits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Debug, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct ReaderRefs {
        #[serde(rename = "Counter")]
        counter: Reference<dyn Counter>,
    }

    impl Refs for ReaderRefs {
        fn bind(&self, binder: &mut Binder<'_>) -> Result<(), BindError> {
            binder.bind("Counter", &self.counter)
        }
    }

    struct Reader {
        base: Base<(), ReaderRefs>,
    }

    impl Component for Reader {
        type Options = ();
        type Refs = ReaderRefs;

        fn base(&self) -> &Base<(), ReaderRefs> {
            &self.base
        }
    }

    fn counter_constructor() -> Constructor {
        constructor(|base: Base<CounterOptions>| CounterComponent {
            base,
            hits: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_constructor_decodes_options_and_exports() {
        let ctor = counter_constructor();
        let options = json!({ "start": 10 });
        let refs = BTreeMap::new();
        let instance = ctor(Setup {
            identity: Identity::new("counter", ""),
            options: &options,
            refs: &refs,
        })
        .unwrap();

        assert_eq!(instance.identity().uuid, "counter");
        let counter = instance.exports().get::<dyn Counter>().unwrap();
        assert_eq!(counter.count(), 10);

        instance.start(&Context::background()).await.unwrap();
        assert_eq!(counter.count(), 11);
    }

    #[test]
    fn test_null_options_use_default() {
        let ctor = counter_constructor();
        let refs = BTreeMap::new();
        let instance = ctor(Setup {
            identity: Identity::new("counter", ""),
            options: &Value::Null,
            refs: &refs,
        })
        .unwrap();
        let counter = instance.exports().get::<dyn Counter>().unwrap();
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn test_bad_options_and_refs_are_rejected() {
        let ctor = counter_constructor();
        let refs = BTreeMap::new();
        let options = json!({ "start": "ten" });
        let err = ctor(Setup {
            identity: Identity::new("counter", ""),
            options: &options,
            refs: &refs,
        })
        .err()
        .unwrap();
        assert!(matches!(err, SetupError::Options(_)));

        let reader = constructor(|base: Base<(), ReaderRefs>| Reader { base });
        let refs = BTreeMap::from([("Typo".to_string(), "counter".to_string())]);
        let err = reader(Setup {
            identity: Identity::new("reader", ""),
            options: &Value::Null,
            refs: &refs,
        })
        .err()
        .unwrap();
        assert!(matches!(err, SetupError::Refs(_)));
    }

    #[test]
    fn test_instance_binds_refs() {
        struct One(Exports);

        impl Resolve for One {
            fn resolve(&self, uuid: &str) -> Option<&Exports> {
                (uuid == "counter").then_some(&self.0)
            }
        }

        let refs = BTreeMap::new();
        let counter = counter_constructor()(Setup {
            identity: Identity::new("counter", ""),
            options: &Value::Null,
            refs: &refs,
        })
        .unwrap();
        let mut exports = Exports::new();
        exports.export::<dyn Counter>(counter.exports().get::<dyn Counter>().unwrap());
        let resolver = One(exports);

        let refs = BTreeMap::from([("Counter".to_string(), "counter".to_string())]);
        let reader = constructor(|base: Base<(), ReaderRefs>| Reader { base })(Setup {
            identity: Identity::new("reader", ""),
            options: &Value::Null,
            refs: &refs,
        })
        .unwrap();
        reader.bind(&mut Binder::new(&resolver)).unwrap();
    }
}
