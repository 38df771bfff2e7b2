//! Typed in-memory resource values.
//!
//! An [`Immediate`] keeps a value in its native Rust type together with the
//! codec that can turn it into bytes. Integration-aware hosts read the value
//! directly through [`Immediate::downcast`]; the codec only runs when
//! something (a dump, a byte-oriented host) demands literal bytes.

use std::any::{type_name, Any};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;

use crate::error::BoxError;

/// Encodes values of type `T` into their persisted byte form.
///
/// Implementations must not depend on any other store state.
pub trait ImmediateCodec<T>: Send + Sync + 'static {
    fn encode(&self, value: &T) -> Result<Vec<u8>, BoxError>;
}

impl<T, F> ImmediateCodec<T> for F
where
    F: Fn(&T) -> Result<Vec<u8>, BoxError> + Send + Sync + 'static,
{
    fn encode(&self, value: &T) -> Result<Vec<u8>, BoxError> {
        self(value)
    }
}

/// Pretty-printed JSON via `serde_json`.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl<T: Serialize> ImmediateCodec<T> for JsonCodec {
    fn encode(&self, value: &T) -> Result<Vec<u8>, BoxError> {
        Ok(serde_json::to_vec_pretty(value)?)
    }
}

/// Codec for values that only exist in typed form.
///
/// Encoding always fails, so dumping a pack that holds one is an error.
pub struct HostOnly<T>(PhantomData<fn(&T)>);

impl<T> HostOnly<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for HostOnly<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> ImmediateCodec<T> for HostOnly<T> {
    fn encode(&self, _value: &T) -> Result<Vec<u8>, BoxError> {
        Err(format!("{} has no byte encoding", type_name::<T>()).into())
    }
}

type Encoder = dyn Fn(&(dyn Any + Send + Sync)) -> Result<Vec<u8>, BoxError> + Send + Sync;

/// A type-erased value plus the codec that encodes it.
#[derive(Clone)]
pub struct Immediate {
    value: Arc<dyn Any + Send + Sync>,
    encoder: Arc<Encoder>,
    type_name: &'static str,
}

impl Immediate {
    pub fn new<T, C>(value: T, codec: C) -> Self
    where
        T: Any + Send + Sync,
        C: ImmediateCodec<T>,
    {
        let encoder = move |any: &(dyn Any + Send + Sync)| match any.downcast_ref::<T>() {
            Some(value) => codec.encode(value),
            None => Err(format!("value is not a {}", type_name::<T>()).into()),
        };
        Self {
            value: Arc::new(value),
            encoder: Arc::new(encoder),
            type_name: type_name::<T>(),
        }
    }

    /// Wrap a serializable value with [`JsonCodec`].
    pub fn json<T>(value: T) -> Self
    where
        T: Serialize + Any + Send + Sync,
    {
        Self::new(value, JsonCodec)
    }

    /// Name of the wrapped value's type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Shared handle to the typed value, bypassing encoding.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.value).downcast::<T>().ok()
    }

    /// Run the codec.
    pub fn encode(&self) -> Result<Vec<u8>, BoxError> {
        (self.encoder)(self.value.as_ref())
    }
}

impl fmt::Debug for Immediate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Immediate")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}
