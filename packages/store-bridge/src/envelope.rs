//! Versioned wire form of a shared snapshot.

use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::adapter::{Listener, StoreAdapter, Unsubscribe};
use crate::error::{BridgeError, Result};
use crate::state::SharedState;

/// A snapshot tagged with its kind and schema version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub kind: String,
    pub version: u32,
    pub state: serde_json::Value,
}

impl Envelope {
    /// Encode a typed snapshot.
    pub fn encode<T: SharedState>(state: &T) -> Result<Self> {
        Ok(Self {
            kind: T::KIND.to_string(),
            version: T::VERSION,
            state: serde_json::to_value(state)?,
        })
    }

    /// Decode into `T`, checking kind and version.
    pub fn decode<T: SharedState>(&self) -> Result<T> {
        if self.kind != T::KIND {
            return Err(BridgeError::KindMismatch {
                expected: T::KIND.to_string(),
                actual: self.kind.clone(),
            });
        }
        if self.version != T::VERSION {
            return Err(BridgeError::VersionMismatch {
                kind: self.kind.clone(),
                expected: T::VERSION,
                actual: self.version,
            });
        }
        Ok(serde_json::from_value(self.state.clone())?)
    }

    fn decode_or_default<T: SharedState>(&self) -> T {
        self.decode().unwrap_or_else(|error| {
            tracing::warn!(kind = T::KIND, %error, "discarding undecodable snapshot");
            T::default()
        })
    }
}

fn encode_or_placeholder<T: SharedState>(state: &T) -> Envelope {
    Envelope::encode(state).unwrap_or_else(|error| {
        tracing::error!(kind = T::KIND, %error, "failed to encode snapshot");
        Envelope {
            kind: T::KIND.to_string(),
            version: T::VERSION,
            state: serde_json::Value::Null,
        }
    })
}

/// Exposes a typed adapter in wire form. Used on the host side.
pub struct EncodingAdapter<T> {
    inner: Arc<dyn StoreAdapter<T>>,
    cache: Mutex<Option<(Arc<T>, Arc<Envelope>)>>,
}

impl<T: SharedState> EncodingAdapter<T> {
    pub fn new(inner: Arc<dyn StoreAdapter<T>>) -> Self {
        Self {
            inner,
            cache: Mutex::new(None),
        }
    }
}

impl<T: SharedState> StoreAdapter<Envelope> for EncodingAdapter<T> {
    fn get_state(&self) -> Arc<Envelope> {
        let current = self.inner.get_state();
        let mut cache = self.cache.lock();
        if let Some((typed, encoded)) = cache.as_ref() {
            if Arc::ptr_eq(typed, &current) {
                return encoded.clone();
            }
        }
        let encoded = Arc::new(encode_or_placeholder(&*current));
        *cache = Some((current, encoded.clone()));
        encoded
    }

    fn subscribe(&self, listener: Listener<Envelope>) -> Unsubscribe {
        self.inner.subscribe(Arc::new(move |state: &Arc<T>| {
            listener(&Arc::new(encode_or_placeholder(&**state)));
        }))
    }
}

/// Decodes a wire-form adapter into a typed one. Used on the remote side.
///
/// Snapshots of the wrong kind or version decode to `T::default()`.
pub struct EnvelopeAdapter<T> {
    inner: Arc<dyn StoreAdapter<Envelope>>,
    cache: Mutex<Option<(Arc<Envelope>, Arc<T>)>>,
    _state: PhantomData<fn() -> T>,
}

impl<T: SharedState> EnvelopeAdapter<T> {
    pub fn new(inner: Arc<dyn StoreAdapter<Envelope>>) -> Self {
        Self {
            inner,
            cache: Mutex::new(None),
            _state: PhantomData,
        }
    }
}

impl<T: SharedState> StoreAdapter<T> for EnvelopeAdapter<T> {
    fn get_state(&self) -> Arc<T> {
        let current = self.inner.get_state();
        let mut cache = self.cache.lock();
        if let Some((encoded, typed)) = cache.as_ref() {
            if Arc::ptr_eq(encoded, &current) {
                return typed.clone();
            }
        }
        let typed = Arc::new(current.decode_or_default::<T>());
        *cache = Some((current, typed.clone()));
        typed
    }

    fn subscribe(&self, listener: Listener<T>) -> Unsubscribe {
        self.inner.subscribe(Arc::new(move |envelope: &Arc<Envelope>| {
            listener(&Arc::new(envelope.decode_or_default::<T>()));
        }))
    }
}
