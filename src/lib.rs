#![doc = include_str!("../README.md")]

#[allow(unused_imports)]
#[cfg(not(feature = "loom"))]
pub(crate) use std::{
    hint,
    sync::{self, atomic},
    thread,
};

#[allow(unused_imports)]
#[cfg(feature = "loom")]
pub(crate) use loom::{
    hint,
    sync::{self, atomic},
    thread,
};

#[allow(unused_macros)]
macro_rules! _field {
    ($ty:ty, $ptr:expr, $($path:tt).+) => {
        $ptr.byte_add(core::mem::offset_of!($ty, $($path).+))
    };

    ($ty:ty, $ptr:expr, $($path:tt).+, $field_ty:ty) => {
        $ptr.byte_add(core::mem::offset_of!($ty, $($path).+)).cast::<$field_ty>()
    };
}

mod backoff;
mod error;
mod padded;
mod park;

pub mod mpmc;
pub mod spsc;

pub use backoff::Snoozer;
pub use error::{RecvError, SendError, TryRecvError, TrySendError};
