//! Resolution of native compute driver bindings.
//!
//! Every backend declares a closed list of [`Candidate`]s, one per operating system family, each
//! naming the shared libraries its driver ships as. At most one instance per backend is resolved
//! for the whole process: the candidate matching the detected [`Platform`] is chosen, or a
//! not-supported stub when no candidate matches. Nothing is loaded at resolution time. The library
//! is opened on the first driver call, and every entry point is looked up on its own first call.
//!
//! The bindings themselves are pure pass-through: a driver call returns the status code of the
//! driver unchanged. [`ApiError`] only reports that a call could not be made at all.

use std::ffi::CStr;

use derive_more::Display;
use itertools::Itertools;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod binding;
mod config;
mod platform;

pub use binding::{Binding, NativeBinding};
pub use config::ApiConfig;
pub use platform::{ParsePlatformError, Platform};

/// A compute driver family with its own native ABI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Backend {
    #[display("CUDA")]
    Cuda,
    #[display("OpenCL")]
    OpenCl,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("{backend} is not supported on {platform}")]
    NotSupported { backend: Backend, platform: Platform },
    #[error("failed to load {backend} driver from [{}]: {reason}", .libraries.iter().format(", "))]
    Library {
        backend: Backend,
        libraries: Vec<String>,
        reason: String,
    },
    #[error("{backend} driver has no entry point {symbol}: {reason}")]
    Symbol {
        backend: Backend,
        symbol: &'static str,
        reason: String,
    },
    #[error("{backend} call {call} failed with {name} ({status})")]
    Driver {
        backend: Backend,
        call: &'static str,
        status: i32,
        name: &'static str,
    },
}

/// The shared libraries a driver is shipped as on one operating system family, in the order they
/// are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub platform: Platform,
    pub libraries: &'static [&'static str],
}

/// A backend interface backed by one [`Binding`].
pub trait RuntimeApi: Sized + Send + Sync + 'static {
    /// Lazily resolved entry points of the driver.
    type Table: Default + Send + Sync;

    const BACKEND: Backend;
    const CANDIDATES: &'static [Candidate];

    fn from_binding(binding: Binding<Self::Table>) -> Self;

    fn binding(&self) -> &Binding<Self::Table>;
}

/// Selects the binding of `A` for the platform in `config`, or for the running platform if it
/// doesn't name one.
#[cfg_attr(feature = "trace", tracing::instrument(skip_all, fields(backend = %A::BACKEND)))]
pub fn load_runtime_api<A: RuntimeApi>(config: &ApiConfig) -> A {
    let platform = config.platform.unwrap_or_else(Platform::current);
    let binding = Binding::select(
        A::BACKEND,
        platform,
        A::CANDIDATES,
        config.library_for(A::BACKEND),
    );
    A::from_binding(binding)
}

/// Reads a nul-terminated string out of a buffer a driver filled.
pub(crate) fn string_from_buffer(buffer: &[u8]) -> String {
    match CStr::from_bytes_until_nul(buffer) {
        Ok(string) => string.to_string_lossy().into_owned(),
        Err(_) => String::from_utf8_lossy(buffer).into_owned(),
    }
}

/// Declares a `#[repr(transparent)]` driver status code with its named values.
macro_rules! status_code {
    (
        $(#[$meta:meta])*
        pub struct $name:ident($prefix:literal) for $backend:path {
            $($(#[doc = $doc:literal])* $code:ident = $value:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(transparent)]
        pub struct $name(pub i32);

        unsafe impl ::bytemuck::Zeroable for $name {}
        unsafe impl ::bytemuck::Pod for $name {}

        impl $name {
            $(
                $(#[doc = $doc])*
                pub const $code: Self = Self($value);
            )+

            #[inline]
            pub const fn is_success(self) -> bool {
                self.0 == 0
            }

            /// Symbolic name of the code as spelled in the driver headers.
            pub const fn name(self) -> Option<&'static str> {
                match self.0 {
                    $($value => Some(concat!($prefix, stringify!($code))),)+
                    _ => None,
                }
            }

            /// Turns a failed status of `call` into [`ApiError::Driver`](crate::runtime::ApiError::Driver).
            pub fn check(self, call: &'static str) -> Result<(), $crate::runtime::ApiError> {
                match self.is_success() {
                    true => Ok(()),
                    false => Err($crate::runtime::ApiError::Driver {
                        backend: $backend,
                        call,
                        status: self.0,
                        name: self.name().unwrap_or("unrecognized status"),
                    }),
                }
            }
        }

        impl From<i32> for $name {
            #[inline]
            fn from(value: i32) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i32 {
            #[inline]
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self.name() {
                    Some(name) => write!(f, "{name} ({})", self.0),
                    None => write!(f, "unrecognized status ({})", self.0),
                }
            }
        }
    };
}

pub(crate) use status_code;

/// Declares a backend interface, its per-platform library candidates and its driver entry points.
///
/// Every entry point becomes an `unsafe` method with the native signature that forwards its
/// arguments and returns whatever the driver returns. The only failures it adds are those of
/// reaching the driver: the not-supported stub, a missing library or a missing symbol.
macro_rules! runtime_api {
    (
        $(#[$meta:meta])*
        pub struct $name:ident($table:ident) for $backend:path {
            $($platform:path => [$($library:literal),+ $(,)?]),+ $(,)?
        }

        $(
            $(#[doc = $doc:literal])*
            fn $method:ident = $symbol:ident($($arg:ident: $ty:ty),* $(,)?) -> $ret:ty;
        )*
    ) => {
        #[doc(hidden)]
        #[allow(non_snake_case)]
        #[derive(Default)]
        pub struct $table {
            $(
                $symbol: ::std::sync::OnceLock<
                    Result<unsafe extern "system" fn($($ty),*) -> $ret, $crate::runtime::ApiError>,
                >,
            )*
        }

        $(#[$meta])*
        #[derive(Debug)]
        pub struct $name($crate::runtime::Binding<$table>);

        impl $crate::runtime::RuntimeApi for $name {
            type Table = $table;

            const BACKEND: $crate::runtime::Backend = $backend;
            const CANDIDATES: &'static [$crate::runtime::Candidate] = &[
                $($crate::runtime::Candidate {
                    platform: $platform,
                    libraries: &[$($library),+],
                }),+
            ];

            #[inline]
            fn from_binding(binding: $crate::runtime::Binding<$table>) -> Self {
                Self(binding)
            }

            #[inline]
            fn binding(&self) -> &$crate::runtime::Binding<$table> {
                &self.0
            }
        }

        impl $name {
            /// The binding of the process, resolved once from [`ApiConfig::from_env`](crate::runtime::ApiConfig::from_env).
            pub fn current() -> &'static Self {
                static CURRENT: ::std::sync::OnceLock<$name> = ::std::sync::OnceLock::new();
                CURRENT.get_or_init(|| {
                    $crate::runtime::load_runtime_api(&$crate::runtime::ApiConfig::from_env())
                })
            }

            /// Resolves an independent binding with `config`.
            pub fn load(config: &$crate::runtime::ApiConfig) -> Self {
                $crate::runtime::load_runtime_api(config)
            }

            /// `false` only for the not-supported stub.
            #[inline]
            pub fn is_supported(&self) -> bool {
                self.0.is_supported()
            }

            #[inline]
            pub fn platform(&self) -> $crate::runtime::Platform {
                self.0.platform()
            }

            /// Opens the driver library without calling into it.
            pub fn probe(&self) -> Result<(), $crate::runtime::ApiError> {
                self.0.probe()
            }

            $(
                $(#[doc = $doc])*
                ///
                /// # Safety
                /// Arguments are handed to the driver unchecked: pointers must be valid for the
                /// access the driver performs and handles must be live objects of this driver.
                #[allow(clippy::too_many_arguments)]
                pub unsafe fn $method(&self, $($arg: $ty),*) -> Result<$ret, $crate::runtime::ApiError> {
                    let f = self.0.symbol(stringify!($symbol), |table: &$table| &table.$symbol)?;
                    Ok(unsafe { f($($arg),*) })
                }
            )*
        }
    };
}

pub(crate) use runtime_api;

#[cfg(test)]
mod tests {
    use super::{ApiError, Backend, Platform, string_from_buffer};

    #[test]
    fn test_backend_display() {
        assert_eq!(Backend::Cuda.to_string(), "CUDA");
        assert_eq!(Backend::OpenCl.to_string(), "OpenCL");
    }

    #[test]
    fn test_string_from_buffer() {
        let mut buffer = [0u8; 16];
        buffer[..6].copy_from_slice(b"Tesla\0");
        assert_eq!(string_from_buffer(&buffer), "Tesla");
        assert_eq!(string_from_buffer(b"no-nul"), "no-nul");
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::NotSupported {
            backend: Backend::OpenCl,
            platform: Platform::Other,
        };
        assert_eq!(err.to_string(), "OpenCL is not supported on other");

        let err = ApiError::Library {
            backend: Backend::Cuda,
            libraries: vec!["libcuda.so.1".into(), "libcuda.so".into()],
            reason: "not found".into(),
        };
        assert_eq!(
            err.to_string(),
            "failed to load CUDA driver from [libcuda.so.1, libcuda.so]: not found"
        );
    }
}
