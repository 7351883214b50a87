use std::{borrow::Cow, sync::OnceLock};

use itertools::Itertools;
use libloading::Library;

use super::{ApiError, Backend, Candidate, Platform};

/// The binding chosen for one backend on one platform.
pub enum Binding<T> {
    /// Calls through to a native driver library.
    Native(NativeBinding<T>),
    /// Fails every call with [`ApiError::NotSupported`] without touching native code.
    NotSupported { backend: Backend, platform: Platform },
}

pub struct NativeBinding<T> {
    backend: Backend,
    platform: Platform,
    libraries: Vec<Cow<'static, str>>,
    loaded: OnceLock<Result<Loaded<T>, ApiError>>,
}

struct Loaded<T> {
    library: Library,
    name: String,
    table: T,
}

impl<T> Binding<T> {
    /// Picks the candidate declared for `platform`. A `library` override replaces the candidate
    /// list and always yields a native binding.
    #[cfg_attr(feature = "trace", tracing::instrument(skip(candidates)))]
    pub fn select(
        backend: Backend,
        platform: Platform,
        candidates: &'static [Candidate],
        library: Option<&str>,
    ) -> Self {
        let libraries: Vec<Cow<'static, str>> = match library {
            Some(library) => vec![Cow::Owned(library.to_owned())],
            None => match candidates.iter().find(|x| x.platform == platform) {
                Some(candidate) => candidate.libraries.iter().map(|&x| x.into()).collect(),
                None => {
                    log::info!("{backend} binding: not supported on {platform}");
                    return Self::NotSupported { backend, platform };
                }
            },
        };

        log::info!(
            "{backend} binding: {platform}, libraries [{}]",
            libraries.iter().format(", ")
        );
        Self::Native(NativeBinding {
            backend,
            platform,
            libraries,
            loaded: OnceLock::new(),
        })
    }

    #[inline]
    pub fn backend(&self) -> Backend {
        match self {
            Binding::Native(native) => native.backend,
            Binding::NotSupported { backend, .. } => *backend,
        }
    }

    #[inline]
    pub fn platform(&self) -> Platform {
        match self {
            Binding::Native(native) => native.platform,
            Binding::NotSupported { platform, .. } => *platform,
        }
    }

    #[inline]
    pub fn is_supported(&self) -> bool {
        matches!(self, Binding::Native(_))
    }

    /// Library names tried when the driver is loaded, in order.
    pub fn libraries(&self) -> Vec<&str> {
        match self {
            Binding::Native(native) => native.libraries.iter().map(AsRef::as_ref).collect(),
            Binding::NotSupported { .. } => vec![],
        }
    }

    /// Name of the library that was opened, if the driver has been loaded successfully.
    pub fn loaded_library(&self) -> Option<&str> {
        match self {
            Binding::Native(native) => match native.loaded.get() {
                Some(Ok(loaded)) => Some(&loaded.name),
                _ => None,
            },
            Binding::NotSupported { .. } => None,
        }
    }

    fn not_supported(&self) -> ApiError {
        ApiError::NotSupported {
            backend: self.backend(),
            platform: self.platform(),
        }
    }
}

impl<T: Default> Binding<T> {
    /// Loads the driver library if it isn't yet.
    pub fn probe(&self) -> Result<(), ApiError> {
        match self {
            Binding::Native(native) => native.load().map(|_| ()),
            Binding::NotSupported { .. } => Err(self.not_supported()),
        }
    }

    /// Resolves the entry point `name` and caches it in the slot `select` picks from the table.
    ///
    /// `F` must be the function pointer type the driver declares for `name`.
    pub fn symbol<F, S>(&self, name: &'static str, select: S) -> Result<F, ApiError>
    where
        F: Copy,
        S: FnOnce(&T) -> &OnceLock<Result<F, ApiError>>,
    {
        match self {
            Binding::Native(native) => native.symbol(name, select),
            Binding::NotSupported { .. } => Err(self.not_supported()),
        }
    }
}

impl<T: Default> NativeBinding<T> {
    fn load(&self) -> Result<&Loaded<T>, ApiError> {
        self.loaded
            .get_or_init(|| self.open())
            .as_ref()
            .map_err(Clone::clone)
    }

    #[cfg_attr(feature = "trace", tracing::instrument(skip(self), fields(backend = %self.backend)))]
    fn open(&self) -> Result<Loaded<T>, ApiError> {
        let backend = self.backend;
        let mut reasons = Vec::with_capacity(self.libraries.len());
        for name in &self.libraries {
            // SAFETY: opening a driver library runs its initialization routines, which the
            // driver vendors allow from any thread.
            match unsafe { Library::new(&**name) } {
                Ok(library) => {
                    log::info!("{backend} driver loaded from {name}");
                    return Ok(Loaded {
                        library,
                        name: name.to_string(),
                        table: T::default(),
                    });
                }
                Err(err) => {
                    log::debug!("{backend} driver not loaded from {name}: {err}");
                    reasons.push(format!("{name}: {err}"));
                }
            }
        }

        log::warn!(
            "{backend} driver not found in [{}]",
            self.libraries.iter().format(", ")
        );
        Err(ApiError::Library {
            backend,
            libraries: self.libraries.iter().map(|x| x.to_string()).collect(),
            reason: reasons.join("; "),
        })
    }

    fn symbol<F, S>(&self, name: &'static str, select: S) -> Result<F, ApiError>
    where
        F: Copy,
        S: FnOnce(&T) -> &OnceLock<Result<F, ApiError>>,
    {
        let loaded = self.load()?;
        let slot = select(&loaded.table);
        let symbol = slot.get_or_init(|| {
            // SAFETY: `F` is the declared signature of `name`, and the library outlives the
            // pointer since both are owned by `loaded`.
            match unsafe { loaded.library.get::<F>(name.as_bytes()) } {
                Ok(symbol) => Ok(*symbol),
                Err(err) => Err(ApiError::Symbol {
                    backend: self.backend,
                    symbol: name,
                    reason: err.to_string(),
                }),
            }
        });
        symbol.clone()
    }
}

impl<T> std::fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Binding::Native(native) => f
                .debug_struct("Native")
                .field("backend", &native.backend)
                .field("platform", &native.platform)
                .field("libraries", &native.libraries)
                .field("loaded", &self.loaded_library())
                .finish(),
            Binding::NotSupported { backend, platform } => f
                .debug_struct("NotSupported")
                .field("backend", backend)
                .field("platform", platform)
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::OnceLock;

    use super::Binding;
    use crate::runtime::{ApiError, Backend, Candidate, Platform};

    type Entry = unsafe extern "system" fn() -> i32;

    #[derive(Default)]
    struct Table {
        entry: OnceLock<Result<Entry, ApiError>>,
    }

    const CANDIDATES: &[Candidate] = &[
        Candidate {
            platform: Platform::Linux,
            libraries: &["libweft-missing.so.1", "libweft-missing.so"],
        },
        Candidate {
            platform: Platform::Windows,
            libraries: &["weft-missing.dll"],
        },
    ];

    #[test]
    fn test_select() {
        let binding = Binding::<Table>::select(Backend::Cuda, Platform::Linux, CANDIDATES, None);
        assert!(binding.is_supported());
        assert_eq!(binding.libraries(), ["libweft-missing.so.1", "libweft-missing.so"]);

        let binding = Binding::<Table>::select(Backend::Cuda, Platform::MacOs, CANDIDATES, None);
        assert!(!binding.is_supported());
        assert!(binding.libraries().is_empty());
        assert_eq!(binding.platform(), Platform::MacOs);
    }

    #[test]
    fn test_override() {
        let binding = Binding::<Table>::select(
            Backend::OpenCl,
            Platform::Other,
            CANDIDATES,
            Some("libweft-override.so"),
        );
        assert!(binding.is_supported());
        assert_eq!(binding.libraries(), ["libweft-override.so"]);
    }

    #[test]
    fn test_not_supported() {
        let binding = Binding::<Table>::select(Backend::Cuda, Platform::Other, CANDIDATES, None);
        let expected = ApiError::NotSupported {
            backend: Backend::Cuda,
            platform: Platform::Other,
        };
        assert_eq!(binding.probe(), Err(expected.clone()));
        assert_eq!(
            binding.symbol("entry", |table: &Table| &table.entry),
            Err(expected)
        );
    }

    #[test]
    fn test_missing_library() {
        let binding = Binding::<Table>::select(Backend::Cuda, Platform::Linux, CANDIDATES, None);
        let err = binding.probe().unwrap_err();
        match &err {
            ApiError::Library {
                backend, libraries, ..
            } => {
                assert_eq!(*backend, Backend::Cuda);
                assert_eq!(libraries, &["libweft-missing.so.1", "libweft-missing.so"]);
            }
            err => panic!("unexpected error: {err}"),
        }

        // the failure is cached and handed out again
        assert_eq!(binding.symbol("entry", |table: &Table| &table.entry), Err(err));
        assert_eq!(binding.loaded_library(), None);
    }
}
