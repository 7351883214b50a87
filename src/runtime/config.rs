use super::{Backend, Platform};

/// Configuration of driver binding resolution.
///
/// The defaults detect the platform of the running process and bind against the standard driver
/// library names of that platform.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Overrides the detected platform.
    pub platform: Option<Platform>,
    /// Overrides the candidate library list of the CUDA driver.
    pub cuda_library: Option<String>,
    /// Overrides the candidate library list of the OpenCL driver.
    pub opencl_library: Option<String>,
}

impl ApiConfig {
    pub const PLATFORM_VAR: &'static str = "WEFT_PLATFORM";
    pub const CUDA_LIBRARY_VAR: &'static str = "WEFT_CUDA_LIBRARY";
    pub const OPENCL_LIBRARY_VAR: &'static str = "WEFT_OPENCL_LIBRARY";

    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the configuration from the environment of the process.
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Reads the configuration from a list of `(name, value)` pairs.
    /// Unknown names and empty values are ignored.
    pub fn from_vars<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Self::default();
        for (key, value) in vars {
            let value = value.as_ref().trim();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                Self::PLATFORM_VAR => match value.parse() {
                    Ok(platform) => config.platform = Some(platform),
                    Err(err) => log::warn!("ignoring {}: {err}", Self::PLATFORM_VAR),
                },
                Self::CUDA_LIBRARY_VAR => config.cuda_library = Some(value.to_owned()),
                Self::OPENCL_LIBRARY_VAR => config.opencl_library = Some(value.to_owned()),
                _ => {}
            }
        }
        config
    }

    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn library(mut self, backend: Backend, library: impl Into<String>) -> Self {
        let library = Some(library.into());
        match backend {
            Backend::Cuda => self.cuda_library = library,
            Backend::OpenCl => self.opencl_library = library,
        }
        self
    }

    /// The library override of `backend`, if any.
    pub fn library_for(&self, backend: Backend) -> Option<&str> {
        match backend {
            Backend::Cuda => self.cuda_library.as_deref(),
            Backend::OpenCl => self.opencl_library.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ApiConfig;
    use crate::runtime::{Backend, Platform};

    #[test]
    fn test_from_vars() {
        let config = ApiConfig::from_vars([
            ("PATH", "/usr/bin"),
            (ApiConfig::PLATFORM_VAR, "macos"),
            (ApiConfig::CUDA_LIBRARY_VAR, "/opt/cuda/lib64/libcuda.so"),
            (ApiConfig::OPENCL_LIBRARY_VAR, "  "),
        ]);
        assert_eq!(config.platform, Some(Platform::MacOs));
        assert_eq!(
            config.library_for(Backend::Cuda),
            Some("/opt/cuda/lib64/libcuda.so")
        );
        assert_eq!(config.library_for(Backend::OpenCl), None);
    }

    #[test]
    fn test_unknown_platform_is_ignored() {
        let config = ApiConfig::from_vars([(ApiConfig::PLATFORM_VAR, "plan9")]);
        assert_eq!(config, ApiConfig::default());
    }

    #[test]
    fn test_builder() {
        let config = ApiConfig::new()
            .platform(Platform::Other)
            .library(Backend::OpenCl, "libOpenCL.so.2");
        assert_eq!(config.platform, Some(Platform::Other));
        assert_eq!(config.library_for(Backend::OpenCl), Some("libOpenCL.so.2"));
        assert_eq!(config.library_for(Backend::Cuda), None);
    }
}
