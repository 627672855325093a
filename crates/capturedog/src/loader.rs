use std::{env, fmt};

use parking_lot::Mutex;

#[cfg(windows)]
use std::ffi::CString;

use tracing::debug;

use capturedog_sys as sys;

use crate::CaptureError;

#[cfg(unix)]
use libloading::Library;

#[cfg(windows)]
use windows_sys::Win32::Foundation::{FreeLibrary, GetLastError};

#[cfg(windows)]
use windows_sys::Win32::System::LibraryLoader::{GetModuleHandleA, GetProcAddress, LoadLibraryA};

/// Overrides the library name or path used by [`NativeModule::try_connect_or_load_default`].
pub const LIBRARY_ENV_VAR: &str = "CAPTUREDOG_RENDERDOC_LIB";

/// Modules whose session failed to start after RenderDoc had already handed out its table.
static RETAINED: Mutex<Vec<NativeModule>> = Mutex::new(Vec::new());

#[derive(Debug)]
enum LibraryGuard {
    /// `RENDERDOC_GetAPI` was supplied directly; nothing to keep alive.
    Static,
    #[cfg(windows)]
    WindowsBorrowed,
    #[cfg(windows)]
    WindowsOwned(isize),
    #[cfg(unix)]
    Unix {
        #[allow(dead_code)]
        _lib: Library,
    },
}

#[cfg(windows)]
impl Drop for LibraryGuard {
    fn drop(&mut self) {
        if let LibraryGuard::WindowsOwned(module) = self {
            unsafe {
                FreeLibrary(*module);
            }
        }
    }
}

/// A RenderDoc module with its `RENDERDOC_GetAPI` entry point resolved.
///
/// Keeps the library loaded for as long as it lives; the session holds it for the rest of the
/// process.
pub struct NativeModule {
    get_api: sys::RENDERDOC_GetAPI,
    _guard: LibraryGuard,
}

impl fmt::Debug for NativeModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeModule")
            .field("guard", &self._guard)
            .finish_non_exhaustive()
    }
}

/// Where [`SessionBuilder`](crate::SessionBuilder) finds RenderDoc.
#[derive(Clone, Debug, Default)]
pub enum LibrarySource {
    /// An injected RenderDoc if present, otherwise the default library names.
    #[default]
    Default,
    /// A library name or path.
    Named(String),
    /// An already resolved `RENDERDOC_GetAPI`, e.g. when RenderDoc is linked in.
    GetApi(sys::RENDERDOC_GetAPI),
}

impl LibrarySource {
    pub fn open(self) -> Result<NativeModule, CaptureError> {
        match self {
            LibrarySource::Default => NativeModule::try_connect_or_load_default(),
            LibrarySource::Named(name) => NativeModule::try_connect_or_load(&name),
            LibrarySource::GetApi(get_api) => Ok(NativeModule::from_get_api(get_api)),
        }
    }
}

impl NativeModule {
    pub fn from_get_api(get_api: sys::RENDERDOC_GetAPI) -> Self {
        Self {
            get_api,
            _guard: LibraryGuard::Static,
        }
    }

    pub(crate) fn get_api(&self) -> sys::RENDERDOC_GetAPI {
        self.get_api
    }

    /// Keeps the library loaded for the rest of the process.
    ///
    /// Once `RENDERDOC_GetAPI` has succeeded RenderDoc may have hooked the process, so unloading it
    /// is never safe even if no session comes out of the build.
    pub(crate) fn retain(self) {
        debug!(guard = ?self._guard, "retaining renderdoc module after a failed build");
        RETAINED.lock().push(self);
    }

    #[cfg(test)]
    pub(crate) fn retained_count() -> usize {
        RETAINED.lock().len()
    }

    /// Connects to a RenderDoc that is already injected into the process, without loading it.
    pub fn try_connect() -> Result<Self, CaptureError> {
        #[cfg(windows)]
        {
            let module = unsafe { GetModuleHandleA(c"renderdoc.dll".as_ptr().cast()) };
            if module == 0 {
                return Err(CaptureError::NotAvailable);
            }

            Self::from_windows_module(module, LibraryGuard::WindowsBorrowed)
        }

        #[cfg(target_os = "linux")]
        {
            use libloading::os::unix;

            // RTLD_NOLOAD is a non-POSIX extension; we only enable it on Linux.
            let flags = unix::RTLD_LAZY | unix::RTLD_LOCAL | libc::RTLD_NOLOAD;

            for candidate in ["librenderdoc.so", "librenderdoc.so.1"] {
                let lib = unsafe { unix::Library::open(Some(candidate), flags) };
                if let Ok(lib) = lib {
                    return Self::from_unix_library(Library::from(lib));
                }
            }

            Err(CaptureError::NotAvailable)
        }

        #[cfg(not(any(windows, target_os = "linux")))]
        {
            Err(CaptureError::NotAvailable)
        }
    }

    pub fn try_load(dll_path_or_name: &str) -> Result<Self, CaptureError> {
        #[cfg(windows)]
        {
            let name = CString::new(dll_path_or_name).map_err(|_| CaptureError::InteriorNul)?;
            let module = unsafe { LoadLibraryA(name.as_ptr() as *const u8) };
            if module == 0 {
                return Err(CaptureError::LoadLibraryFailed(unsafe { GetLastError() }));
            }
            Self::from_windows_module(module, LibraryGuard::WindowsOwned(module))
        }

        #[cfg(unix)]
        {
            // SAFETY: loading runs the library's initializers. The caller names a RenderDoc build;
            // only `RENDERDOC_GetAPI` is resolved from it.
            let lib = unsafe { Library::new(dll_path_or_name) }
                .map_err(|e| CaptureError::DynamicLoadFailed(e.to_string()))?;
            Self::from_unix_library(lib)
        }

        #[cfg(not(any(windows, unix)))]
        {
            let _ = dll_path_or_name;
            Err(CaptureError::NotAvailable)
        }
    }

    pub fn try_connect_or_load(dll_path_or_name: &str) -> Result<Self, CaptureError> {
        #[cfg(windows)]
        {
            if let Ok(name) = CString::new(dll_path_or_name) {
                let module = unsafe { GetModuleHandleA(name.as_ptr() as *const u8) };
                if module != 0 {
                    return Self::from_windows_module(module, LibraryGuard::WindowsBorrowed);
                }
            }
        }

        Self::try_load(dll_path_or_name)
    }

    pub fn try_load_default() -> Result<Self, CaptureError> {
        if let Some(name) = env::var_os(LIBRARY_ENV_VAR) {
            let name = name.into_string().map_err(|_| CaptureError::InvalidUtf8)?;
            debug!(library = %name, "loading renderdoc from {}", LIBRARY_ENV_VAR);
            return Self::try_load(&name);
        }

        #[cfg(windows)]
        {
            Self::try_load("renderdoc.dll")
        }

        #[cfg(unix)]
        {
            for candidate in ["librenderdoc.so", "librenderdoc.so.1"] {
                if let Ok(v) = Self::try_load(candidate) {
                    return Ok(v);
                }
            }
            Err(CaptureError::NotAvailable)
        }

        #[cfg(not(any(windows, unix)))]
        {
            Err(CaptureError::NotAvailable)
        }
    }

    pub fn try_connect_or_load_default() -> Result<Self, CaptureError> {
        if let Ok(v) = Self::try_connect() {
            debug!("connected to injected renderdoc");
            return Ok(v);
        }

        Self::try_load_default()
    }

    #[cfg(windows)]
    fn from_windows_module(module: isize, guard: LibraryGuard) -> Result<Self, CaptureError> {
        let proc = unsafe { GetProcAddress(module, c"RENDERDOC_GetAPI".as_ptr().cast()) }
            .ok_or(CaptureError::MissingGetApi)?;

        // SAFETY: RENDERDOC_GetAPI has the signature declared by `sys::RENDERDOC_GetAPI`.
        let get_api: sys::RENDERDOC_GetAPI = unsafe { std::mem::transmute(proc) };

        Ok(Self {
            get_api,
            _guard: guard,
        })
    }

    #[cfg(unix)]
    fn from_unix_library(lib: Library) -> Result<Self, CaptureError> {
        let get_api = unsafe { lib.get::<sys::pRENDERDOC_GetAPI>(b"RENDERDOC_GetAPI\0") }
            .map_err(|e| CaptureError::GetApiSymbolLoadFailed(e.to_string()))?;
        let get_api = (*get_api).ok_or(CaptureError::MissingGetApi)?;

        Ok(Self {
            get_api,
            _guard: LibraryGuard::Unix { _lib: lib },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_library_is_reported_not_panicked() {
        let err = NativeModule::try_load("capturedog-no-such-library-7f3a").unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn get_api_source_needs_no_library() {
        let module = LibrarySource::GetApi(crate::fake::get_api).open().unwrap();
        assert!(matches!(module._guard, LibraryGuard::Static));
    }
}
