use std::{ffi::CString, fmt, sync::Arc, sync::OnceLock};

use parking_lot::Mutex;
use tracing::info;

use capturedog_sys as sys;

use crate::{
    ApiVersion, CaptureError, CaptureListener, CaptureSession, DeviceHandle, HandlePair,
    LibrarySource, NativeEntryTable, OverlayBit, OverlayBits, OverlayConfiguration, SessionConfig,
    WindowHandle, session::SessionParts,
};

pub const DEFAULT_MAX_FILE_PATH_LENGTH: usize = 1024;

static SESSION: OnceLock<CaptureSession> = OnceLock::new();

/// Serializes the "already built?" check with construction itself.
static BUILD_LOCK: Mutex<()> = Mutex::new(());

type StartupTask = Box<dyn FnOnce(&CaptureSession) -> Result<(), CaptureError> + Send>;

/// One-shot configuration of the process-wide [`CaptureSession`].
///
/// ```no_run
/// use capturedog::{CaptureSession, OverlayBits};
///
/// let session = CaptureSession::builder()?
///     .with_overlay_bits(OverlayBits::ENABLED | OverlayBits::FRAME_RATE)?
///     .with_capture_keys_disabled()
///     .build()?;
/// session.trigger_capture();
/// # Ok::<(), capturedog::CaptureError>(())
/// ```
pub struct SessionBuilder {
    version: ApiVersion,
    library: LibrarySource,
    overlay_bits: OverlayBits,
    tasks: Vec<StartupTask>,
    handles: HandlePair,
    listeners: Vec<Arc<dyn CaptureListener>>,
    max_file_path_length: usize,
}

impl CaptureSession {
    /// A builder requesting the latest known API version.
    ///
    /// Fails with [`CaptureError::AlreadyBuilt`] once the session exists.
    pub fn builder() -> Result<SessionBuilder, CaptureError> {
        Self::builder_with_version(ApiVersion::latest())
    }

    pub fn builder_with_version(version: ApiVersion) -> Result<SessionBuilder, CaptureError> {
        if SESSION.get().is_some() {
            return Err(CaptureError::AlreadyBuilt);
        }
        Ok(SessionBuilder::new(version))
    }

    /// The session, if it has been built.
    pub fn get() -> Option<&'static CaptureSession> {
        SESSION.get()
    }

    /// The session, building it with defaults for `version` if nothing has built it yet.
    pub fn get_or_build_default(
        version: ApiVersion,
    ) -> Result<&'static CaptureSession, CaptureError> {
        if let Some(session) = SESSION.get() {
            return Ok(session);
        }
        match SessionBuilder::new(version).build() {
            Err(CaptureError::AlreadyBuilt) => SESSION.get().ok_or(CaptureError::AlreadyBuilt),
            other => other,
        }
    }
}

impl SessionBuilder {
    pub(crate) fn new(version: ApiVersion) -> Self {
        Self {
            version,
            library: LibrarySource::Default,
            overlay_bits: OverlayBits::NONE,
            tasks: Vec::new(),
            handles: HandlePair::default(),
            listeners: Vec::new(),
            max_file_path_length: DEFAULT_MAX_FILE_PATH_LENGTH,
        }
    }

    /// Applies a declarative [`SessionConfig`] on top of this builder.
    pub fn with_config(mut self, config: &SessionConfig) -> Result<Self, CaptureError> {
        if let Some(version) = config.api_version {
            self.version = version;
        }
        if let Some(library) = &config.library {
            self.library = LibrarySource::Named(library.clone());
        }
        for bit in &config.overlay {
            self = self.with_overlay_bit(*bit)?;
        }
        if config.disable_capture_keys {
            self = self.with_capture_keys_disabled();
        }
        if config.disable_focus_toggle_keys {
            self = self.with_focus_toggle_keys_disabled();
        }
        if let Some(template) = &config.capture_file_path_template {
            self = self.with_capture_file_path_template(template)?;
        }
        if let Some(max) = config.max_file_path_length {
            self.max_file_path_length = max;
        }
        Ok(self)
    }

    pub fn with_library(mut self, dll_path_or_name: impl Into<String>) -> Self {
        self.library = LibrarySource::Named(dll_path_or_name.into());
        self
    }

    pub fn with_get_api(mut self, get_api: sys::RENDERDOC_GetAPI) -> Self {
        self.library = LibrarySource::GetApi(get_api);
        self
    }

    /// Requests overlay bits to be on once the session starts. A bit may be requested only once.
    ///
    /// Without any request the overlay starts at [`OverlayBits::DEFAULT`].
    pub fn with_overlay_bits(mut self, bits: OverlayBits) -> Result<Self, CaptureError> {
        let bits = bits.named();
        let duplicate = self.overlay_bits & bits;
        if !duplicate.is_empty() {
            return Err(CaptureError::DuplicateOverlayBit(duplicate));
        }
        self.overlay_bits |= bits;
        Ok(self)
    }

    pub fn with_overlay_bit(self, bit: OverlayBit) -> Result<Self, CaptureError> {
        self.with_overlay_bits(bit.into())
    }

    pub fn with_capture_keys_disabled(self) -> Self {
        self.with_startup_task(|session| {
            session.disable_capture_keys();
            Ok(())
        })
    }

    pub fn with_focus_toggle_keys_disabled(self) -> Self {
        self.with_startup_task(|session| {
            session.disable_focus_toggle_keys();
            Ok(())
        })
    }

    /// Sets the capture path template once the session starts. The template is checked here, so a
    /// bad one never reaches RenderDoc.
    pub fn with_capture_file_path_template(self, template: &str) -> Result<Self, CaptureError> {
        let template = CString::new(template).map_err(|_| CaptureError::InteriorNul)?;
        Ok(self.with_startup_task(move |session| {
            session.set_capture_file_path_template_cstr(&template);
            Ok(())
        }))
    }

    /// Runs `task` against the new session before [`build`](Self::build) returns it, in the order
    /// tasks were added. A failing task fails the build, but RenderDoc stays loaded since it is
    /// already bound by then; check fallible input before queueing the task.
    pub fn with_startup_task<F>(mut self, task: F) -> Self
    where
        F: FnOnce(&CaptureSession) -> Result<(), CaptureError> + Send + 'static,
    {
        self.tasks.push(Box::new(task));
        self
    }

    pub fn with_device_handle(mut self, device: DeviceHandle) -> Self {
        self.handles.device = Some(device);
        self
    }

    pub fn with_window_handle(mut self, window: WindowHandle) -> Self {
        self.handles.window = Some(window);
        self
    }

    pub fn with_capture_listener<L>(mut self, listener: L) -> Self
    where
        L: CaptureListener + 'static,
    {
        self.listeners.push(Arc::new(listener));
        self
    }

    pub fn with_max_file_path_length(mut self, max: usize) -> Self {
        self.max_file_path_length = max;
        self
    }

    /// Binds RenderDoc and publishes the process-wide session.
    pub fn build(self) -> Result<&'static CaptureSession, CaptureError> {
        let _guard = BUILD_LOCK.lock();
        if SESSION.get().is_some() {
            return Err(CaptureError::AlreadyBuilt);
        }

        let session = self.bind()?;
        info!(
            requested = %session.requested_version(),
            version = %session.version(),
            "renderdoc capture session ready"
        );
        SESSION.set(session).map_err(|_| CaptureError::AlreadyBuilt)?;
        SESSION.get().ok_or(CaptureError::AlreadyBuilt)
    }

    /// Runs the bind sequence without publishing the result.
    pub(crate) fn bind(self) -> Result<CaptureSession, CaptureError> {
        let module = self.library.open()?;
        let entries = unsafe { NativeEntryTable::bind(module.get_api(), self.version) }?;
        let version = match entries.negotiated_version() {
            Ok(version) => version,
            Err(e) => {
                module.retain();
                return Err(e);
            }
        };
        if version != self.version {
            info!(
                requested = %self.version,
                actual = %version,
                "renderdoc serves a different API version"
            );
        }

        let entries = Arc::new(entries);
        let defaults = if self.overlay_bits.is_empty() {
            OverlayBits::DEFAULT
        } else {
            self.overlay_bits
        };
        let overlay = OverlayConfiguration::new(entries.clone(), defaults);

        let session = CaptureSession::from_parts(SessionParts {
            module,
            entries,
            requested_version: self.version,
            version,
            overlay,
            handles: self.handles,
            listeners: self.listeners,
            max_file_path_length: self.max_file_path_length,
        });

        for task in self.tasks {
            if let Err(e) = task(&session) {
                session.into_module().retain();
                return Err(e);
            }
        }
        Ok(session)
    }
}

impl fmt::Debug for SessionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionBuilder")
            .field("version", &self.version)
            .field("library", &self.library)
            .field("overlay_bits", &self.overlay_bits)
            .field("tasks", &self.tasks.len())
            .field("handles", &self.handles)
            .field("listeners", &self.listeners.len())
            .field("max_file_path_length", &self.max_file_path_length)
            .finish()
    }
}
